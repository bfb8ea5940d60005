//! CLI command implementations.

pub mod count;
pub mod products;

use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Invalid command-line input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] realm_wear_storefront::ConfigError),

    /// Backend API request failed.
    #[error(transparent)]
    Api(#[from] realm_wear_storefront::ApiError),
}
