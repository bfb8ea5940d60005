//! Product catalog listing command.

use realm_wear_storefront::{AppState, StorefrontConfig};

use super::CommandError;

/// List the product catalog from the backend.
pub async fn run() -> Result<(), CommandError> {
    dotenvy::dotenv().ok();

    let config = StorefrontConfig::from_env()?;
    let state = AppState::new(config);

    let products = state.api().get_products().await?;
    if products.is_empty() {
        println!("no products");
        return Ok(());
    }

    for product in &products {
        let category = product.category.as_deref().unwrap_or("-");
        println!("{}  {}  {}  [{category}]", product.id, product.price, product.name);
    }
    println!("{} product(s)", products.len());

    Ok(())
}
