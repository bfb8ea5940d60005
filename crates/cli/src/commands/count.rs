//! Reconciled wishlist count command.

use std::time::Duration;

use secrecy::SecretString;

use realm_wear_core::Email;
use realm_wear_storefront::{AppState, AuthUser, CountSource, Session, StorefrontConfig};

use super::CommandError;

/// Show (or keep showing, with `watch`) the reconciled wishlist count.
///
/// Without a token the session stays signed out and the count settles at
/// zero without touching the network - useful for checking the plumbing.
pub async fn run(email: &str, token: Option<String>, watch: bool) -> Result<(), CommandError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email)
        .map_err(|e| CommandError::InvalidInput(format!("email: {e}")))?;
    let token = token.or_else(|| std::env::var("REALM_BEARER_TOKEN").ok());

    let config = StorefrontConfig::from_env()?;
    let state = AppState::new(config);

    if let Some(token) = token {
        state
            .session()
            .sign_in(AuthUser::from_email(email), SecretString::from(token));
    } else {
        tracing::warn!("no bearer token; running signed out");
    }

    if let Some(user) = state.session().current_user() {
        println!("{}", headline(&user));
    }

    if watch {
        watch_count(&state).await;
    } else {
        let count = state.wishlist_counter().refresh().await;
        let snapshot = state.wishlist_counter().snapshot();
        println!("{count} item(s) ({})", describe(snapshot.source));
    }

    Ok(())
}

async fn watch_count(state: &AppState) {
    let badge = state.wishlist_badge();
    let _watcher = state.spawn_wishlist_watcher();

    let mut last = None;
    loop {
        let snapshot = state.wishlist_counter().snapshot();
        let shown = badge.display_count();
        if last != Some(shown) {
            println!(
                "wishlist: {shown} item(s) (badge {}, {})",
                badge.label().unwrap_or_else(|| "hidden".to_owned()),
                describe(snapshot.source)
            );
            last = Some(shown);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

const fn describe(source: CountSource) -> &'static str {
    match source {
        CountSource::Remote => "remote",
        CountSource::CacheFallback => "local cache fallback",
        CountSource::SignedOut => "signed out",
    }
}

/// The signed-in user line, avatar initial first.
fn headline(user: &AuthUser) -> String {
    match user.initial() {
        Some(initial) => format!("[{initial}] wishlist for {}", user.shown_name()),
        None => format!("wishlist for {}", user.shown_name()),
    }
}
