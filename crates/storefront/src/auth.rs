//! Identity session boundary.
//!
//! Login, signup, and session lifetime belong to the external identity
//! provider. The client only ever needs two things from it: who the current
//! user is (if anyone) and a bearer credential for backend requests. The
//! [`Session`] trait captures exactly that surface; [`SessionHandle`] is the
//! in-process implementation the provider integration (and every test)
//! drives.
//!
//! A signed-out session is a valid, non-error state: `current_user` returns
//! `None` and callers skip authenticated work.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use secrecy::SecretString;
use thiserror::Error;

use realm_wear_core::Email;

/// Errors that can occur when obtaining a bearer credential.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No user is signed in.
    #[error("no authenticated user")]
    SignedOut,
    /// The identity provider could not mint a credential.
    #[error("credential unavailable: {0}")]
    Credential(String),
}

/// The authenticated user as exposed by the identity provider.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Stable per-user key; also the wishlist cache key.
    pub email: Email,
    /// Profile display name, when the provider has one.
    pub display_name: Option<String>,
    /// Profile photo URL, when the provider has one.
    pub photo_url: Option<String>,
}

impl AuthUser {
    /// Create a user with only an email (no profile data).
    #[must_use]
    pub const fn from_email(email: Email) -> Self {
        Self {
            email,
            display_name: None,
            photo_url: None,
        }
    }

    /// Name shown in the UI: the display name, else the email local part.
    #[must_use]
    pub fn shown_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.email.local_part())
    }

    /// Uppercase initial for the avatar placeholder.
    #[must_use]
    pub fn initial(&self) -> Option<char> {
        self.shown_name()
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
    }
}

/// The slice of the identity provider the client depends on.
#[async_trait]
pub trait Session: Send + Sync {
    /// The currently signed-in user, if any.
    fn current_user(&self) -> Option<AuthUser>;

    /// A bearer credential for the current user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SignedOut`] when no user is present, or
    /// [`AuthError::Credential`] when the provider cannot mint a token.
    async fn bearer_token(&self) -> Result<SecretString, AuthError>;
}

/// Shared, swappable session state.
///
/// The identity provider integration signs users in and out; everything else
/// holds a clone and reads. Cheap to clone (`Arc` inside).
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<SessionState>>>,
}

struct SessionState {
    user: AuthUser,
    token: SecretString,
}

impl SessionHandle {
    /// Create a signed-out session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session with a signed-in user and their credential.
    pub fn sign_in(&self, user: AuthUser, token: SecretString) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(SessionState { user, token });
    }

    /// Clear the session.
    pub fn sign_out(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}

#[async_trait]
impl Session for SessionHandle {
    fn current_user(&self) -> Option<AuthUser> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|s| s.user.clone())
    }

    async fn bearer_token(&self) -> Result<SecretString, AuthError> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .map(|s| s.token.clone())
            .ok_or(AuthError::SignedOut)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn user(email: &str) -> AuthUser {
        AuthUser::from_email(Email::parse(email).unwrap())
    }

    #[test]
    fn test_signed_out_by_default() {
        let session = SessionHandle::new();
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_bearer_token_requires_sign_in() {
        let session = SessionHandle::new();
        assert!(matches!(
            session.bearer_token().await,
            Err(AuthError::SignedOut)
        ));

        session.sign_in(user("shopper@example.com"), SecretString::from("tok-1"));
        let token = session.bearer_token().await.unwrap();
        assert_eq!(token.expose_secret(), "tok-1");
    }

    #[tokio::test]
    async fn test_sign_out_clears_state() {
        let session = SessionHandle::new();
        session.sign_in(user("shopper@example.com"), SecretString::from("tok-1"));
        session.sign_out();
        assert!(session.current_user().is_none());
        assert!(session.bearer_token().await.is_err());
    }

    #[test]
    fn test_shown_name_falls_back_to_local_part() {
        let mut u = user("shopper@example.com");
        assert_eq!(u.shown_name(), "shopper");
        assert_eq!(u.initial(), Some('S'));

        u.display_name = Some("Alex".to_owned());
        assert_eq!(u.shown_name(), "Alex");
        assert_eq!(u.initial(), Some('A'));
    }
}
