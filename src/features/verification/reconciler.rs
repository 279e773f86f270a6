//! Session reconciliation around email verification.
//!
//! Signup records a pending marker so that a later page load can tell whether it
//! runs in the originating browser. When a verification lands, stale auth state
//! is wiped before the verified identity is applied so one account's tokens can
//! never survive into another account's session.

use super::request::{normalize_email, same_email};
use crate::{
    app_lib::{
        AppError,
        storage::{SessionStore, keys},
    },
    features::auth::types::{LoginResponse, VerifiedUser},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Marker written at signup, before the verification email goes out.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingVerificationSession {
    pub email: String,
}

pub struct SessionReconciler<'a, S: SessionStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: SessionStore + ?Sized> SessionReconciler<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Records that this browser started a signup for `email`.
    pub fn mark_pending(&self, email: &str) -> Result<(), AppError> {
        let email = normalize_email(email);
        let session = serde_json::to_string(&PendingVerificationSession {
            email: email.clone(),
        })
        .map_err(|err| AppError::Serialization(format!("Failed to encode session: {err}")))?;
        self.store.set(keys::PENDING_VERIFICATION_SESSION, &session)?;
        self.store.set(keys::PENDING_VERIFICATION_EMAIL, &email)
    }

    /// Email of the pending signup, if this browser started one.
    pub fn pending_email(&self) -> Option<String> {
        let from_session = self
            .store
            .get(keys::PENDING_VERIFICATION_SESSION)
            .and_then(|raw| serde_json::from_str::<PendingVerificationSession>(&raw).ok())
            .map(|session| session.email);

        from_session
            .or_else(|| self.store.get(keys::PENDING_VERIFICATION_EMAIL))
            .map(|email| normalize_email(&email))
            .filter(|email| !email.is_empty())
    }

    /// True when this browser holds the pending marker for `email`.
    pub fn is_originating(&self, email: &str) -> bool {
        self.pending_email()
            .is_some_and(|pending| same_email(&pending, email))
    }

    /// Applies a verified identity.
    ///
    /// `originating` must be computed before this call; the pending markers it
    /// relies on are cleared here.
    pub fn apply_verified(
        &self,
        email: &str,
        user: Option<&VerifiedUser>,
        originating: bool,
    ) -> Result<(), AppError> {
        self.store.clear_keys(&keys::AUTH_SESSION);

        if let Some(user) = user.filter(|_| originating) {
            self.store.set(keys::USER_ROLE, &user.role)?;
            self.store.set(keys::USER_ID, &user.id.to_string())?;
        }

        self.store.clear_keys(&keys::PENDING);
        self.store.set(keys::VERIFIED_EMAIL, &normalize_email(email))
    }

    /// Reconciles for the browser that holds the pending marker for `email`.
    ///
    /// A missing marker means another tab of this browser already reconciled
    /// (and the user may have signed in since), so nothing is written. Returns
    /// true when the session was updated.
    pub fn apply_if_pending(
        &self,
        email: &str,
        user: Option<&VerifiedUser>,
    ) -> Result<bool, AppError> {
        if !self.is_originating(email) {
            debug!("verification already reconciled by another tab");
            return Ok(false);
        }
        self.apply_verified(email, user, true)?;
        Ok(true)
    }

    /// Consumes the confirmation marker shown once on the login screen.
    pub fn take_verified_email(&self) -> Option<String> {
        self.store
            .take(keys::VERIFIED_EMAIL)
            .filter(|email| !email.trim().is_empty())
    }

    /// Stores the session returned by a successful login.
    pub fn store_login(&self, response: &LoginResponse) -> Result<(), AppError> {
        self.store.clear_keys(&keys::AUTH_SESSION);
        self.store.set(keys::ACCESS_TOKEN, &response.access_token)?;
        if let Some(refresh_token) = response.refresh_token.as_deref() {
            self.store.set(keys::REFRESH_TOKEN, refresh_token)?;
        }
        self.store.set(keys::USER_ROLE, &response.user.role)?;
        self.store.set(keys::USER_ID, &response.user.id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::SessionReconciler;
    use crate::{
        app_lib::storage::{MemoryStore, SessionStore, keys},
        features::auth::types::{LoginResponse, UserId, VerifiedUser},
    };
    use anyhow::Result;

    fn tenant() -> VerifiedUser {
        VerifiedUser {
            id: UserId::Number(1),
            email: "a@b.com".to_string(),
            role: "tenant".to_string(),
            first_name: None,
            last_name: None,
        }
    }

    fn seed_stale_session(store: &MemoryStore) -> Result<()> {
        store.set(keys::ACCESS_TOKEN, "old-access")?;
        store.set(keys::REFRESH_TOKEN, "old-refresh")?;
        store.set(keys::LEGACY_TOKEN, "old-access")?;
        store.set(keys::USER_ROLE, "admin")?;
        store.set(keys::USER_ID, "99")?;
        Ok(())
    }

    #[test]
    fn pending_marker_identifies_the_originating_browser() -> Result<()> {
        let store = MemoryStore::new();
        let reconciler = SessionReconciler::new(&store);
        assert!(!reconciler.is_originating("a@b.com"));

        reconciler.mark_pending(" A@b.com ")?;

        assert_eq!(reconciler.pending_email(), Some("a@b.com".to_string()));
        assert!(reconciler.is_originating("a@B.com"));
        assert!(!reconciler.is_originating("c@d.com"));
        Ok(())
    }

    #[test]
    fn plain_email_marker_is_a_fallback() -> Result<()> {
        let store = MemoryStore::new();
        store.set(keys::PENDING_VERIFICATION_SESSION, "not json")?;
        store.set(keys::PENDING_VERIFICATION_EMAIL, "a@b.com")?;

        assert!(SessionReconciler::new(&store).is_originating("a@b.com"));
        Ok(())
    }

    #[test]
    fn originating_success_replaces_the_stale_identity() -> Result<()> {
        let store = MemoryStore::new();
        seed_stale_session(&store)?;
        let reconciler = SessionReconciler::new(&store);
        reconciler.mark_pending("a@b.com")?;
        let originating = reconciler.is_originating("a@b.com");

        reconciler.apply_verified("a@b.com", Some(&tenant()), originating)?;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.get(keys::USER_ROLE).map(String::as_str), Some("tenant"));
        assert_eq!(snapshot.get(keys::USER_ID).map(String::as_str), Some("1"));
        assert_eq!(
            snapshot.get(keys::VERIFIED_EMAIL).map(String::as_str),
            Some("a@b.com")
        );
        for key in [
            keys::ACCESS_TOKEN,
            keys::REFRESH_TOKEN,
            keys::LEGACY_TOKEN,
            keys::PENDING_VERIFICATION_SESSION,
            keys::PENDING_VERIFICATION_EMAIL,
        ] {
            assert!(!snapshot.contains_key(key), "{key} should be cleared");
        }
        Ok(())
    }

    #[test]
    fn other_browser_success_only_leaves_the_marker() -> Result<()> {
        let store = MemoryStore::new();
        seed_stale_session(&store)?;

        SessionReconciler::new(&store).apply_verified("a@b.com", Some(&tenant()), false)?;

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.get(keys::VERIFIED_EMAIL).map(String::as_str),
            Some("a@b.com")
        );
        Ok(())
    }

    #[test]
    fn second_tab_does_not_wipe_a_fresh_sign_in() -> Result<()> {
        let store = MemoryStore::new();
        let reconciler = SessionReconciler::new(&store);
        reconciler.mark_pending("a@b.com")?;

        assert!(reconciler.apply_if_pending("a@b.com", Some(&tenant()))?);
        assert_eq!(reconciler.take_verified_email(), Some("a@b.com".to_string()));
        reconciler.store_login(&LoginResponse {
            access_token: "fresh".to_string(),
            refresh_token: Some("r".to_string()),
            user: tenant(),
        })?;
        let signed_in = store.snapshot();

        assert!(!reconciler.apply_if_pending("a@b.com", Some(&tenant()))?);
        assert_eq!(store.snapshot(), signed_in);
        assert_eq!(store.get(keys::VERIFIED_EMAIL), None);
        Ok(())
    }

    #[test]
    fn login_consumes_marker_and_stores_tokens() -> Result<()> {
        let store = MemoryStore::new();
        let reconciler = SessionReconciler::new(&store);
        reconciler.apply_verified("a@b.com", None, true)?;

        assert_eq!(reconciler.take_verified_email(), Some("a@b.com".to_string()));
        assert_eq!(reconciler.take_verified_email(), None);

        reconciler.store_login(&LoginResponse {
            access_token: "access".to_string(),
            refresh_token: None,
            user: tenant(),
        })?;
        assert_eq!(store.get(keys::ACCESS_TOKEN), Some("access".to_string()));
        assert_eq!(store.get(keys::REFRESH_TOKEN), None);
        assert_eq!(store.get(keys::USER_ID), Some("1".to_string()));
        Ok(())
    }
}
