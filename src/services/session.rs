//! Session context: who is logged in for the lifetime of one interactive run.
//!
//! The session only carries identity and role. Deciding whether an action is
//! allowed is the caller's job (or the credential service's, for rotation).

use tracing::info;

use crate::domain::{Identity, UserId};
use crate::services::credential_service::{AuthError, CredentialService};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated {
        username: String,
        identity: Identity,
    },
}

#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            state: SessionState::Anonymous,
        }
    }

    /// Anonymous -> Authenticated on success. A failed attempt leaves the
    /// session anonymous, dropping any identity it held before.
    pub async fn login(
        &mut self,
        service: &dyn CredentialService,
        username: &str,
        password: &str,
        secret_key: &str,
    ) -> Result<Identity, AuthError> {
        self.state = SessionState::Anonymous;

        let identity = service
            .verify_credentials(username, password, secret_key)
            .await?;

        info!(user_id = %identity.user_id, username, "Session started");
        self.state = SessionState::Authenticated {
            username: username.to_string(),
            identity,
        };
        Ok(identity)
    }

    pub fn logout(&mut self) {
        if let SessionState::Authenticated { identity, .. } = &self.state {
            info!(user_id = %identity.user_id, "Session ended");
        }
        self.state = SessionState::Anonymous;
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub const fn identity(&self) -> Option<Identity> {
        match &self.state {
            SessionState::Authenticated { identity, .. } => Some(*identity),
            SessionState::Anonymous => None,
        }
    }

    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { username, .. } => Some(username),
            SessionState::Anonymous => None,
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self.identity() {
            Some(identity) => Some(identity.user_id),
            None => None,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    /// False while anonymous.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        match self.identity() {
            Some(identity) => identity.is_admin,
            None => false,
        }
    }
}
