//! Single source of truth for "who is logged in".
//!
//! The session tolerates an unreachable API by serving the cached profile;
//! only an explicit authorization failure (401/403) demotes it to anonymous.

use serde::{Deserialize, Serialize};

use crate::model::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Before the stored snapshot has been looked at.
    #[default]
    Unknown,
    /// Snapshot read / profile fetch in progress.
    Loading,
    Authenticated,
    Anonymous,
}

impl SessionState {
    #[must_use]
    pub const fn is_authenticated(self) -> bool {
        matches!(self, Self::Authenticated)
    }

    #[must_use]
    pub const fn is_anonymous(self) -> bool {
        matches!(self, Self::Anonymous)
    }

    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Authenticated | Self::Anonymous)
    }
}

/// What survives a reload: the bearer token and the last known profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Default)]
pub struct Session {
    pub state: SessionState,
    pub token: Option<String>,
    pub user: Option<User>,
    /// In-flight guard: at most one outstanding profile refresh. A second
    /// caller while one is in flight is a no-op.
    pub is_refreshing: bool,
}

impl Session {
    /// Entering the boot/validation phase. The stored token (if any) is
    /// checked against the API before the state settles.
    pub fn begin_restore(&mut self) {
        self.state = SessionState::Loading;
    }

    /// Returns false when a refresh is already outstanding.
    #[must_use]
    pub fn begin_refresh(&mut self) -> bool {
        if self.is_refreshing {
            return false;
        }
        self.is_refreshing = true;
        true
    }

    pub fn finish_refresh(&mut self) {
        self.is_refreshing = false;
    }

    pub fn restore(&mut self, snapshot: SessionSnapshot) {
        self.token = Some(snapshot.token);
        self.user = snapshot.user;
        self.state = SessionState::Loading;
    }

    /// No stored token: nothing to validate.
    pub fn settle_anonymous(&mut self) {
        self.state = SessionState::Anonymous;
    }

    pub fn apply_login(&mut self, token: String, user: Option<User>) {
        self.token = Some(token);
        if let Some(user) = user {
            self.user = Some(user);
            self.state = SessionState::Authenticated;
        } else {
            // Token without a profile: stay in Loading until the follow-up
            // profile fetch resolves.
            self.state = SessionState::Loading;
        }
    }

    pub fn apply_profile(&mut self, user: User) {
        self.user = Some(user);
        self.state = SessionState::Authenticated;
    }

    /// Network-class failure: serve the cached profile when there is one.
    /// The token is kept either way so a later refresh can retry.
    pub fn apply_network_failure(&mut self) {
        if self.user.is_some() && self.token.is_some() {
            self.state = SessionState::Authenticated;
        } else {
            self.state = SessionState::Anonymous;
        }
    }

    /// 401/403: fatal to the session regardless of any cache.
    pub fn apply_auth_failure(&mut self) {
        self.token = None;
        self.user = None;
        self.is_refreshing = false;
        self.state = SessionState::Anonymous;
    }

    pub fn logout(&mut self) {
        self.apply_auth_failure();
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.token.as_ref().map(|token| SessionSnapshot {
            token: token.clone(),
            user: self.user.clone(),
        })
    }

    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}
