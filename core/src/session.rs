//! Explicit session state: the bearer token issued at login and the
//! profile returned with it.

use crate::types::AuthResponse;

/// Authentication context held by a `FleetClient`.
///
/// Written by login and logout only; every other request just reads the
/// token to decide whether to send `Authorization`.
#[derive(Debug, Clone, Default)]
pub struct Session {
    auth: Option<AuthResponse>,
}

impl Session {
    /// A session restored from a token obtained elsewhere.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            auth: Some(AuthResponse {
                token: token.into(),
                role: None,
                user: Default::default(),
            }),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.auth.as_ref().map(|auth| auth.token.as_str())
    }

    pub fn profile(&self) -> Option<&AuthResponse> {
        self.auth.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    pub(crate) fn begin(&mut self, auth: AuthResponse) {
        self.auth = Some(auth);
    }

    pub(crate) fn clear(&mut self) {
        self.auth = None;
    }
}
