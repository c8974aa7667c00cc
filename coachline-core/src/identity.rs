use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Stable account id issued by the identity provider. Tenant key for all
/// document paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The signed-in state of one client session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<UserId>,
}

impl Session {
    pub fn signed_in(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn current_user_id(&self) -> CoreResult<&UserId> {
        self.user.as_ref().ok_or(CoreError::Unauthenticated)
    }

    pub fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            tracing::info!("Session signed out for user {}", user);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_out_revokes_current_user() {
        let mut session = Session::signed_in(UserId::new("user-1"));
        assert_eq!(session.current_user_id().unwrap().as_str(), "user-1");

        session.sign_out();
        assert!(matches!(session.current_user_id(), Err(CoreError::Unauthenticated)));
    }
}
