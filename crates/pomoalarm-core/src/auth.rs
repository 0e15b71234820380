//! Account registration, login and the persisted current user.
//!
//! There is no process-wide "current user". A successful login or
//! registration hands back a [`UserContext`], and every operation that needs
//! an identity takes one explicitly. The context is also written to local
//! storage (`kv["currentUser"]`) so the next process can [`AuthGateway::restore`]
//! it once at startup. There is no expiry and no revocation.
//!
//! Passwords are compared by plain equality, matching the stored plaintext.
//! This is a known weak point, kept for compatibility with existing data.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AuthError, Result};
use crate::models::{NewUser, User};
use crate::storage::Database;

/// Local-storage key holding the serialized current user.
pub const CURRENT_USER_KEY: &str = "currentUser";

pub const LOGIN_OK: &str = "Login successful";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTER_OK: &str = "Registration successful";
pub const EMAIL_TAKEN: &str = "Email is already registered";
pub const REGISTER_FAILED: &str = "Registration failed";

/// Identity of the logged-in user, passed to every owner-scoped operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    user: User,
}

impl UserContext {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }
}

/// Result of a login or registration attempt, shaped for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl AuthOutcome {
    fn ok(message: &str, user: User) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            user: Some(user),
        }
    }

    fn failed(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            user: None,
        }
    }

    /// The context for the authenticated user, if the attempt succeeded.
    pub fn context(&self) -> Option<UserContext> {
        self.user.clone().map(UserContext::new)
    }
}

/// Credential checks against the store plus the local-storage copy of the
/// current user.
pub struct AuthGateway<'a> {
    db: &'a Database,
}

impl<'a> AuthGateway<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Look up the user by email and compare the password.
    pub fn validate_user(&self, email: &str, password: &str) -> Result<Option<User>> {
        Ok(self
            .db
            .user_by_email(email)?
            .filter(|user| user.password == password))
    }

    /// Check credentials and remember the user on success.
    ///
    /// The failure message never reveals whether the email or the password
    /// was wrong. Storage failures become a generic "Login failed".
    pub fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let attempt = self.validate_user(email, password).and_then(|user| {
            if let Some(user) = &user {
                self.remember(user)?;
            }
            Ok(user)
        });

        match attempt {
            Ok(Some(user)) => {
                info!(user_id = user.id, "login succeeded");
                AuthOutcome::ok(LOGIN_OK, user)
            }
            Ok(None) => {
                info!("login rejected");
                AuthOutcome::failed(INVALID_CREDENTIALS)
            }
            Err(e) => {
                warn!(error = %e, "login failed");
                AuthOutcome::failed(LOGIN_FAILED)
            }
        }
    }

    /// Create an account and remember it as the current user.
    ///
    /// Fails without touching the store if the email is already registered.
    pub fn register(&self, full_name: &str, email: &str, password: &str) -> AuthOutcome {
        match self.try_register(full_name, email, password) {
            Ok(Some(user)) => {
                info!(user_id = user.id, "user registered");
                AuthOutcome::ok(REGISTER_OK, user)
            }
            Ok(None) => AuthOutcome::failed(EMAIL_TAKEN),
            Err(e) if e.is_constraint_violation() => AuthOutcome::failed(EMAIL_TAKEN),
            Err(e) => {
                warn!(error = %e, "registration failed");
                AuthOutcome::failed(REGISTER_FAILED)
            }
        }
    }

    fn try_register(&self, full_name: &str, email: &str, password: &str) -> Result<Option<User>> {
        if self.db.user_by_email(email)?.is_some() {
            return Ok(None);
        }
        let user = self.db.create_user(&NewUser {
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            created_at: Utc::now(),
        })?;
        self.remember(&user)?;
        Ok(Some(user))
    }

    /// Forget the current user.
    pub fn logout(&self) -> Result<()> {
        self.db.kv_delete(CURRENT_USER_KEY)
    }

    /// Rehydrate the current user saved by a previous login.
    ///
    /// A corrupt saved value counts as logged out.
    pub fn restore(&self) -> Result<Option<UserContext>> {
        let Some(json) = self.db.kv_get(CURRENT_USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<User>(&json) {
            Ok(user) => Ok(Some(UserContext::new(user))),
            Err(e) => {
                warn!(error = %e, "discarding unreadable saved user");
                Ok(None)
            }
        }
    }

    /// Like [`AuthGateway::restore`] but an absent user is an error.
    pub fn require(&self) -> Result<UserContext> {
        self.restore()?
            .ok_or_else(|| AuthError::NotAuthenticated.into())
    }

    fn remember(&self, user: &User) -> Result<()> {
        let json = serde_json::to_string(user)?;
        self.db.kv_set(CURRENT_USER_KEY, &json)
    }
}
