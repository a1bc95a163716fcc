//! Auth session - who is logged in, resolved from local storage

use anyhow::{Context, Result};
use tracing::info;

use crate::api::{User, WorkoutApi};
use crate::db::Database;

const TOKEN_KEY: &str = "auth.token";
const USER_KEY: &str = "auth.user";

/// The one authentication context of the app, passed to whoever needs it
pub struct AuthSession {
    db: Database,
    token: Option<String>,
    user: Option<User>,
}

impl AuthSession {
    /// Resolve token and user from storage. A stored user that no longer
    /// parses counts as logged out.
    pub fn init(db: Database) -> Result<Self> {
        let token = db.get(TOKEN_KEY)?;
        let user = match db.get(USER_KEY)? {
            Some(json) => serde_json::from_str(&json).ok(),
            None => None,
        };

        let (token, user) = match (token, user) {
            (Some(t), Some(u)) => (Some(t), Some(u)),
            _ => (None, None),
        };

        Ok(Self { db, token, user })
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Logged-in user or an error telling how to log in
    pub fn require_user(&self) -> Result<&User> {
        self.user
            .as_ref()
            .context("Not logged in, run `treino login` first")
    }

    pub async fn login(&mut self, api: &dyn WorkoutApi, email: &str, password: &str) -> Result<&User> {
        let response = api
            .login(email, password)
            .await
            .context("Login failed")?;

        self.db.set(TOKEN_KEY, &response.token)?;
        self.db.set(USER_KEY, &serde_json::to_string(&response.user)?)?;
        info!("Logged in as {}", response.user.email);

        self.token = Some(response.token);
        Ok(self.user.insert(response.user))
    }

    /// Clear token and user, both stored and in memory
    pub fn logout(&mut self) -> Result<()> {
        self.db.remove(TOKEN_KEY)?;
        self.db.remove(USER_KEY)?;
        self.token = None;
        self.user = None;
        info!("Logged out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeApi;

    #[test]
    fn test_init_empty_store() {
        let session = AuthSession::init(Database::in_memory().unwrap()).unwrap();
        assert!(!session.is_authenticated());
        assert!(session.require_user().is_err());
    }

    #[tokio::test]
    async fn test_login_persists() {
        let api = FakeApi::default();
        let mut session = AuthSession::init(Database::in_memory().unwrap()).unwrap();

        let user = session.login(&api, "ana@example.com", "secret").await.unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(session.token(), Some("token-123"));
        assert_eq!(session.db.get(TOKEN_KEY).unwrap().as_deref(), Some("token-123"));
    }

    #[tokio::test]
    async fn test_failed_login_stores_nothing() {
        let api = FakeApi::default();
        let mut session = AuthSession::init(Database::in_memory().unwrap()).unwrap();

        assert!(session.login(&api, "ana@example.com", "wrong").await.is_err());
        assert!(!session.is_authenticated());
        assert_eq!(session.db.get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_init_resolves_stored_session() {
        let db = Database::in_memory().unwrap();
        db.set(TOKEN_KEY, "t").unwrap();
        db.set(USER_KEY, r#"{"id": "u1", "name": "Ana", "email": "ana@example.com"}"#).unwrap();

        let session = AuthSession::init(db).unwrap();
        assert_eq!(session.token(), Some("t"));
        assert_eq!(session.require_user().unwrap().id, "u1");
    }

    #[test]
    fn test_corrupt_user_means_logged_out() {
        let db = Database::in_memory().unwrap();
        db.set(TOKEN_KEY, "t").unwrap();
        db.set(USER_KEY, "not json").unwrap();

        let session = AuthSession::init(db).unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_logout_clears_everything() {
        let db = Database::in_memory().unwrap();
        db.set(TOKEN_KEY, "t").unwrap();
        db.set(USER_KEY, r#"{"id": "u1", "name": "Ana", "email": "a@b.c"}"#).unwrap();
        let mut session = AuthSession::init(db).unwrap();

        session.logout().unwrap();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
        assert_eq!(session.db.get(TOKEN_KEY).unwrap(), None);
        assert_eq!(session.db.get(USER_KEY).unwrap(), None);
    }
}
