//! Authentication session shared by every remote call.

use parking_lot::RwLock;

use super::types::User;

#[derive(Debug, Clone)]
struct SessionData {
    token: String,
    user: Option<User>,
}

/// Holds the bearer token and the user it belongs to. Injected into the
/// client so tests and multiple clients can share or isolate sessions.
#[derive(Debug, Default)]
pub struct Session {
    inner: RwLock<Option<SessionData>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session restored from a previously issued token.
    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.set_token(token);
        session
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().as_ref().map(|d| d.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.inner.read().as_ref().and_then(|d| d.user.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Store a fresh token. Any previously known user is forgotten.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.inner.write() = Some(SessionData { token: token.into(), user: None });
    }

    /// Attach the user to the current token. Ignored when logged out.
    pub fn set_user(&self, user: User) {
        if let Some(data) = self.inner.write().as_mut() {
            data.user = Some(user);
        }
    }

    /// Drop the token only if it is still `token`, so a stale 401 cannot log
    /// out a session that has since re-authenticated.
    pub(crate) fn clear_if(&self, token: &str) -> bool {
        let mut guard = self.inner.write();
        if guard.as_ref().is_some_and(|d| d.token == token) {
            *guard = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> User {
        User { id: 1, username: "alice".into(), created_at: None }
    }

    #[test]
    fn starts_logged_out() {
        let s = Session::new();
        assert!(!s.is_logged_in());
        assert_eq!(s.token(), None);
        assert_eq!(s.user(), None);
    }

    #[test]
    fn user_requires_a_token() {
        let s = Session::new();
        s.set_user(alice());
        assert_eq!(s.user(), None);

        s.set_token("t1");
        s.set_user(alice());
        assert_eq!(s.user().map(|u| u.username), Some("alice".to_string()));
    }

    #[test]
    fn new_token_forgets_previous_user() {
        let s = Session::with_token("t1");
        s.set_user(alice());
        s.set_token("t2");
        assert_eq!(s.user(), None);
        assert_eq!(s.token().as_deref(), Some("t2"));
    }

    #[test]
    fn clear_if_ignores_stale_tokens() {
        let s = Session::with_token("t2");
        assert!(!s.clear_if("t1"));
        assert!(s.is_logged_in());
        assert!(s.clear_if("t2"));
        assert!(!s.is_logged_in());
    }
}
