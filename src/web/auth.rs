//! Cookie sessions and the request extractors that resolve them.
//!
//! A session maps an opaque token to a [`Principal`], the session's view of
//! the logged-in account. Principals are always built from an account value
//! returned by a committed transaction.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName};
use axum::response::Redirect;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::domain::Account;

const SESSION_COOKIE: &str = "session";

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Who is logged in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: u64,
    pub nickname: String,
    pub email: String,
    pub email_verified: bool,
}

impl From<&Account> for Principal {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            nickname: account.nickname.clone(),
            email: account.email.clone(),
            email_verified: account.email_verified,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Principal,
    pub expires_at: u64,
    /// One-shot message shown by the next page that asks for it
    pub flash: Option<String>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        now_secs() >= self.expires_at
    }
}

/// Session token -> session
pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl_secs: u64,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Start a session for `account` and return its token
    pub fn create_session(&self, account: &Account) -> String {
        let now = now_secs();
        let token = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(
            token.clone(),
            Session {
                principal: Principal::from(account),
                expires_at: now + self.ttl_secs,
                flash: None,
            },
        );
        debug!("Session started for account {}", account.id);
        token
    }

    /// Live session for `token`
    pub fn get_session(&self, token: &str) -> Option<Session> {
        self.sessions
            .get(token)
            .filter(|s| !s.is_expired())
            .map(|s| s.value().clone())
    }

    pub fn remove_session(&self, token: &str) {
        self.sessions.remove(token);
    }

    /// Rebuild the principal of every session belonging to `account`
    pub fn refresh_principal(&self, account: &Account) {
        for mut session in self.sessions.iter_mut() {
            if session.principal.id == account.id {
                session.principal = Principal::from(account);
            }
        }
    }

    pub fn set_flash(&self, token: &str, message: &str) {
        if let Some(mut session) = self.sessions.get_mut(token) {
            session.flash = Some(message.to_string());
        }
    }

    pub fn take_flash(&self, token: &str) -> Option<String> {
        self.sessions
            .get_mut(token)
            .and_then(|mut session| session.flash.take())
    }

    /// Drop expired sessions; returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired());
        before.saturating_sub(self.sessions.len())
    }
}

pub type SharedSessionStore = Arc<SessionStore>;

pub fn create_session_store(ttl_secs: u64) -> SharedSessionStore {
    Arc::new(SessionStore::new(ttl_secs))
}

/// Extract session token from cookies
pub fn get_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            cookie
                .trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_string)
        })
}

pub fn create_session_cookie(token: &str, max_age: u64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    )
}

pub fn create_logout_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Replace any session the request carries with a fresh one for `account`
pub fn log_in(
    sessions: &SessionStore,
    headers: &HeaderMap,
    account: &Account,
) -> [(HeaderName, String); 1] {
    if let Some(old) = get_session_token(headers) {
        sessions.remove_session(&old);
    }
    let token = sessions.create_session(account);
    [(SET_COOKIE, create_session_cookie(&token, sessions.ttl_secs()))]
}

/// The logged-in account; requests without a live session are sent to `/login`
#[derive(Debug, Clone)]
pub struct CurrentAccount {
    pub token: String,
    pub principal: Principal,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
    SharedSessionStore: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let sessions = SharedSessionStore::from_ref(state);
        let token = get_session_token(&parts.headers).ok_or_else(|| Redirect::to("/login"))?;
        let session = sessions
            .get_session(&token)
            .ok_or_else(|| Redirect::to("/login"))?;

        Ok(CurrentAccount {
            token,
            principal: session.principal,
        })
    }
}

/// The logged-in account, if any
#[derive(Debug, Clone)]
pub struct MaybeAccount(pub Option<CurrentAccount>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeAccount
where
    S: Send + Sync,
    SharedSessionStore: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAccount(
            CurrentAccount::from_request_parts(parts, state).await.ok(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn account(id: u64, nickname: &str) -> Account {
        let mut account = Account::new(
            format!("{}@a.com", nickname),
            nickname.to_string(),
            "pw".to_string(),
        );
        account.id = id;
        account
    }

    #[test]
    fn test_session_lifecycle() {
        let sessions = SessionStore::new(60);
        let token = sessions.create_session(&account(1, "alpha"));

        assert_eq!(sessions.get_session(&token).unwrap().principal.nickname, "alpha");

        sessions.set_flash(&token, "saved");
        assert_eq!(sessions.take_flash(&token).as_deref(), Some("saved"));
        assert!(sessions.take_flash(&token).is_none());

        sessions.remove_session(&token);
        assert!(sessions.get_session(&token).is_none());
    }

    #[test]
    fn test_expired_sessions_are_invisible_and_swept() {
        let sessions = SessionStore::new(0);
        let token = sessions.create_session(&account(1, "alpha"));

        assert!(sessions.get_session(&token).is_none());
        assert_eq!(sessions.cleanup_expired(), 1);
    }

    #[test]
    fn test_refresh_principal_updates_every_session() {
        let sessions = SessionStore::new(60);
        let first = sessions.create_session(&account(1, "alpha"));
        let second = sessions.create_session(&account(1, "alpha"));
        let other = sessions.create_session(&account(2, "beta"));

        sessions.refresh_principal(&account(1, "renamed"));

        for token in [&first, &second] {
            assert_eq!(sessions.get_session(token).unwrap().principal.nickname, "renamed");
        }
        assert_eq!(sessions.get_session(&other).unwrap().principal.nickname, "beta");
    }

    #[test]
    fn test_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; session=abc-123; sessionx=nope"),
        );
        assert_eq!(get_session_token(&headers).as_deref(), Some("abc-123"));

        headers.insert(COOKIE, HeaderValue::from_static("sessionx=nope"));
        assert!(get_session_token(&headers).is_none());
    }

    #[test]
    fn test_log_in_replaces_existing_session() {
        let sessions = SessionStore::new(60);
        let old = sessions.create_session(&account(1, "alpha"));

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("session={}", old)).unwrap(),
        );

        let [(name, cookie)] = log_in(&sessions, &headers, &account(1, "alpha"));
        assert_eq!(name, SET_COOKIE);
        assert!(cookie.starts_with("session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(sessions.get_session(&old).is_none());
    }
}
