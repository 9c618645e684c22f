//! The signed-in user's session, shared process-wide.
//!
//! The profile view only reads it (is this my own profile? which token do I
//! send?) except for one write: a settings-save acknowledgement carries a
//! fresh token that replaces the current one.

use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("token is not a JWT")]
    Malformed,
    #[error("token payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Claims carried in the session token's payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub username: String,
    #[serde(default)]
    pub show_nsfw: bool,
    #[serde(default)]
    pub iss: Option<String>,
}

/// Decode a token's claims without verifying its signature. Verification is
/// the server's job; the client only needs to know who it is.
pub fn decode_claims(jwt: &str) -> Result<Claims, SessionError> {
    let mut parts = jwt.split('.');
    let (Some(_header), Some(payload), Some(_sig)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(SessionError::Malformed);
    };
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read/write access to the session, injected into views at construction.
pub trait SessionStore: Send + Sync {
    /// Claims of the signed-in user, if any.
    fn current_user(&self) -> Option<Claims>;

    /// The raw token to attach to authenticated requests.
    fn jwt(&self) -> Option<String>;

    /// Replace the session with a new token.
    fn login(&self, jwt: &str) -> Result<(), SessionError>;
}

#[derive(Debug, Clone)]
struct Session {
    jwt: String,
    claims: Claims,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSession {
    jwt: String,
}

/// Session held in memory, optionally persisted to
/// `~/.config/profiletui/session.json` on every login.
#[derive(Debug, Default)]
pub struct LocalSession {
    state: RwLock<Option<Session>>,
    persist_to: Option<PathBuf>,
}

impl LocalSession {
    /// A session nobody is signed in to.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A non-persistent session for the given token.
    pub fn in_memory(jwt: &str) -> Result<Self, SessionError> {
        let session = Self::default();
        session.login(jwt)?;
        Ok(session)
    }

    /// Load the token from `LEMMY_JWT` (after reading `.env` files) or from
    /// the persisted session file. Falls back to anonymous when neither
    /// holds a usable token.
    pub fn load() -> Self {
        load_env_files();
        let persist_to = Some(session_path());

        let token = std::env::var("LEMMY_JWT")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| match load_stored() {
                Ok(stored) => stored.map(|s| s.jwt),
                Err(e) => {
                    tracing::warn!("could not read stored session: {e}");
                    None
                }
            });

        let state = token.and_then(|jwt| match decode_claims(&jwt) {
            Ok(claims) => {
                tracing::info!(user = %claims.username, "session loaded");
                Some(Session { jwt, claims })
            }
            Err(e) => {
                tracing::warn!("ignoring unusable session token: {e}");
                None
            }
        });

        Self {
            state: RwLock::new(state),
            persist_to,
        }
    }
}

impl SessionStore for LocalSession {
    fn current_user(&self) -> Option<Claims> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.claims.clone())
    }

    fn jwt(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.jwt.clone())
    }

    fn login(&self, jwt: &str) -> Result<(), SessionError> {
        let claims = decode_claims(jwt)?;
        tracing::info!(user = %claims.username, "session updated");
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Some(Session {
            jwt: jwt.to_owned(),
            claims,
        });
        // The live session is what later requests use; disk is best effort.
        if let Some(ref path) = self.persist_to
            && let Err(e) = save_stored(path, &StoredSession { jwt: jwt.to_owned() })
        {
            tracing::warn!(path = %path.display(), "could not persist session: {e}");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Candidate .env paths in priority order. dotenvy never overwrites a
/// variable that is already set, so earlier files win.
fn env_file_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".config/profiletui/.env"));
    }
    paths.push(PathBuf::from(".env"));
    paths
}

pub fn load_env_files() {
    for path in env_file_paths() {
        if path.exists() {
            let _ = dotenvy::from_path(&path);
        }
    }
}

fn session_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config/profiletui/session.json")
}

fn save_stored(path: &PathBuf, data: &StoredSession) -> Result<(), SessionError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(data)?)?;
    Ok(())
}

fn load_stored() -> Result<Option<StoredSession>, SessionError> {
    let path = session_path();
    if !path.exists() {
        return Ok(None);
    }
    let json = std::fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&json)?))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build an unsigned token carrying the given claims.
    pub(crate) fn token_for(id: i32, username: &str, show_nsfw: bool) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS512","typ":"JWT"}"#);
        let claims = serde_json::json!({
            "id": id,
            "username": username,
            "show_nsfw": show_nsfw,
            "iss": "lemmy.example",
        });
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("{header}.{payload}.signature")
    }

    #[test]
    fn decodes_claims_from_payload() {
        let claims = decode_claims(&token_for(7, "alice", true)).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.username, "alice");
        assert!(claims.show_nsfw);
        assert_eq!(claims.iss.as_deref(), Some("lemmy.example"));
    }

    #[test]
    fn rejects_tokens_without_three_parts() {
        assert!(matches!(
            decode_claims("just-one-part"),
            Err(SessionError::Malformed)
        ));
    }

    #[test]
    fn rejects_non_base64_payload() {
        assert!(decode_claims("a.!!!.c").is_err());
    }

    #[test]
    fn anonymous_session_has_no_user() {
        let session = LocalSession::anonymous();
        assert_eq!(session.current_user(), None);
        assert_eq!(session.jwt(), None);
    }

    #[test]
    fn login_updates_session_even_when_it_cannot_be_saved() {
        let session = LocalSession {
            persist_to: Some(PathBuf::from("/dev/null/profiletui/session.json")),
            ..LocalSession::in_memory(&token_for(1, "me", false)).unwrap()
        };
        let fresh = token_for(1, "me", true);
        session.login(&fresh).unwrap();
        assert_eq!(session.jwt(), Some(fresh));
        assert!(session.current_user().unwrap().show_nsfw);
    }

    #[test]
    fn login_persists_token_when_possible() {
        let dir = std::env::temp_dir().join(format!("profiletui-session-{}", std::process::id()));
        let path = dir.join("session.json");
        let session = LocalSession {
            persist_to: Some(path.clone()),
            ..LocalSession::default()
        };
        let token = token_for(2, "me", false);
        session.login(&token).unwrap();
        let stored: StoredSession =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored.jwt, token);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn login_replaces_current_user() {
        let session = LocalSession::in_memory(&token_for(1, "old", false)).unwrap();
        let fresh = token_for(1, "old", true);
        session.login(&fresh).unwrap();
        assert_eq!(session.jwt(), Some(fresh));
        assert!(session.current_user().unwrap().show_nsfw);
    }

    #[test]
    fn failed_login_keeps_previous_session() {
        let original = token_for(2, "bob", false);
        let session = LocalSession::in_memory(&original).unwrap();
        assert!(session.login("garbage").is_err());
        assert_eq!(session.jwt(), Some(original));
    }
}
