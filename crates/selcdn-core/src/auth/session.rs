use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Everything the auth endpoint hands back on success.
///
/// Token and storage URL only ever exist together, so a session is either a
/// whole `SessionData` or nothing at all.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub storage_url: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    /// Build session data from a time-to-live in seconds, counted from now.
    /// `None` when the expiry falls outside the representable date range.
    pub fn try_new(token: String, storage_url: String, ttl_seconds: i64) -> Option<Self> {
        Some(Self {
            token,
            storage_url,
            expires_at: Self::expiry_after(ttl_seconds)?,
        })
    }

    /// Absolute expiry for a time-to-live in seconds, if representable.
    pub fn expiry_after(ttl_seconds: i64) -> Option<DateTime<Utc>> {
        Utc::now().checked_add_signed(Duration::try_seconds(ttl_seconds)?)
    }

    /// A token is expired from the instant its expiry is reached.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.expires_at - Utc::now()
    }

    /// Get seconds remaining until expiry (for display)
    pub fn seconds_until_expiry(&self) -> i64 {
        self.time_until_expiry().num_seconds().max(0)
    }
}

impl fmt::Debug for SessionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionData")
            .field("token", &"<redacted>")
            .field("storage_url", &self.storage_url)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    data: Option<SessionData>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget token, expiry and storage URL together
    pub fn clear(&mut self) {
        self.data = None;
    }

    /// Replace the whole session with freshly issued data
    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    pub fn data(&self) -> Option<&SessionData> {
        self.data.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.token.as_str())
    }

    pub fn storage_url(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.storage_url.as_str())
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.data.as_ref().map(|d| d.expires_at)
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.data.as_ref().map(|d| !d.is_expired()).unwrap_or(false)
    }

    /// True when there is no session or its token has expired
    pub fn needs_renewal(&self) -> bool {
        !self.is_valid()
    }
}

/// Persists session data between process runs.
pub struct SessionStore {
    cache_dir: PathBuf,
}

impl SessionStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Load a cached session. Expired sessions are treated as absent.
    pub fn load(&self) -> Result<Option<SessionData>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .context("Failed to read session file")?;
        let data: SessionData = serde_json::from_str(&contents)
            .context("Failed to parse session file")?;

        if data.is_expired() {
            debug!(expires_at = %data.expires_at, "Cached session expired");
            return Ok(None);
        }
        Ok(Some(data))
    }

    pub fn save(&self, data: &SessionData) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(data)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ttl_seconds: i64) -> SessionData {
        SessionData::try_new(
            "token".to_string(),
            "https://123.selcdn.ru/".to_string(),
            ttl_seconds,
        )
        .unwrap()
    }

    #[test]
    fn test_session_data_expiry() {
        assert!(!sample(3600).is_expired());
        assert!(sample(-1).is_expired());

        let data = sample(60);
        assert!(data.is_expired_at(data.expires_at));
        assert!(!data.is_expired_at(data.expires_at - Duration::seconds(1)));
    }

    #[test]
    fn test_unrepresentable_ttl_is_rejected() {
        assert!(SessionData::expiry_after(i64::MAX).is_none());
        assert!(SessionData::expiry_after(i64::MIN).is_none());
        // Fits in a Duration but lands past the last representable date
        assert!(SessionData::expiry_after(99_999_999_999_999).is_none());
        assert!(SessionData::try_new("t".to_string(), "u".to_string(), i64::MAX).is_none());
        assert!(SessionData::expiry_after(3600).is_some());
    }

    #[test]
    fn test_seconds_until_expiry_never_negative() {
        assert_eq!(sample(-120).seconds_until_expiry(), 0);
        assert!(sample(120).seconds_until_expiry() > 100);
    }

    #[test]
    fn test_session_starts_empty() {
        let session = Session::new();
        assert!(session.token().is_none());
        assert!(session.storage_url().is_none());
        assert!(session.expires_at().is_none());
        assert!(session.needs_renewal());
    }

    #[test]
    fn test_session_update_and_clear() {
        let mut session = Session::new();
        session.update(sample(3600));
        assert_eq!(session.token(), Some("token"));
        assert_eq!(session.storage_url(), Some("https://123.selcdn.ru/"));
        assert!(session.is_valid());

        session.clear();
        assert!(session.data().is_none());
        session.clear();
        assert!(session.data().is_none());
    }

    #[test]
    fn test_expired_session_needs_renewal() {
        let mut session = Session::new();
        session.update(sample(-5));
        assert!(session.needs_renewal());
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let printed = format!("{:?}", sample(10));
        assert!(!printed.contains("\"token\""));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_session_store_roundtrip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested"));
        assert!(store.load().unwrap().is_none());

        let data = sample(3600);
        store.save(&data).unwrap();
        assert_eq!(store.load().unwrap(), Some(data));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_session_store_skips_expired() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().to_path_buf());
        store.save(&sample(-60)).unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
