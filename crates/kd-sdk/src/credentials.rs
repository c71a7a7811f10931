//! Credential Store
//!
//! Durable key-value storage for the access token, refresh token and scope
//! tag. The pipeline reads it on every request and never caches a copy.
//!
//! Every write goes through [`CredentialStore::apply`], which lands a whole
//! batch of changes at once, so the two tokens are always set or cleared
//! together.

use crate::error::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persisted key names
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CredentialKey {
    AccessToken,
    RefreshToken,
    UserScope,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 3] = [
        CredentialKey::AccessToken,
        CredentialKey::RefreshToken,
        CredentialKey::UserScope,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKey::AccessToken => "token",
            CredentialKey::RefreshToken => "refreshToken",
            CredentialKey::UserScope => "userScope",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One write in a batch: `Some` sets the key, `None` removes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialChange {
    pub key: CredentialKey,
    pub value: Option<String>,
}

impl CredentialChange {
    pub fn set(key: CredentialKey, value: impl Into<String>) -> Self {
        Self { key, value: Some(value.into()) }
    }

    pub fn remove(key: CredentialKey) -> Self {
        Self { key, value: None }
    }
}

/// Snapshot of the stored session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none() && self.scope.is_none()
    }

    /// Logged in for guard purposes: token and scope both present
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.scope.is_some()
    }
}

/// Durable credential storage.
///
/// Implementations must apply each `apply` batch atomically with respect
/// to concurrent readers.
pub trait CredentialStore: Send + Sync + fmt::Debug {
    fn get(&self, key: CredentialKey) -> Option<String>;

    fn apply(&self, changes: &[CredentialChange]) -> Result<()>;

    fn credentials(&self) -> Credentials {
        Credentials {
            access_token: self.get(CredentialKey::AccessToken),
            refresh_token: self.get(CredentialKey::RefreshToken),
            scope: self.get(CredentialKey::UserScope),
        }
    }

    fn access_token(&self) -> Option<String> {
        self.get(CredentialKey::AccessToken)
    }

    fn refresh_token(&self) -> Option<String> {
        self.get(CredentialKey::RefreshToken)
    }

    /// Store a fresh login. Absent values are removed.
    fn save_session(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        scope: Option<&str>,
    ) -> Result<()> {
        self.apply(&[
            CredentialChange::set(CredentialKey::AccessToken, access_token),
            CredentialChange {
                key: CredentialKey::RefreshToken,
                value: refresh_token.map(str::to_string),
            },
            CredentialChange {
                key: CredentialKey::UserScope,
                value: scope.map(str::to_string),
            },
        ])
    }

    /// Store refreshed tokens. The refresh token is only replaced when the
    /// server rotated it.
    fn save_tokens(&self, access_token: &str, rotated_refresh_token: Option<&str>) -> Result<()> {
        let mut changes = vec![CredentialChange::set(CredentialKey::AccessToken, access_token)];
        if let Some(refresh) = rotated_refresh_token {
            changes.push(CredentialChange::set(CredentialKey::RefreshToken, refresh));
        }
        self.apply(&changes)
    }

    /// Remove all three keys
    fn clear(&self) -> Result<()> {
        let changes: Vec<CredentialChange> =
            CredentialKey::ALL.into_iter().map(CredentialChange::remove).collect();
        self.apply(&changes)
    }
}

type Entries = BTreeMap<CredentialKey, String>;

fn apply_changes(entries: &mut Entries, changes: &[CredentialChange]) {
    for change in changes {
        match &change.value {
            Some(value) => {
                entries.insert(change.key, value.clone());
            }
            None => {
                entries.remove(&change.key);
            }
        }
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store, used by tests and short-lived tools
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<Entries>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with a logged-in session
    pub fn with_session(access_token: &str, refresh_token: Option<&str>, scope: Option<&str>) -> Self {
        let mut entries = Entries::new();
        entries.insert(CredentialKey::AccessToken, access_token.to_string());
        if let Some(refresh) = refresh_token {
            entries.insert(CredentialKey::RefreshToken, refresh.to_string());
        }
        if let Some(scope) = scope {
            entries.insert(CredentialKey::UserScope, scope.to_string());
        }
        Self { entries: RwLock::new(entries) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.entries.read().get(&key).cloned()
    }

    fn apply(&self, changes: &[CredentialChange]) -> Result<()> {
        apply_changes(&mut self.entries.write(), changes);
        Ok(())
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// JSON file store that survives process restarts.
///
/// Reads are served from memory. Writes are persisted with
/// write-to-temp-then-rename before becoming visible.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    entries: RwLock<Entries>,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Open (or lazily create) the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Entries::new()
            } else {
                let raw: BTreeMap<String, String> = serde_json::from_str(&content).map_err(|e| {
                    Error::Storage(format!("corrupt credential file {}: {}", path.display(), e))
                })?;
                raw.into_iter()
                    .filter_map(|(name, value)| CredentialKey::from_name(&name).map(|key| (key, value)))
                    .collect()
            }
        } else {
            Entries::new()
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened credential store");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &Entries) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        let raw: BTreeMap<&str, &String> =
            entries.iter().map(|(key, value)| (key.as_str(), value)).collect();
        std::fs::write(&tmp, serde_json::to_vec_pretty(&raw)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.entries.read().get(&key).cloned()
    }

    fn apply(&self, changes: &[CredentialChange]) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut next = self.entries.read().clone();
        apply_changes(&mut next, changes);
        self.persist(&next)?;
        *self.entries.write() = next;
        Ok(())
    }
}
