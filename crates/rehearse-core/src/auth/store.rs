use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use rehearse_types::UserProfile;

use super::mask_token;
use super::storage::{CredentialStorage, FileStorage, MemoryStorage, StoredAuth};

/// The current auth session: credential pair plus cached profile.
///
/// Cloning is cheap; all clones share one session. Every mutation writes the
/// full snapshot through to the storage backend.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<StoredAuth>,
    storage: Box<dyn CredentialStorage>,
}

impl AuthStore {
    /// Opens the store over `storage`, restoring a previously persisted session.
    ///
    /// A stored session that is unreadable or only partially present is
    /// discarded and removed.
    pub fn open(storage: impl CredentialStorage + 'static) -> Self {
        let restored = match storage.load() {
            Ok(Some(stored)) if stored.is_complete() => stored,
            Ok(Some(stored)) => {
                if !stored.is_empty() {
                    tracing::warn!("discarding partially persisted auth session");
                    discard(&storage);
                }
                StoredAuth::default()
            }
            Ok(None) => StoredAuth::default(),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "discarding unreadable auth session");
                discard(&storage);
                StoredAuth::default()
            }
        };

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(restored),
                storage: Box::new(storage),
            }),
        }
    }

    /// Opens a store persisted as JSON at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::open(FileStorage::new(path))
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::open(MemoryStorage::new())
    }

    /// Writes a complete session in one step.
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be persisted; the in-memory
    /// session is updated regardless.
    pub fn establish(
        &self,
        access: impl Into<String>,
        refresh: impl Into<String>,
        profile: UserProfile,
    ) -> Result<()> {
        self.mutate(|state| {
            *state = StoredAuth {
                access: Some(access.into()),
                refresh: Some(refresh.into()),
                user: Some(profile),
            };
        })
    }

    /// Installs renewed credentials, provided the session that sent
    /// `renewed_from` is still the current one.
    ///
    /// Returns `Ok(false)` and changes nothing when the session was cleared
    /// or replaced while the renewal was in flight. The refresh credential is
    /// replaced only when the server rotated it.
    ///
    /// # Errors
    /// Returns an error if the snapshot cannot be persisted.
    pub fn renew_credentials(
        &self,
        renewed_from: &str,
        access: impl Into<String>,
        refresh: Option<String>,
    ) -> Result<bool> {
        let snapshot = {
            let mut state = self.lock();
            if !state.is_complete() || state.refresh.as_deref() != Some(renewed_from) {
                return Ok(false);
            }
            state.access = Some(access.into());
            if let Some(refresh) = refresh {
                state.refresh = Some(refresh);
            }
            state.clone()
        };
        self.persist(&snapshot)?;
        Ok(true)
    }

    /// # Errors
    /// Returns an error if the snapshot cannot be persisted.
    pub fn set_profile(&self, profile: UserProfile) -> Result<()> {
        self.mutate(|state| state.user = Some(profile))
    }

    /// Drops credentials and profile together.
    ///
    /// # Errors
    /// Returns an error if persisted data cannot be removed.
    pub fn clear(&self) -> Result<()> {
        self.mutate(|state| *state = StoredAuth::default())
    }

    /// Clears the session only if it still holds `refresh`. Returns whether
    /// it was cleared.
    ///
    /// # Errors
    /// Returns an error if persisted data cannot be removed.
    pub fn clear_if_refresh(&self, refresh: &str) -> Result<bool> {
        {
            let mut state = self.lock();
            if state.refresh.as_deref() != Some(refresh) {
                return Ok(false);
            }
            *state = StoredAuth::default();
        }
        self.persist(&StoredAuth::default())?;
        Ok(true)
    }

    pub fn access(&self) -> Option<String> {
        self.lock().access.clone()
    }

    pub fn refresh(&self) -> Option<String> {
        self.lock().refresh.clone()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.lock().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().access.is_some()
    }

    pub fn snapshot(&self) -> StoredAuth {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, StoredAuth> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate(&self, apply: impl FnOnce(&mut StoredAuth)) -> Result<()> {
        let snapshot = {
            let mut state = self.lock();
            apply(&mut state);
            state.clone()
        };
        self.persist(&snapshot)
    }

    fn persist(&self, snapshot: &StoredAuth) -> Result<()> {
        let persisted = if snapshot.is_empty() {
            self.inner.storage.remove()
        } else {
            self.inner.storage.save(snapshot)
        };
        if let Err(err) = &persisted {
            tracing::warn!(error = %format!("{err:#}"), "failed to persist auth session");
        }
        persisted
    }
}

impl fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("AuthStore")
            .field("access", &state.access.as_deref().map(mask_token))
            .field("refresh", &state.refresh.as_deref().map(mask_token))
            .field("user", &state.user.as_ref().map(|u| u.id.as_str()))
            .finish()
    }
}

fn discard(storage: &dyn CredentialStorage) {
    if let Err(err) = storage.remove() {
        tracing::warn!(error = %format!("{err:#}"), "failed to remove stale auth session");
    }
}
