//! Filesystem-backed credential store.
//!
//! The durable analog of browser persistent storage: one file per key
//! (`accessToken`, `refreshToken`, `user`) under a state directory. Writes
//! go through a temp file and an atomic rename so a crash never leaves a
//! half-written key on disk.
//!
//! The store keeps an in-memory cache of the three keys. It is the single
//! owner of those keys (all mutation funnels through the writer task), so
//! the cache is authoritative and `load()` never touches the disk after
//! startup.

use crate::error::{Result, SessionError};
use crate::providers::{CredentialStore, StoredCredentials};
use crate::state::User;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

const ACCESS_TOKEN_KEY: &str = "accessToken";
const REFRESH_TOKEN_KEY: &str = "refreshToken";
const USER_KEY: &str = "user";

/// Credential store persisting to three files in a directory.
#[derive(Debug)]
pub struct FileCredentialStore {
    dir: PathBuf,
    cache: Mutex<StoredCredentials>,
}

impl FileCredentialStore {
    /// Open (and create if needed) the store at `dir`, priming the cache
    /// from whatever the previous process left behind.
    ///
    /// A user record that fails to deserialize clears all three keys -
    /// corrupt storage degrades to an empty store, it never errors.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the directory cannot be created or read.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SessionError::Storage(format!("create {}: {e}", dir.display())))?;

        let access_token = read_key(&dir, ACCESS_TOKEN_KEY).await?;
        let refresh_token = read_key(&dir, REFRESH_TOKEN_KEY).await?;
        let user_raw = read_key(&dir, USER_KEY).await?;

        let user = match user_raw {
            None => None,
            Some(raw) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(user),
                Err(error) => {
                    tracing::warn!(%error, "corrupt stored user record; clearing credentials");
                    remove_all(&dir).await?;
                    return Ok(Self {
                        dir,
                        cache: Mutex::new(StoredCredentials::default()),
                    });
                },
            },
        };

        Ok(Self {
            dir,
            cache: Mutex::new(StoredCredentials {
                user,
                access_token,
                refresh_token,
            }),
        })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl CredentialStore for FileCredentialStore {
    async fn save(&self, user: &User, access_token: &str, refresh_token: &str) -> Result<()> {
        let mut cache = self.cache.lock().await;

        let user_json = serde_json::to_string(user)
            .map_err(|e| SessionError::Storage(format!("serialize user: {e}")))?;

        // Fixed write order; partial failure is total failure.
        let outcome = async {
            write_atomic(&self.key_path(ACCESS_TOKEN_KEY), access_token).await?;
            write_atomic(&self.key_path(REFRESH_TOKEN_KEY), refresh_token).await?;
            write_atomic(&self.key_path(USER_KEY), &user_json).await?;
            Ok::<(), SessionError>(())
        }
        .await;

        match outcome {
            Ok(()) => {
                *cache = StoredCredentials {
                    user: Some(user.clone()),
                    access_token: Some(access_token.to_string()),
                    refresh_token: Some(refresh_token.to_string()),
                };
                Ok(())
            },
            Err(error) => {
                // Roll the survivors back so a concurrent reader can never
                // observe a partial record.
                tracing::error!(%error, "credential save failed; rolling back");
                remove_all(&self.dir).await?;
                *cache = StoredCredentials::default();
                Err(error)
            },
        }
    }

    async fn load(&self) -> Result<StoredCredentials> {
        Ok(self.cache.lock().await.clone())
    }

    async fn clear(&self) -> Result<()> {
        let mut cache = self.cache.lock().await;
        remove_all(&self.dir).await?;
        *cache = StoredCredentials::default();
        Ok(())
    }
}

async fn read_key(dir: &Path, key: &str) -> Result<Option<String>> {
    match fs::read_to_string(dir.join(key)).await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SessionError::Storage(format!("read {key}: {e}"))),
    }
}

async fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents)
        .await
        .map_err(|e| SessionError::Storage(format!("write {}: {e}", tmp.display())))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| SessionError::Storage(format!("rename {}: {e}", path.display())))
}

async fn remove_all(dir: &Path) -> Result<()> {
    for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
        match fs::remove_file(dir.join(key)).await {
            Ok(()) => {},
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => return Err(SessionError::Storage(format!("remove {key}: {e}"))),
        }
    }
    Ok(())
}
