//! Single-writer funnel for the credential store.
//!
//! The three durable keys are exclusively owned by one `CredentialStore`
//! instance, and that instance is exclusively owned by one writer task.
//! Mutations are *enqueued synchronously* inside reducer runs - which the
//! Store serializes - so writes apply in exactly the order their state
//! transitions committed, and no two save/clear calls are ever in flight
//! at once. Reads round-trip through the same task, ordering them with
//! the writes.

use crate::error::{Result, SessionError};
use crate::providers::{CredentialStore, StoredCredentials};
use crate::state::User;
use tokio::sync::{mpsc, oneshot};

enum WriterCommand {
    Save {
        user: User,
        access_token: String,
        refresh_token: String,
    },
    Clear,
    Load {
        reply: oneshot::Sender<Result<StoredCredentials>>,
    },
    /// Resolves once every previously enqueued command has been applied.
    Flush {
        ack: oneshot::Sender<()>,
    },
}

/// The writer task owning a [`CredentialStore`].
pub struct CredentialWriter;

impl CredentialWriter {
    /// Spawn the writer task around `store` and return the handle used to
    /// reach it.
    ///
    /// The task runs until every [`CredentialHandle`] clone is dropped.
    pub fn spawn<C>(store: C) -> CredentialHandle
    where
        C: CredentialStore + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    WriterCommand::Save {
                        user,
                        access_token,
                        refresh_token,
                    } => {
                        if let Err(error) =
                            store.save(&user, &access_token, &refresh_token).await
                        {
                            // The store has rolled back to empty per its
                            // contract; nothing to repair here.
                            tracing::error!(%error, "credential save failed and rolled back");
                        }
                    },
                    WriterCommand::Clear => {
                        if let Err(error) = store.clear().await {
                            tracing::error!(%error, "credential clear failed");
                        }
                    },
                    WriterCommand::Load { reply } => {
                        let _ = reply.send(store.load().await);
                    },
                    WriterCommand::Flush { ack } => {
                        let _ = ack.send(());
                    },
                }
            }
            tracing::debug!("credential writer shutting down");
        });

        CredentialHandle { tx }
    }
}

/// Cloneable handle to the credential writer task.
#[derive(Clone)]
pub struct CredentialHandle {
    tx: mpsc::UnboundedSender<WriterCommand>,
}

impl CredentialHandle {
    /// Enqueue a save of all three keys. Non-blocking; call from inside a
    /// reducer run so the write is ordered with the state commit.
    pub fn queue_save(&self, user: User, access_token: String, refresh_token: String) {
        let sent = self.tx.send(WriterCommand::Save {
            user,
            access_token,
            refresh_token,
        });
        if sent.is_err() {
            tracing::error!("credential writer gone; save dropped");
        }
    }

    /// Enqueue removal of all three keys. Non-blocking, ordered like
    /// [`CredentialHandle::queue_save`].
    pub fn queue_clear(&self) {
        if self.tx.send(WriterCommand::Clear).is_err() {
            tracing::error!("credential writer gone; clear dropped");
        }
    }

    /// Read the current record, ordered after all enqueued writes.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the writer task is gone or the underlying
    /// store fails.
    pub async fn load(&self) -> Result<StoredCredentials> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(WriterCommand::Load { reply })
            .map_err(|_| SessionError::Storage("credential writer gone".to_string()))?;
        rx.await
            .map_err(|_| SessionError::Storage("credential writer gone".to_string()))?
    }

    /// Wait until every previously enqueued write has been applied.
    ///
    /// Controller operations call this before returning, which is what
    /// makes "state and storage both updated" hold at the operation
    /// boundary.
    pub async fn flush(&self) {
        let (ack, rx) = oneshot::channel();
        if self.tx.send(WriterCommand::Flush { ack }).is_ok() {
            let _ = rx.await;
        }
    }
}

impl std::fmt::Debug for CredentialHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHandle").finish_non_exhaustive()
    }
}
