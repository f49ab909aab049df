//! Concrete credential storage.
//!
//! [`FileCredentialStore`] is the durable implementation;
//! [`CredentialWriter`] is the single-writer funnel every mutation goes
//! through, whatever the backing store.

pub mod file;
pub mod writer;

pub use file::FileCredentialStore;
pub use writer::{CredentialHandle, CredentialWriter};
