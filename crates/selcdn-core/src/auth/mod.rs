//! Authentication state for the storage API.
//!
//! This module provides:
//! - `Credentials`: the account and container an uploader works with
//! - `Session`: the token, expiry and storage URL issued by the auth endpoint
//! - `SessionStore`: on-disk cache so a still-valid token survives restarts
//! - `CredentialStore`: OS-level storage of the auth key via keyring

pub mod credentials;
pub mod session;

pub use credentials::{CredentialStore, Credentials};
pub use session::{Session, SessionData, SessionStore};
