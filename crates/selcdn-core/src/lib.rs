//! Session management and verified uploads for Selectel Cloud Storage.
//!
//! ```ignore
//! use std::collections::HashMap;
//! use selcdn_core::{Credentials, StorageClient};
//!
//! let credentials = Credentials::new("12345_user", "secret", "images")
//!     .with_attached_domain("cdn.example.com");
//! let mut client = StorageClient::new(credentials)?;
//! let url = client.upload(b"hello", "greetings/hello.txt", &HashMap::new()).await?;
//! println!("{url}");
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod utils;

pub use api::{AuthError, StorageClient, StorageError, VerificationError};
pub use auth::{CredentialStore, Credentials, Session, SessionData, SessionStore};
pub use config::Config;
