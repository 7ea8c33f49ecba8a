//! Storage API client module.
//!
//! This module provides the `StorageClient` that authenticates against the
//! Selectel auth endpoint and uploads objects into a container, verifying
//! each write with a follow-up HEAD request.
//!
//! HTTP traffic goes through the `HttpTransport` trait; `ReqwestTransport`
//! is the implementation used outside of tests.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{StorageClient, AUTH_URL};
pub use error::{AuthError, StorageError, VerificationError};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
