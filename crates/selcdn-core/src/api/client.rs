//! Session-managing client for the Selectel Cloud Storage API.
//!
//! `StorageClient` holds the credentials and the current session, renews the
//! token when it is missing or expired, and uploads objects with a PUT that
//! is confirmed by an independent HEAD.

use std::collections::HashMap;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{Credentials, Session, SessionData};
use crate::utils::{check_object_path, content_md5, object_url, public_url};

use super::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use super::{AuthError, StorageError, VerificationError};

// ============================================================================
// Constants
// ============================================================================

/// Authentication endpoint issuing tokens and storage URLs
pub const AUTH_URL: &str = "https://auth.selcdn.ru/";

const HEADER_AUTH_USER: &str = "x-auth-user";
const HEADER_AUTH_KEY: &str = "x-auth-key";
const HEADER_AUTH_TOKEN: &str = "x-auth-token";
const HEADER_EXPIRE_AUTH_TOKEN: &str = "x-expire-auth-token";
const HEADER_STORAGE_URL: &str = "x-storage-url";

/// Client for one account and one container.
///
/// Every operation takes `&mut self`, so a single instance never runs two
/// requests at once. Create one instance per concurrent uploader; they can
/// share a transport.
pub struct StorageClient<T = ReqwestTransport> {
    transport: T,
    credentials: Credentials,
    session: Session,
    auth_url: String,
}

impl StorageClient<ReqwestTransport> {
    /// Create a client using the default reqwest transport
    pub fn new(credentials: Credentials) -> Result<Self, StorageError> {
        Ok(Self::with_transport(credentials, ReqwestTransport::new()?))
    }
}

impl<T: HttpTransport> StorageClient<T> {
    /// Create a client that sends its requests through `transport`.
    pub fn with_transport(credentials: Credentials, transport: T) -> Self {
        Self {
            transport,
            credentials,
            session: Session::new(),
            auth_url: AUTH_URL.to_string(),
        }
    }

    /// Use a different authentication endpoint.
    pub fn with_auth_url(mut self, auth_url: impl Into<String>) -> Self {
        self.auth_url = auth_url.into();
        self
    }

    /// Start from a previously issued session, e.g. one loaded from disk.
    pub fn with_session(mut self, data: SessionData) -> Self {
        self.session.update(data);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_valid()
    }

    /// Drop the current session. The next upload will authenticate again.
    pub fn reset(&mut self) -> &mut Self {
        self.session.clear();
        self
    }

    /// Obtain a new token and storage URL from the auth endpoint.
    ///
    /// The session is replaced only when the response carries all three
    /// session headers; on any failure the previous session is kept as is.
    pub async fn renew(&mut self) -> Result<&mut Self, StorageError> {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_AUTH_USER, header_value(self.credentials.auth_user())?);
        headers.insert(HEADER_AUTH_KEY, header_value(self.credentials.auth_key())?);

        debug!(user = self.credentials.auth_user(), url = %self.auth_url, "Requesting auth token");
        let request = HttpRequest::new(Method::GET, self.auth_url.as_str()).with_headers(headers);
        let response = self.transport.send(request).await?;

        let data = Self::parse_auth_response(&response)?;
        info!(
            storage_url = %data.storage_url,
            expires_at = %data.expires_at,
            "Auth token renewed"
        );
        self.session.update(data);
        Ok(self)
    }

    fn parse_auth_response(response: &HttpResponse) -> Result<SessionData, AuthError> {
        if response.status != StatusCode::NO_CONTENT {
            return Err(AuthError::from_status(response.status));
        }

        let token = response
            .header(HEADER_AUTH_TOKEN)
            .ok_or(AuthError::MissingToken)?;
        let expires_at = response
            .header(HEADER_EXPIRE_AUTH_TOKEN)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(SessionData::expiry_after)
            .ok_or(AuthError::InvalidExpiry)?;
        let storage_url = response
            .header(HEADER_STORAGE_URL)
            .ok_or(AuthError::MissingStorageUrl)?;

        Ok(SessionData {
            token: token.to_string(),
            storage_url: storage_url.to_string(),
            expires_at,
        })
    }

    /// Upload `content` to `relative_path` inside the container and verify it.
    ///
    /// Returns the URL the object is publicly reachable at: the attached
    /// domain URL when one is configured, otherwise the storage URL.
    pub async fn upload(
        &mut self,
        content: &[u8],
        relative_path: &str,
        request_headers: &HashMap<String, String>,
    ) -> Result<Url, StorageError> {
        // Caller input is validated before anything goes over the wire
        check_object_path(relative_path)?;
        let mut headers = caller_headers(request_headers)?;

        if self.session.needs_renewal() {
            debug!("No valid session, renewing before upload");
            self.renew().await?;
        }
        let (token, storage_url) = match self.session.data() {
            Some(data) => (data.token.clone(), data.storage_url.clone()),
            None => return Err(AuthError::MissingToken.into()),
        };

        let file_size = content.len() as u64;
        let digest = content_md5(content);
        let target = object_url(&storage_url, self.credentials.container_name(), relative_path)?;

        headers.insert(HEADER_AUTH_TOKEN, header_value(&token)?);
        headers.insert(header::ETAG, header_value(&digest)?);

        debug!(url = %target, size = file_size, etag = %digest, "Uploading object");
        let request = HttpRequest::new(Method::PUT, target.as_str())
            .with_headers(headers)
            .with_body(content.to_vec());
        let response = self.transport.send(request).await?;
        if response.status != StatusCode::CREATED {
            warn!(url = %target, status = response.status.as_u16(), "Upload rejected");
            return Err(StorageError::Upload {
                status: response.status.as_u16(),
            });
        }

        let location = match self.credentials.attached_domain() {
            Some(domain) => public_url(domain, relative_path)?,
            None => target,
        };

        let response = self
            .transport
            .send(HttpRequest::new(Method::HEAD, location.as_str()))
            .await?;
        if let Err(e) = verify_object(&response, &digest, file_size) {
            warn!(url = %location, error = %e, "Upload verification failed");
            return Err(e.into());
        }

        info!(url = %location, size = file_size, "Upload verified");
        Ok(location)
    }
}

/// Check a HEAD response against what was uploaded.
/// Missing `ETag` or `Content-Length` headers are accepted.
fn verify_object(
    response: &HttpResponse,
    digest: &str,
    file_size: u64,
) -> Result<(), VerificationError> {
    if !response.status.is_success() {
        return Err(VerificationError::UnexpectedStatus(response.status.as_u16()));
    }

    if let Some(etag) = response.headers.get(header::ETAG) {
        let etag = String::from_utf8_lossy(etag.as_bytes());
        if etag != digest {
            return Err(VerificationError::EtagMismatch {
                expected: digest.to_string(),
                actual: etag.into_owned(),
            });
        }
    }

    if let Some(length) = response.headers.get(header::CONTENT_LENGTH) {
        let length = String::from_utf8_lossy(length.as_bytes());
        if length.trim().parse::<u64>().ok() != Some(file_size) {
            return Err(VerificationError::LengthMismatch {
                expected: file_size,
                actual: length.into_owned(),
            });
        }
    }

    Ok(())
}

fn caller_headers(request_headers: &HashMap<String, String>) -> Result<HeaderMap, StorageError> {
    let mut headers = HeaderMap::with_capacity(request_headers.len() + 2);
    for (name, value) in request_headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| StorageError::InvalidRequest(format!("Invalid header name {:?}", name)))?;
        headers.insert(name, header_value(value)?);
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, StorageError> {
    HeaderValue::from_str(value)
        .map_err(|_| StorageError::InvalidRequest("Header value contains invalid characters".to_string()))
}

// ============================================================================
// Tests
// ============================================================================
