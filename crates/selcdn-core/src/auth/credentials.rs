use std::fmt;

use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "selcdn";

/// Account credentials and the container uploads go to.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    auth_user: String,
    auth_key: String,
    container_name: String,
    attached_domain: Option<String>,
}

impl Credentials {
    pub fn new(
        auth_user: impl Into<String>,
        auth_key: impl Into<String>,
        container_name: impl Into<String>,
    ) -> Self {
        Self {
            auth_user: auth_user.into(),
            auth_key: auth_key.into(),
            container_name: container_name.into(),
            attached_domain: None,
        }
    }

    /// Serve uploaded objects from a CDN or custom domain.
    /// Empty strings are treated as no domain.
    pub fn with_attached_domain(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        self.attached_domain = if domain.trim().is_empty() {
            None
        } else {
            Some(domain)
        };
        self
    }

    pub fn auth_user(&self) -> &str {
        &self.auth_user
    }

    pub fn auth_key(&self) -> &str {
        &self.auth_key
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn attached_domain(&self) -> Option<&str> {
        self.attached_domain.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_user", &self.auth_user)
            .field("auth_key", &"<redacted>")
            .field("container_name", &self.container_name)
            .field("attached_domain", &self.attached_domain)
            .finish()
    }
}

/// Auth keys kept in the OS keychain, one entry per storage user.
pub struct CredentialStore;

impl CredentialStore {
    /// Store the auth key for a user in the OS keychain
    pub fn store(auth_user: &str, auth_key: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, auth_user)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(auth_key)
            .context("Failed to store auth key in keychain")?;
        Ok(())
    }

    /// Retrieve the auth key for a user from the OS keychain
    pub fn get_key(auth_user: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, auth_user)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve auth key from keychain")
    }

    pub fn delete(auth_user: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, auth_user)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete auth key from keychain")?;
        Ok(())
    }

    pub fn has_key(auth_user: &str) -> bool {
        Entry::new(SERVICE_NAME, auth_user)
            .and_then(|entry| entry.get_password())
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_auth_key() {
        let creds = Credentials::new("user", "s3cret", "images");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("user"));
        assert!(!printed.contains("s3cret"));
    }

    #[test]
    fn test_blank_attached_domain_is_none() {
        let creds = Credentials::new("user", "key", "images").with_attached_domain("  ");
        assert_eq!(creds.attached_domain(), None);

        let creds = Credentials::new("user", "key", "images").with_attached_domain("cdn.example.com");
        assert_eq!(creds.attached_domain(), Some("cdn.example.com"));
    }
}
