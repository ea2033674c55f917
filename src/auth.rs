use sha2::{Digest, Sha256};

/// Credential check attached to a gradebook.
///
/// This gates the sidecar session only; it is not access control over the
/// data file itself.
pub trait Authenticator {
    fn authenticate(&self, username: &str, password: &str) -> bool;
}

/// A single username plus the SHA-256 digest of its password.
#[derive(Debug, Clone)]
pub struct CredentialPair {
    username: String,
    password_sha256: String,
}

impl CredentialPair {
    pub fn new(username: impl Into<String>, password_sha256: impl AsRef<str>) -> Self {
        Self {
            username: username.into(),
            password_sha256: password_sha256.as_ref().trim().to_ascii_lowercase(),
        }
    }

    #[cfg(test)]
    pub fn from_plaintext(username: impl Into<String>, password: &str) -> Self {
        Self::new(username, sha256_hex(password))
    }
}

impl Authenticator for CredentialPair {
    fn authenticate(&self, username: &str, password: &str) -> bool {
        username == self.username && sha256_hex(password) == self.password_sha256
    }
}

pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
