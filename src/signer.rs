use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("device key is not valid base64: {0}")]
    BadKeyEncoding(String),

    #[error("device key must not be empty")]
    EmptyKey,
}

/// The shoe's pre-authorized signing secret. Releasing a signature is gated
/// on gesture recognition upstream; this type only does the math.
pub struct DeviceKey {
    secret: Vec<u8>,
}

impl DeviceKey {
    pub fn from_base64(encoded: &str) -> Result<Self, SignerError> {
        let secret = BASE64
            .decode(encoded.trim())
            .map_err(|e| SignerError::BadKeyEncoding(e.to_string()))?;
        if secret.is_empty() {
            return Err(SignerError::EmptyKey);
        }
        Ok(Self { secret })
    }

    /// Stable hex identifier derived from the secret; safe for logs.
    pub fn address(&self) -> String {
        let digest = Sha256::digest(&self.secret);
        format!("0x{}", hex::encode(digest))
    }

    /// Base64 HMAC-SHA256 over the raw transaction bytes.
    pub fn sign(&self, payload: &[u8]) -> String {
        // HMAC accepts keys of any non-zero length; emptiness is rejected at
        // construction.
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC key length is unrestricted");
        mac.update(payload);
        BASE64.encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for DeviceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeviceKey({})", self.address())
    }
}
