//! Signed URLs for private blobs.
//!
//! A token is the SHA-256 of a per-process secret, the object address, and
//! the expiry, encoded as URL-safe base64. Restarting the process invalidates
//! every outstanding URL.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

pub struct UrlSigner {
  secret: [u8; 32],
}

impl UrlSigner {
  pub fn generate() -> Self {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    Self { secret }
  }

  pub fn token(&self, bucket: &str, path: &str, expires: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.secret);
    hasher.update(bucket.as_bytes());
    hasher.update([0]);
    hasher.update(path.as_bytes());
    hasher.update([0]);
    hasher.update(expires.to_be_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
  }

  /// Whether `token` was issued by this signer for exactly these inputs.
  pub fn verify(&self, bucket: &str, path: &str, expires: i64, token: &str) -> bool {
    let expected = self.token(bucket, path, expires);
    expected.len() == token.len()
      && expected
        .bytes()
        .zip(token.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
  }
}
