//! Signed bearer tokens
//!
//! Admin sessions and CAPTCHA challenges are stateless: the server signs the
//! relevant data with HMAC-SHA256 and hands the result to the client, which
//! sends it back with the next request.
//!
//! Session token format: `<user uuid>.<expires unix seconds>.<hex signature>`

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::entities::UserId;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signer over a server secret
#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            key: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self, payload: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
        mac.update(payload.as_bytes());
        mac
    }

    /// Hex-encoded signature of `payload`
    pub fn sign(&self, payload: &str) -> String {
        hex::encode(self.mac(payload).finalize().into_bytes())
    }

    /// Constant-time check of a hex signature
    pub fn verify(&self, payload: &str, signature_hex: &str) -> bool {
        let Ok(expected) = hex::decode(signature_hex) else {
            return false;
        };
        self.mac(payload).verify_slice(&expected).is_ok()
    }
}

/// Issues and validates admin session tokens
#[derive(Clone)]
pub struct SessionTokens {
    signer: TokenSigner,
    ttl: Duration,
}

impl SessionTokens {
    pub fn new(signer: TokenSigner, ttl: Duration) -> Self {
        Self { signer, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn payload(user_id: &UserId, expires: i64) -> String {
        format!("session:{}.{}", user_id.0, expires)
    }

    /// Create a token for `user_id` valid until `now + ttl`
    pub fn issue(&self, user_id: &UserId, now: DateTime<Utc>) -> String {
        let expires = (now + self.ttl).timestamp();
        let signature = self.signer.sign(&Self::payload(user_id, expires));
        format!("{}.{}.{}", user_id.0, expires, signature)
    }

    /// Return the user a token was issued for, if the token is authentic and
    /// not expired
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Option<UserId> {
        let mut parts = token.splitn(3, '.');
        let user_id = parts.next()?.parse::<Uuid>().ok().map(UserId)?;
        let expires = parts.next()?.parse::<i64>().ok()?;
        let signature = parts.next()?;

        if now.timestamp() > expires {
            return None;
        }
        if !self.signer.verify(&Self::payload(&user_id, expires), signature) {
            return None;
        }
        Some(user_id)
    }
}
