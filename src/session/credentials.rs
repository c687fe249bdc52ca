//! Signed auth tokens for the vendor capability.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::config::AccountConfig;
use crate::error::CapabilityError;

/// Host role claim.
const ROLE_HOST: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(rename = "appKey")]
    app_key: String,
    #[serde(rename = "sdkKey")]
    sdk_key: String,
    mn: String,
    role: u8,
    iat: u64,
    exp: u64,
    #[serde(rename = "tokenExp")]
    token_exp: u64,
}

/// An HS256 token signed with the account secret.
#[derive(Clone)]
pub struct Credentials {
    token: String,
    expires_at: u64,
}

impl Credentials {
    /// Signs a fresh token issued at `issued_at`, valid for `account.token_ttl`.
    pub fn signed(account: &AccountConfig, issued_at: SystemTime) -> Result<Self, CapabilityError> {
        let iat = issued_at
            .duration_since(UNIX_EPOCH)
            .map_err(|e| CapabilityError::new("sign", 0, e.to_string()))?
            .as_secs();
        let exp = iat.saturating_add(account.token_ttl.as_secs());

        let claims = Claims {
            app_key: account.sdk_key.clone(),
            sdk_key: account.sdk_key.clone(),
            mn: account.meeting_number.clone(),
            role: ROLE_HOST,
            iat,
            exp,
            token_exp: exp,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(account.sdk_secret.as_bytes()),
        )
        .map_err(|e| CapabilityError::new("sign", 0, e.to_string()))?;

        Ok(Self {
            token,
            expires_at: exp,
        })
    }

    /// The encoded token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Expiry as seconds since the Unix epoch.
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
    use std::time::Duration;

    fn account() -> AccountConfig {
        AccountConfig {
            sdk_key: "key-123".into(),
            sdk_secret: "s3cret".into(),
            meeting_number: "1234567890".into(),
            ..AccountConfig::default()
        }
    }

    #[test]
    fn token_carries_host_claims() {
        let now = SystemTime::now();
        let creds = Credentials::signed(&account(), now).unwrap();

        let data = decode::<Claims>(
            creds.token(),
            &DecodingKey::from_secret(b"s3cret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        let claims = data.claims;
        assert_eq!(claims.app_key, "key-123");
        assert_eq!(claims.sdk_key, "key-123");
        assert_eq!(claims.mn, "1234567890");
        assert_eq!(claims.role, 1);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert_eq!(claims.token_exp, claims.exp);
        assert_eq!(creds.expires_at(), claims.exp);
    }

    #[test]
    fn wrong_secret_does_not_verify() {
        let mut acc = account();
        acc.token_ttl = Duration::from_secs(60);
        let creds = Credentials::signed(&acc, SystemTime::now()).unwrap();
        let res = decode::<Claims>(
            creds.token(),
            &DecodingKey::from_secret(b"other"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(res.is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let creds = Credentials::signed(&account(), SystemTime::now()).unwrap();
        assert!(!format!("{creds:?}").contains(creds.token()));
    }
}
