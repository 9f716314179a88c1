//! Bearer token issuing and verification.
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(mac)`
//! without padding. The claims carry the account's [`PublicId`] and an absolute
//! expiry in Unix seconds; a token is accepted strictly before that instant.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use shoplist_core::PublicId;

use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Serialize, Deserialize)]
struct Header<'a> {
    alg: &'a str,
    typ: &'a str,
}

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Public identifier of the account the token was issued to.
    pub public_id: PublicId,
    /// Expiry as Unix seconds.
    pub exp: i64,
}

/// Issues and verifies bearer tokens with a single shared secret.
#[derive(Debug, Clone)]
pub struct TokenAuthority {
    secret: SecretString,
    ttl: TimeDelta,
}

impl TokenAuthority {
    /// Create an authority signing with `secret`; issued tokens live for `ttl`.
    #[must_use]
    pub const fn new(secret: SecretString, ttl: TimeDelta) -> Self {
        Self { secret, ttl }
    }

    /// Lifetime of issued tokens.
    #[must_use]
    pub const fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Issue a token for `public_id`, expiring `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the token cannot be encoded.
    pub fn issue(&self, public_id: PublicId) -> Result<String, AuthError> {
        self.issue_at(public_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the token cannot be encoded.
    pub fn issue_at(&self, public_id: PublicId, now: DateTime<Utc>) -> Result<String, AuthError> {
        let header = Header {
            alg: ALGORITHM,
            typ: "JWT",
        };
        let claims = Claims {
            public_id,
            exp: (now + self.ttl).timestamp(),
        };

        let header = serde_json::to_vec(&header).map_err(|_| AuthError::Signing)?;
        let claims = serde_json::to_vec(&claims).map_err(|_| AuthError::Signing)?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` if the token is malformed, was signed with
    /// another secret or algorithm, or has expired.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// See [`TokenAuthority::verify`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header), Some(claims), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::Invalid);
        };

        let header_bytes = decode_segment(header)?;
        let parsed: Header<'_> =
            serde_json::from_slice(&header_bytes).map_err(|_| AuthError::Invalid)?;
        if parsed.alg != ALGORITHM {
            return Err(AuthError::Invalid);
        }

        // Constant-time comparison
        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(claims.as_bytes());
        mac.verify_slice(&decode_segment(signature)?)
            .map_err(|_| AuthError::Invalid)?;

        let claims: Claims =
            serde_json::from_slice(&decode_segment(claims)?).map_err(|_| AuthError::Invalid)?;
        if now.timestamp() >= claims.exp {
            return Err(AuthError::Invalid);
        }

        Ok(claims)
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| AuthError::Signing)
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, AuthError> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::Invalid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn authority(secret: &str) -> TokenAuthority {
        TokenAuthority::new(SecretString::from(secret), TimeDelta::minutes(90))
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = authority("k3Jf9sLw0qPzX7vB2nM5tR8yC1dG4hA6");
        let id = PublicId::generate();
        let token = tokens.issue_at(id, noon()).unwrap();

        let claims = tokens.verify_at(&token, noon()).unwrap();
        assert_eq!(claims.public_id, id);
        assert_eq!(claims.exp, (noon() + TimeDelta::minutes(90)).timestamp());
    }

    #[test]
    fn test_expiry_is_exclusive() {
        let tokens = authority("k3Jf9sLw0qPzX7vB2nM5tR8yC1dG4hA6");
        let token = tokens.issue_at(PublicId::generate(), noon()).unwrap();
        let expiry = noon() + TimeDelta::minutes(90);

        assert!(tokens.verify_at(&token, expiry - TimeDelta::seconds(1)).is_ok());
        assert!(matches!(
            tokens.verify_at(&token, expiry),
            Err(AuthError::Invalid)
        ));
        assert!(tokens.verify_at(&token, expiry + TimeDelta::hours(1)).is_err());
    }

    #[test]
    fn test_rejects_other_secret() {
        let token = authority("k3Jf9sLw0qPzX7vB2nM5tR8yC1dG4hA6")
            .issue_at(PublicId::generate(), noon())
            .unwrap();
        let other = authority("Zq8wE2rT6yU1iO4pA9sD3fG7hJ5kL0xC");
        assert!(matches!(
            other.verify_at(&token, noon()),
            Err(AuthError::Invalid)
        ));
    }

    #[test]
    fn test_rejects_tampered_claims() {
        let tokens = authority("k3Jf9sLw0qPzX7vB2nM5tR8yC1dG4hA6");
        let token = tokens.issue_at(PublicId::generate(), noon()).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();

        let forged = serde_json::to_vec(&Claims {
            public_id: PublicId::generate(),
            exp: i64::MAX,
        })
        .unwrap();
        let forged = URL_SAFE_NO_PAD.encode(forged);
        parts[1] = &forged;

        assert!(tokens.verify_at(&parts.join("."), noon()).is_err());
    }

    #[test]
    fn test_rejects_unsigned_algorithm() {
        let tokens = authority("k3Jf9sLw0qPzX7vB2nM5tR8yC1dG4hA6");
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&Claims {
                public_id: PublicId::generate(),
                exp: i64::MAX,
            })
            .unwrap(),
        );
        let token = format!("{header}.{claims}.");
        assert!(tokens.verify_at(&token, noon()).is_err());
    }

    #[test]
    fn test_rejects_malformed() {
        let tokens = authority("k3Jf9sLw0qPzX7vB2nM5tR8yC1dG4hA6");
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.**"] {
            assert!(
                tokens.verify_at(token, noon()).is_err(),
                "expected {token:?} to be rejected"
            );
        }
    }
}
