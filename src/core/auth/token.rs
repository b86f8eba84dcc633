//! HS256 bearer tokens
//!
//! Tokens are compact JWTs: `base64url(header).base64url(claims).base64url(mac)`
//! with an HMAC-SHA256 signature over the first two segments.

use crate::config::schema::AuthConfig;
use crate::config::SecretString;
use crate::domain::{ClinicError, Identity, Result, Role};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Claims carried by a bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Identity id
    pub uid: i64,
    pub role: Role,
    /// Issued-at, seconds since the epoch
    pub iat: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    pub iss: String,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Signs and verifies bearer tokens with the configured secret
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
    ttl: Duration,
    issuer: String,
}

impl TokenSigner {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            ttl: Duration::minutes(config.token_ttl_minutes),
            issuer: config.issuer.clone(),
        }
    }

    /// Issues a token for `identity`, valid from now
    pub fn issue(&self, identity: &Identity) -> Result<IssuedToken> {
        self.issue_at(identity, Utc::now())
    }

    pub(crate) fn issue_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken> {
        let claims = Claims {
            sub: identity.username.clone(),
            uid: identity.id.value(),
            role: identity.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            iss: self.issuer.clone(),
        };
        let header = Header {
            alg: ALGORITHM.to_string(),
            typ: "JWT".to_string(),
        };

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?)
        );
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&signing_input)?.finalize().into_bytes());

        Ok(IssuedToken {
            token: format!("{signing_input}.{signature}"),
            claims,
        })
    }

    /// Verifies structure, algorithm, signature, issuer and expiry
    ///
    /// # Errors
    ///
    /// `ClinicError::Unauthorized` for any token that fails a check
    pub fn verify(&self, token: &str) -> Result<Claims> {
        self.verify_at(token, Utc::now())
    }

    pub(crate) fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(rejected("Malformed token"));
        };

        let header: Header = decode_segment(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(rejected("Unsupported token algorithm"));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| rejected("Malformed token signature"))?;
        self.mac(&format!("{header_b64}.{claims_b64}"))?
            .verify_slice(&signature)
            .map_err(|_| rejected("Invalid token signature"))?;

        let claims: Claims = decode_segment(claims_b64)?;
        if claims.iss != self.issuer {
            return Err(rejected("Token issuer mismatch"));
        }
        if claims.exp <= now.timestamp() {
            return Err(rejected("Token has expired"));
        }
        Ok(claims)
    }

    fn mac(&self, signing_input: &str) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| ClinicError::Internal(format!("Failed to create HMAC: {e}")))?;
        mac.update(signing_input.as_bytes());
        Ok(mac)
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| rejected("Malformed token encoding"))?;
    serde_json::from_slice(&bytes).map_err(|_| rejected("Malformed token payload"))
}

fn rejected(reason: &str) -> ClinicError {
    crate::log_token_rejected!(reason);
    ClinicError::Unauthorized(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::domain::UserId;

    fn signer(secret: &str) -> TokenSigner {
        TokenSigner::new(&AuthConfig {
            jwt_secret: secret_string(secret.to_string()),
            token_ttl_minutes: 60,
            bcrypt_cost: 4,
            issuer: "clinic".to_string(),
        })
    }

    fn alice() -> Identity {
        let now = Utc::now();
        Identity {
            id: UserId::new(1).unwrap(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: String::new(),
            first_name: "Alice".to_string(),
            last_name: "Doe".to_string(),
            phone: None,
            role: Role::Patient,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_then_verify() {
        let signer = signer("test-secret");
        let issued = signer.issue(&alice()).unwrap();
        assert_eq!(issued.token.split('.').count(), 3);

        let claims = signer.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.uid, 1);
        assert_eq!(claims.role, Role::Patient);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_rejects_other_secret() {
        let issued = signer("secret-a").issue(&alice()).unwrap();
        let err = signer("secret-b").verify(&issued.token).unwrap_err();
        assert!(matches!(err, ClinicError::Unauthorized(_)));
    }

    #[test]
    fn test_rejects_expired() {
        let signer = signer("test-secret");
        let issued = signer
            .issue_at(&alice(), Utc::now() - Duration::hours(2))
            .unwrap();
        let err = signer.verify(&issued.token).unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Token has expired");
    }

    #[test]
    fn test_rejects_tampered_claims() {
        let signer = signer("test-secret");
        let issued = signer.issue(&alice()).unwrap();
        let parts: Vec<&str> = issued.token.split('.').collect();

        let mut claims = issued.claims.clone();
        claims.role = Role::Admin;
        let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let token = format!("{}.{}.{}", parts[0], forged, parts[2]);

        assert!(signer.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_malformed() {
        let signer = signer("test-secret");
        for token in ["", "abc", "a.b", "a.b.c.d", "!!.??.**"] {
            assert!(
                matches!(signer.verify(token), Err(ClinicError::Unauthorized(_))),
                "accepted {token:?}"
            );
        }
    }

    #[test]
    fn test_rejects_none_algorithm() {
        let signer = signer("test-secret");
        let issued = signer.issue(&alice()).unwrap();
        let parts: Vec<&str> = issued.token.split('.').collect();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let token = format!("{header}.{}.{}", parts[1], parts[2]);
        assert_eq!(
            signer.verify(&token).unwrap_err().to_string(),
            "Unauthorized: Unsupported token algorithm"
        );
    }
}
