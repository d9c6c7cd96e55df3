//! Signed session tokens (HS256 JWT).

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};

use super::AuthError;
use crate::models::{CurrentAdmin, SessionClaims};

/// A freshly signed token and its expiry.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: SessionClaims,
}

impl IssuedToken {
    /// When the token stops being accepted.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.claims.expires_at()
    }
}

/// Issues and validates session tokens.
#[derive(Clone)]
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("keys", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl SessionTokens {
    /// Create a token issuer from the signing secret and token lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidLifetime` if `ttl` is zero or too large
    /// to represent.
    pub fn new(secret: &SecretString, ttl: Duration) -> Result<Self, AuthError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| AuthError::InvalidLifetime)?;
        if ttl <= chrono::Duration::zero() {
            return Err(AuthError::InvalidLifetime);
        }

        let key = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
            ttl,
        })
    }

    /// Lifetime of issued tokens.
    #[must_use]
    pub const fn ttl(&self) -> chrono::Duration {
        self.ttl
    }

    /// Sign a new token for the given operator.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if encoding fails.
    pub fn issue(&self, admin: &CurrentAdmin) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: admin.id.clone(),
            email: admin.email.clone(),
            name: admin.name.clone(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken { token, claims })
    }

    /// Validate a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for tampered, expired, or
    /// malformed tokens.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }

    /// Re-issue a token for the identity in `claims` with a fresh expiry.
    ///
    /// The operator id, email, and name carry over unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if encoding fails.
    pub fn refresh(&self, claims: &SessionClaims) -> Result<IssuedToken, AuthError> {
        self.issue(&claims.admin())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use ecom_core::{Email, OperatorId};

    fn tokens(secret: &str) -> SessionTokens {
        SessionTokens::new(&SecretString::from(secret), Duration::from_secs(3600)).unwrap()
    }

    fn admin() -> CurrentAdmin {
        CurrentAdmin {
            id: OperatorId::new("1"),
            name: "Test User".to_string(),
            email: Email::parse("ops@example.com").unwrap(),
        }
    }

    #[test]
    fn test_issue_then_verify_returns_identity() {
        let tokens = tokens("k3Y!q9#Lm2@Zp7$Rt5%Wv8^Xb4&Nc6*Hd1");
        let issued = tokens.issue(&admin()).unwrap();

        let claims = tokens.verify(&issued.token).unwrap();
        assert_eq!(claims.sub.as_str(), "1");
        assert_eq!(claims.email.as_str(), "ops@example.com");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_verify_rejects_other_secret() {
        let issued = tokens("k3Y!q9#Lm2@Zp7$Rt5%Wv8^Xb4&Nc6*Hd1")
            .issue(&admin())
            .unwrap();
        let other = tokens("Qz8!mW3#tR6@yU1$iO4%pA7^sD0&fG2*hJ5");

        assert!(matches!(
            other.verify(&issued.token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let tokens = tokens("k3Y!q9#Lm2@Zp7$Rt5%Wv8^Xb4&Nc6*Hd1");
        assert!(tokens.verify("not.a.token").is_err());
        assert!(tokens.verify("").is_err());
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let tokens = tokens("k3Y!q9#Lm2@Zp7$Rt5%Wv8^Xb4&Nc6*Hd1");
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: OperatorId::new("1"),
            email: Email::parse("ops@example.com").unwrap(),
            name: "Test User".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &tokens.encoding).unwrap();

        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_refresh_keeps_operator_id() {
        let tokens = tokens("k3Y!q9#Lm2@Zp7$Rt5%Wv8^Xb4&Nc6*Hd1");
        let issued = tokens.issue(&admin()).unwrap();

        let refreshed = tokens.refresh(&issued.claims).unwrap();
        let claims = tokens.verify(&refreshed.token).unwrap();

        assert_eq!(claims.sub, issued.claims.sub);
        assert_eq!(claims.email, issued.claims.email);
        assert!(claims.exp >= issued.claims.exp);
    }

    #[test]
    fn test_zero_ttl_is_rejected() {
        let result = SessionTokens::new(
            &SecretString::from("k3Y!q9#Lm2@Zp7$Rt5%Wv8^Xb4&Nc6*Hd1"),
            Duration::ZERO,
        );
        assert!(matches!(result, Err(AuthError::InvalidLifetime)));
    }
}
