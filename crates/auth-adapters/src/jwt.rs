//! # JWT identity provider
//!
//! Verifies HS256 bearer tokens and maps their claims to a
//! [`VerifiedIdentity`]. Deleting an account revokes every token issued for
//! that uid up to the moment of deletion; tokens issued afterwards verify
//! again, so a deleted identity can register anew.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dashmap::DashMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use domains::{AppError, IdentityProvider, Result, UserId, VerifiedIdentity};

pub const MIN_SECRET_LEN: usize = 32;

/// Token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The uid.
    pub sub: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    /// When the provider-side account was created (Unix seconds). Falls back
    /// to `iat`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: SecretString,
    pub issuer: String,
    pub audience: String,
    pub leeway_secs: u64,
    pub token_ttl_secs: i64,
}

#[derive(Debug, Error)]
pub enum JwtSetupError {
    #[error("jwt secret must be at least {MIN_SECRET_LEN} bytes")]
    SecretTooShort,
}

pub struct JwtIdentityProvider {
    settings: JwtSettings,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    /// uid -> revocation time in Unix seconds. In-memory only; entries are
    /// dropped once every token they could reject has expired.
    revoked: DashMap<UserId, i64>,
}

impl JwtIdentityProvider {
    pub fn new(settings: JwtSettings) -> std::result::Result<Self, JwtSetupError> {
        let secret = settings.secret.expose_secret().as_bytes();
        if secret.len() < MIN_SECRET_LEN {
            return Err(JwtSetupError::SecretTooShort);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.leeway = settings.leeway_secs;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            revoked: DashMap::new(),
            settings,
        })
    }

    /// Signs a token for the given profile. Used by development tooling and
    /// tests; production tokens come from the external provider.
    pub fn issue_token(&self, uid: &UserId, name: &str, email: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: uid.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            iss: self.settings.issuer.clone(),
            aud: self.settings.audience.clone(),
            iat: now,
            exp: now + self.settings.token_ttl_secs,
            created_at: None,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
    }

    fn revoke(&self, uid: &UserId, now: i64) {
        let horizon = now - self.settings.token_ttl_secs - self.settings.leeway_secs as i64;
        self.revoked.retain(|_, revoked_at| *revoked_at >= horizon);
        self.revoked.insert(uid.clone(), now);
    }

    fn is_revoked(&self, claims: &Claims) -> bool {
        self.revoked
            .get(&UserId::new(claims.sub.as_str()))
            .is_some_and(|revoked_at| claims.iat <= *revoked_at)
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn verify(&self, credential: &str) -> Result<VerifiedIdentity> {
        let data = decode::<Claims>(credential, &self.decoding, &self.validation).map_err(|err| {
            let reason = match err.kind() {
                ErrorKind::ExpiredSignature => "token expired",
                ErrorKind::InvalidSignature => "invalid signature",
                ErrorKind::InvalidIssuer => "unexpected issuer",
                ErrorKind::InvalidAudience => "unexpected audience",
                ErrorKind::MissingRequiredClaim(_) => "missing claim",
                _ => "invalid token",
            };
            debug!(error = %err, reason, "token rejected");
            AppError::Unauthenticated(reason.to_string())
        })?;

        let claims = data.claims;
        if claims.sub.trim().is_empty() {
            return Err(AppError::Unauthenticated("token has no subject".into()));
        }
        if self.is_revoked(&claims) {
            return Err(AppError::Unauthenticated("token revoked".into()));
        }

        Ok(VerifiedIdentity {
            uid: UserId::new(claims.sub),
            display_name: claims.name,
            email: claims.email,
            created_at: timestamp(claims.created_at.unwrap_or(claims.iat)),
        })
    }

    async fn delete_account(&self, uid: &UserId) -> Result<()> {
        self.revoke(uid, Utc::now().timestamp());
        info!(uid = %uid, "provider account deleted, outstanding tokens revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> JwtSettings {
        JwtSettings {
            secret: SecretString::from("0123456789abcdef0123456789abcdef"),
            issuer: "relief-exchange".into(),
            audience: "relief-exchange-api".into(),
            leeway_secs: 0,
            token_ttl_secs: 3600,
        }
    }

    fn provider() -> JwtIdentityProvider {
        JwtIdentityProvider::new(settings()).unwrap()
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let mut s = settings();
        s.secret = SecretString::from("short");
        assert!(matches!(
            JwtIdentityProvider::new(s),
            Err(JwtSetupError::SecretTooShort)
        ));
    }

    #[tokio::test]
    async fn test_issued_token_verifies() {
        let p = provider();
        let token = p
            .issue_token(&UserId::new("u1"), "Ada", "ada@example.com")
            .unwrap();

        let identity = p.verify(&token).await.unwrap();
        assert_eq!(identity.uid, UserId::new("u1"));
        assert_eq!(identity.display_name, "Ada");
        assert_eq!(identity.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_garbage_is_unauthenticated() {
        let err = provider().verify("not-a-token").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthenticated() {
        let p = provider();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "u1".into(),
            name: String::new(),
            email: String::new(),
            iss: "relief-exchange".into(),
            aud: "relief-exchange-api".into(),
            iat: now - 7200,
            exp: now - 3600,
            created_at: None,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &p.encoding).unwrap();

        let err = p.verify(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(ref m) if m == "token expired"));
    }

    #[tokio::test]
    async fn test_token_from_other_issuer_is_rejected() {
        let mut other = settings();
        other.issuer = "someone-else".into();
        let foreign = JwtIdentityProvider::new(other).unwrap();
        let token = foreign
            .issue_token(&UserId::new("u1"), "", "")
            .unwrap();

        let err = provider().verify(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_deleted_account_tokens_stop_verifying() {
        let p = provider();
        let uid = UserId::new("u1");
        let token = p.issue_token(&uid, "", "").unwrap();

        p.delete_account(&uid).await.unwrap();

        let err = p.verify(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated(ref m) if m == "token revoked"));
    }

    #[tokio::test]
    async fn test_expired_revocations_are_pruned() {
        let p = provider();
        let now = Utc::now().timestamp();
        p.revoked.insert(UserId::new("old"), now - 3601);
        p.revoked.insert(UserId::new("recent"), now - 60);

        p.delete_account(&UserId::new("u1")).await.unwrap();

        assert!(!p.revoked.contains_key(&UserId::new("old")));
        assert!(p.revoked.contains_key(&UserId::new("recent")));
        assert!(p.revoked.contains_key(&UserId::new("u1")));
    }
}
