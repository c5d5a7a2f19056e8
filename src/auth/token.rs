use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{AuthError, Claims};
use crate::config::BearerConfig;

pub const DEFAULT_SCHEME: &str = "Bearer";

/// Claim names the issuer writes itself; custom claims may not reuse them.
pub const RESERVED_CLAIMS: &[&str] = &[
    "sub", "iss", "aud", "iat", "nbf", "exp", "jti", "role", "scope",
];

/// Everything needed to mint one token. Issuer and audiences left empty are
/// filled in from configuration by [`TokenIssuer::issue`].
#[derive(Debug, Clone)]
pub struct TokenDescriptor {
    pub scheme: String,
    pub subject: String,
    pub audiences: Vec<String>,
    pub issuer: Option<String>,
    pub not_before: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub roles: Vec<String>,
    pub scopes: Vec<String>,
    pub claims: Map<String, Value>,
}

impl TokenDescriptor {
    pub fn new(subject: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            scheme: DEFAULT_SCHEME.into(),
            subject: subject.into(),
            audiences: Vec::new(),
            issuer: None,
            not_before: now,
            expires: now + TimeDelta::days(1),
            roles: Vec::new(),
            scopes: Vec::new(),
            claims: Map::new(),
        }
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audiences.push(audience.into());
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    pub fn claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    pub fn valid_for(mut self, lifetime: Duration) -> Self {
        self.not_before = Utc::now();
        self.expires = self.not_before + TimeDelta::seconds(lifetime.as_secs() as i64);
        self
    }

    pub fn valid_between(mut self, not_before: DateTime<Utc>, expires: DateTime<Utc>) -> Self {
        self.not_before = not_before;
        self.expires = expires;
        self
    }
}

pub struct TokenIssuer {
    issuer: String,
    audiences: Vec<String>,
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn from_config(config: &BearerConfig) -> Result<Self, AuthError> {
        let issuer = config.require_issuer()?.to_string();
        let key = config.signing_key_bytes()?;

        Ok(Self {
            issuer,
            audiences: config.audiences.clone(),
            key: EncodingKey::from_secret(&key),
        })
    }

    pub fn issue(&self, descriptor: TokenDescriptor) -> Result<String, AuthError> {
        if let Some(name) = descriptor
            .claims
            .keys()
            .find(|name| RESERVED_CLAIMS.contains(&name.as_str()))
        {
            return Err(AuthError::ReservedClaim(name.clone()));
        }

        let audiences = if descriptor.audiences.is_empty() {
            self.audiences.clone()
        } else {
            descriptor.audiences
        };

        let claims = Claims {
            sub: descriptor.subject,
            iss: descriptor.issuer.unwrap_or_else(|| self.issuer.clone()),
            aud: audiences,
            iat: Utc::now().timestamp(),
            nbf: descriptor.not_before.timestamp(),
            exp: descriptor.expires.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            role: descriptor.roles,
            scope: descriptor.scopes,
            custom: descriptor.claims,
        };

        tracing::debug!(
            sub = %claims.sub,
            roles = ?claims.role,
            scheme = %descriptor.scheme,
            "issuing token"
        );

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.key)?)
    }
}

pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn from_config(config: &BearerConfig) -> Result<Self, AuthError> {
        let issuer = config.require_issuer()?;
        let key = config.signing_key_bytes()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        if config.audiences.is_empty() {
            validation.validate_aud = false;
            validation.set_required_spec_claims(&["exp", "nbf", "sub", "iss"]);
        } else {
            validation.set_audience(config.audiences.as_slice());
            validation.set_required_spec_claims(&["exp", "nbf", "sub", "iss", "aud"]);
        }
        validation.validate_nbf = true;

        Ok(Self {
            key: DecodingKey::from_secret(&key),
            validation,
        })
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(decode::<Claims>(token, &self.key, &self.validation)?.claims)
    }
}

/// A fresh random 256-bit HMAC key, base64 encoded.
pub fn generate_signing_key() -> String {
    let key: [u8; 32] = rand::random();
    STANDARD.encode(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use chrono::Duration as ChronoDuration;
    use jsonwebtoken::errors::ErrorKind;

    fn bearer() -> BearerConfig {
        let mut config = Config::for_testing().bearer;
        config.signing_key = Some(generate_signing_key());
        config
    }

    fn jwt_kind(err: AuthError) -> ErrorKind {
        match err {
            AuthError::Jwt(e) => e.into_kind(),
            other => panic!("expected a jwt error, got {other:?}"),
        }
    }

    #[test]
    fn signing_key_is_256_bits() {
        let key = STANDARD.decode(generate_signing_key()).unwrap();
        assert_eq!(key.len(), 32);
        assert_ne!(generate_signing_key(), generate_signing_key());
    }

    #[test]
    fn issued_token_validates_with_defaults_from_config() {
        let config = bearer();
        let issuer = TokenIssuer::from_config(&config).unwrap();
        let validator = TokenValidator::from_config(&config).unwrap();

        let token = issuer
            .issue(
                TokenDescriptor::new("alice")
                    .role("admin")
                    .scope("todos:write")
                    .claim("tenant", "acme"),
            )
            .unwrap();
        let claims = validator.validate(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iss, "todo-api");
        assert_eq!(claims.aud, vec!["todo-api"]);
        assert!(claims.is_admin());
        assert_eq!(claims.scope, vec!["todos:write"]);
        assert_eq!(claims.custom["tenant"], "acme");

        let lifetime = claims.exp - claims.nbf;
        assert!((86_399..=86_400).contains(&lifetime), "lifetime was {lifetime}");
    }

    #[test]
    fn explicit_audiences_and_lifetime_override_defaults() {
        let mut config = bearer();
        config.audiences.push("http://localhost:3000".into());
        let issuer = TokenIssuer::from_config(&config).unwrap();
        let validator = TokenValidator::from_config(&config).unwrap();

        let token = issuer
            .issue(
                TokenDescriptor::new("carol")
                    .audience("http://localhost:3000")
                    .valid_for(Duration::from_secs(60)),
            )
            .unwrap();
        let claims = validator.validate(&token).unwrap();

        assert_eq!(claims.aud, vec!["http://localhost:3000"]);
        assert_eq!(claims.exp - claims.nbf, 60);
    }

    #[test]
    fn custom_claims_cannot_shadow_registered_ones() {
        let issuer = TokenIssuer::from_config(&bearer()).unwrap();

        for name in RESERVED_CLAIMS {
            let result = issuer.issue(TokenDescriptor::new("alice").claim(*name, "bob"));
            assert!(
                matches!(&result, Err(AuthError::ReservedClaim(claim)) if claim == name),
                "`{name}` was accepted as a custom claim"
            );
        }
    }

    #[test]
    fn missing_signing_key_is_a_config_error() {
        let config = Config::for_testing().bearer;

        assert!(matches!(
            TokenIssuer::from_config(&config),
            Err(AuthError::Config(_))
        ));
        assert!(matches!(
            TokenValidator::from_config(&config),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = bearer();
        let issuer = TokenIssuer::from_config(&config).unwrap();
        let validator = TokenValidator::from_config(&config).unwrap();

        let now = Utc::now();
        let token = issuer
            .issue(
                TokenDescriptor::new("alice").valid_between(
                    now - ChronoDuration::hours(3),
                    now - ChronoDuration::hours(2),
                ),
            )
            .unwrap();

        let err = validator.validate(&token).unwrap_err();
        assert!(matches!(jwt_kind(err), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn not_yet_valid_token_is_rejected() {
        let config = bearer();
        let issuer = TokenIssuer::from_config(&config).unwrap();
        let validator = TokenValidator::from_config(&config).unwrap();

        let now = Utc::now();
        let token = issuer
            .issue(
                TokenDescriptor::new("alice").valid_between(
                    now + ChronoDuration::hours(1),
                    now + ChronoDuration::hours(2),
                ),
            )
            .unwrap();

        let err = validator.validate(&token).unwrap_err();
        assert!(matches!(jwt_kind(err), ErrorKind::ImmatureSignature));
    }

    #[test]
    fn foreign_audience_and_issuer_are_rejected() {
        let config = bearer();
        let issuer = TokenIssuer::from_config(&config).unwrap();
        let validator = TokenValidator::from_config(&config).unwrap();

        let token = issuer
            .issue(TokenDescriptor::new("alice").audience("someone-else"))
            .unwrap();
        assert!(matches!(
            jwt_kind(validator.validate(&token).unwrap_err()),
            ErrorKind::InvalidAudience
        ));

        let token = issuer
            .issue(TokenDescriptor::new("alice").issuer("elsewhere"))
            .unwrap();
        assert!(matches!(
            jwt_kind(validator.validate(&token).unwrap_err()),
            ErrorKind::InvalidIssuer
        ));
    }

    #[test]
    fn token_signed_with_another_key_is_rejected() {
        let config = bearer();
        let mut other = config.clone();
        other.signing_key = Some(generate_signing_key());

        let token = TokenIssuer::from_config(&other)
            .unwrap()
            .issue(TokenDescriptor::new("mallory").role("admin"))
            .unwrap();

        let err = TokenValidator::from_config(&config)
            .unwrap()
            .validate(&token)
            .unwrap_err();
        assert!(matches!(jwt_kind(err), ErrorKind::InvalidSignature));
    }
}
