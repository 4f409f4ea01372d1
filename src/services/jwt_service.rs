use crate::config::{self, JWT_ISSUER, JWT_SIGN_KEY, JWT_VALIDATE_KEY};
use crate::models::{Claims, TokenError, TokenPair};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(168 * 60 * 60);

/// HMAC signing methods. Tokens signed with anything else are refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigningAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl SigningAlgorithm {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "HS256" => Some(SigningAlgorithm::HS256),
            "HS384" => Some(SigningAlgorithm::HS384),
            "HS512" => Some(SigningAlgorithm::HS512),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SigningAlgorithm::HS256 => "HS256",
            SigningAlgorithm::HS384 => "HS384",
            SigningAlgorithm::HS512 => "HS512",
        }
    }

    fn from_jwt(algorithm: Algorithm) -> Option<Self> {
        match algorithm {
            Algorithm::HS256 => Some(SigningAlgorithm::HS256),
            Algorithm::HS384 => Some(SigningAlgorithm::HS384),
            Algorithm::HS512 => Some(SigningAlgorithm::HS512),
            _ => None,
        }
    }

    fn jwt(&self) -> Algorithm {
        match self {
            SigningAlgorithm::HS256 => Algorithm::HS256,
            SigningAlgorithm::HS384 => Algorithm::HS384,
            SigningAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    sign_key: Vec<u8>,
    issuer: Option<String>,
    token_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("token_ttl", &self.token_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(sign_key: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        let sign_key = sign_key.as_ref();
        if sign_key.is_empty() {
            return Err(TokenError::SignKeyNotSet);
        }
        Ok(TokenIssuer {
            sign_key: sign_key.to_vec(),
            issuer: None,
            token_ttl: DEFAULT_TOKEN_TTL,
            refresh_ttl: DEFAULT_REFRESH_TOKEN_TTL,
        })
    }

    /// Reads `JWT_SIGN_KEY` and `JWT_ISSUER`.
    pub fn from_env() -> Result<Self, TokenError> {
        let sign_key = config::env_non_empty(JWT_SIGN_KEY).ok_or(TokenError::SignKeyNotSet)?;
        let issuer = Self::new(sign_key)?;
        Ok(match config::env_non_empty(JWT_ISSUER) {
            Some(name) => issuer.with_issuer(name),
            None => issuer,
        })
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_ttls(mut self, token_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.token_ttl = token_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    /// Signs an access token and a refresh token for the given claims. Both
    /// carry the configured issuer and a fresh `iat`; they differ in `exp`.
    pub fn issue_pair(
        &self,
        claims: &Claims,
        algorithm: SigningAlgorithm,
    ) -> Result<TokenPair, TokenError> {
        let mut claims = claims.clone();
        claims.iss = self.issuer.clone();

        let now = unix_now();
        claims.iat = Some(now);
        claims.exp = Some(now.saturating_add(self.token_ttl.as_secs()));
        let token = self.sign(&claims, algorithm)?;

        claims.exp = Some(now.saturating_add(self.refresh_ttl.as_secs()));
        let refresh = self.sign(&claims, algorithm)?;

        Ok(TokenPair { token, refresh })
    }

    /// Signs an HS256 pair whose only claim is `exp`.
    pub fn generate_tokens(
        &self,
        token_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<TokenPair, TokenError> {
        let now = unix_now();
        let token = self.sign(
            &Claims {
                exp: Some(now.saturating_add(token_ttl.as_secs())),
                ..Claims::new()
            },
            SigningAlgorithm::HS256,
        )?;
        let refresh = self.sign(
            &Claims {
                exp: Some(now.saturating_add(refresh_ttl.as_secs())),
                ..Claims::new()
            },
            SigningAlgorithm::HS256,
        )?;
        Ok(TokenPair { token, refresh })
    }

    pub fn sign(&self, claims: &Claims, algorithm: SigningAlgorithm) -> Result<String, TokenError> {
        let header = Header::new(algorithm.jwt());
        let key = EncodingKey::from_secret(&self.sign_key);
        Ok(jsonwebtoken::encode(&header, claims, &key)?)
    }
}

#[derive(Clone)]
pub struct TokenValidator {
    validate_key: Vec<u8>,
}

impl fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenValidator").finish_non_exhaustive()
    }
}

impl TokenValidator {
    pub fn new(validate_key: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        let validate_key = validate_key.as_ref();
        if validate_key.is_empty() {
            return Err(TokenError::ValidateKeyNotSet);
        }
        Ok(TokenValidator {
            validate_key: validate_key.to_vec(),
        })
    }

    /// Reads `JWT_VALIDATE_KEY`.
    pub fn from_env() -> Result<Self, TokenError> {
        let key = config::env_non_empty(JWT_VALIDATE_KEY).ok_or(TokenError::ValidateKeyNotSet)?;
        Self::new(key)
    }

    /// Verifies the signature and the time claims of `token` and returns its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let header = jsonwebtoken::decode_header(token)?;
        let algorithm = SigningAlgorithm::from_jwt(header.alg)
            .ok_or_else(|| TokenError::UnsupportedSigningMethod(format!("{:?}", header.alg)))?;

        // exp and nbf are checked when present, without leeway; aud is not checked
        let mut validation = Validation::new(algorithm.jwt());
        validation.required_spec_claims = HashSet::new();
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.validate_aud = false;

        let key = DecodingKey::from_secret(&self.validate_key);
        Ok(jsonwebtoken::decode::<Claims>(token, &key, &validation)?.claims)
    }
}

/// Validates `token` with a validator built from the environment at call time.
pub fn validate_token(token: &str) -> Result<Claims, TokenError> {
    TokenValidator::from_env()?.validate(token)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
