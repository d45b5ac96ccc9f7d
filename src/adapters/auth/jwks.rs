//! OIDC session validator backed by the provider's JWKS.
//!
//! 1. Decode the header for its `kid`
//! 2. Fetch (or reuse cached) JWKS from `{issuer}/.well-known/jwks.json`
//! 3. Verify signature, issuer, audience and expiry
//! 4. Map claims to [`AuthenticatedUser`]
//!
//! Keys are fetched lazily on first use. An unknown `kid` forces one refetch
//! so a key rotation does not lock everyone out until the cache expires.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::{JwkSet, KeyAlgorithm};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use tokio::sync::RwLock;

use crate::domain::foundation::{AuthError, AuthenticatedUser};
use crate::ports::SessionValidator;

use super::claims::{map_jwt_error, Claims};

const DEFAULT_JWKS_CACHE: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct OidcConfig {
    pub issuer_url: String,
    pub audience: String,
    pub jwks_cache_duration: Duration,
}

impl OidcConfig {
    pub fn new(issuer_url: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer_url: issuer_url.into(),
            audience: audience.into(),
            jwks_cache_duration: DEFAULT_JWKS_CACHE,
        }
    }

    pub fn with_cache_duration(mut self, duration: Duration) -> Self {
        self.jwks_cache_duration = duration;
        self
    }

    fn jwks_url(&self) -> String {
        format!("{}/.well-known/jwks.json", self.issuer_url.trim_end_matches('/'))
    }
}

struct JwksCache {
    jwks: JwkSet,
    fetched_at: Instant,
}

pub struct JwksSessionValidator {
    config: OidcConfig,
    http_client: reqwest::Client,
    cache: Arc<RwLock<Option<JwksCache>>>,
}

impl JwksSessionValidator {
    pub fn new(config: OidcConfig) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::service_unavailable(e.to_string()))?;
        Ok(Self {
            config,
            http_client,
            cache: Arc::new(RwLock::new(None)),
        })
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let url = self.config.jwks_url();
        tracing::debug!(%url, "Fetching JWKS");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch JWKS");
            AuthError::service_unavailable(format!("failed to fetch JWKS: {}", e))
        })?;
        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(%status, "JWKS endpoint returned an error");
            return Err(AuthError::service_unavailable(format!(
                "JWKS endpoint returned {}",
                status
            )));
        }
        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| AuthError::service_unavailable(format!("failed to parse JWKS: {}", e)))?;

        let mut cache = self.cache.write().await;
        *cache = Some(JwksCache {
            jwks: jwks.clone(),
            fetched_at: Instant::now(),
        });
        Ok(jwks)
    }

    async fn cached_jwks(&self) -> Option<JwkSet> {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.config.jwks_cache_duration)
            .map(|c| c.jwks.clone())
    }

    async fn decoding_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AuthError> {
        let jwks = match self.cached_jwks().await {
            Some(jwks) if jwks.find(kid).is_some() => jwks,
            _ => self.fetch_jwks().await?,
        };
        let jwk = jwks.find(kid).ok_or_else(|| {
            tracing::debug!(%kid, "No JWKS key for kid");
            AuthError::InvalidToken
        })?;
        let algorithm = match jwk.common.key_algorithm {
            Some(KeyAlgorithm::RS256) | None => Algorithm::RS256,
            Some(KeyAlgorithm::RS384) => Algorithm::RS384,
            Some(KeyAlgorithm::RS512) => Algorithm::RS512,
            Some(KeyAlgorithm::ES256) => Algorithm::ES256,
            Some(KeyAlgorithm::ES384) => Algorithm::ES384,
            Some(other) => {
                tracing::debug!(algorithm = ?other, "Unsupported JWKS algorithm");
                return Err(AuthError::InvalidToken);
            }
        };
        let key = DecodingKey::from_jwk(jwk).map_err(|e| {
            tracing::debug!(error = %e, "Unusable JWKS key");
            AuthError::InvalidToken
        })?;
        Ok((key, algorithm))
    }
}

#[async_trait]
impl SessionValidator for JwksSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
        let kid = header.kid.ok_or(AuthError::InvalidToken)?;
        let (key, algorithm) = self.decoding_key(&kid).await?;

        let mut validation = Validation::new(algorithm);
        validation.set_issuer(&[&self.config.issuer_url]);
        validation.set_audience(&[&self.config.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let claims = decode::<Claims>(token, &key, &validation)
            .map_err(map_jwt_error)?
            .claims;
        if !claims.aud.contains(&self.config.audience) {
            return Err(AuthError::InvalidToken);
        }
        claims.into_user()
    }
}

impl std::fmt::Debug for JwksSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwksSessionValidator")
            .field("issuer_url", &self.config.issuer_url)
            .field("audience", &self.config.audience)
            .finish_non_exhaustive()
    }
}
