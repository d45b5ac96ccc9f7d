//! HTTP identity mirror.
//!
//! Writes the member's role for a tenant into the provider's user metadata
//! with `PUT {base_url}/users/{subject}/metadata/tenant-roles/{tenant_id}`,
//! authenticated with a service token.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;

use crate::domain::foundation::{DomainError, ErrorCode, TenantId};
use crate::domain::tenancy::Role;
use crate::ports::IdentityProviderMirror;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct IdentityMirrorConfig {
    base_url: String,
    service_token: SecretString,
    timeout: Duration,
}

impl IdentityMirrorConfig {
    pub fn new(base_url: impl Into<String>, service_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_token: SecretString::new(service_token.into()),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for IdentityMirrorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityMirrorConfig")
            .field("base_url", &self.base_url)
            .field("service_token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoleMetadata<'a> {
    tenant_id: TenantId,
    role: &'a str,
}

pub struct HttpIdentityMirror {
    config: IdentityMirrorConfig,
    http_client: reqwest::Client,
}

impl HttpIdentityMirror {
    pub fn new(config: IdentityMirrorConfig) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::new(ErrorCode::ExternalServiceError, e.to_string()))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, auth_subject: &str, tenant_id: TenantId) -> String {
        format!(
            "{}/users/{}/metadata/tenant-roles/{}",
            self.config.base_url, auth_subject, tenant_id
        )
    }
}

#[async_trait]
impl IdentityProviderMirror for HttpIdentityMirror {
    async fn sync_role(
        &self,
        auth_subject: &str,
        tenant_id: TenantId,
        role: Role,
    ) -> Result<(), DomainError> {
        let response = self
            .http_client
            .put(self.url(auth_subject, tenant_id))
            .bearer_auth(self.config.service_token.expose_secret())
            .json(&RoleMetadata {
                tenant_id,
                role: role.as_str(),
            })
            .send()
            .await
            .map_err(|e| DomainError::new(ErrorCode::ExternalServiceError, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::new(
                ErrorCode::ExternalServiceError,
                format!("identity provider returned {}: {}", status, body),
            ));
        }
        Ok(())
    }
}
