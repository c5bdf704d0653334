//! Remote object storage support.
//!
//! Enabling remote storage verifies the caller's cloud identity, fetches a
//! temporary credential set, loads the extensions DuckDB needs for `s3://`
//! paths and injects the credentials as session settings. Nothing is cached:
//! every call fetches fresh credentials and overwrites the previous ones.

#[cfg(feature = "aws")]
mod aws;

#[cfg(feature = "aws")]
pub use aws::AwsIdentityProvider;

use std::fmt;

use tracing::{error, info, instrument};

use crate::engine::EngineConnection;
use crate::error::{FacadeError, Result};
use crate::sql;

/// Who the identity service says the caller is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: Option<String>,
    pub arn: Option<String>,
    pub user_id: Option<String>,
}

/// Point-in-time view of the caller's credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct FrozenCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for FrozenCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrozenCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .finish()
    }
}

/// Source of temporary cloud credentials.
pub trait IdentityProvider {
    /// Fails when the caller has no usable identity.
    fn caller_identity(&self) -> Result<CallerIdentity>;
    fn frozen_credentials(&self) -> Result<FrozenCredentials>;
    fn region(&self) -> Result<String>;
}

/// Credentials injected into the DuckDB session.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSet {
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Empty when the credentials are long-lived keys.
    pub session_token: String,
    pub region: String,
}

impl CredentialSet {
    pub fn fetch(provider: &dyn IdentityProvider) -> Result<Self> {
        let frozen = provider.frozen_credentials()?;
        let region = provider.region()?;
        Ok(Self {
            access_key_id: frozen.access_key_id,
            secret_access_key: frozen.secret_access_key,
            session_token: frozen.session_token.unwrap_or_default(),
            region,
        })
    }

    /// DuckDB session setting for each field.
    pub fn session_settings(&self) -> [(&'static str, &str); 4] {
        [
            ("s3_access_key_id", self.access_key_id.as_str()),
            ("s3_secret_access_key", self.secret_access_key.as_str()),
            ("s3_session_token", self.session_token.as_str()),
            ("s3_region", self.region.as_str()),
        ]
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("region", &self.region)
            .finish()
    }
}

/// Fixed credentials, e.g. for an S3-compatible store on localhost.
#[derive(Debug, Clone)]
pub struct StaticIdentityProvider {
    credentials: FrozenCredentials,
    region: String,
}

impl StaticIdentityProvider {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            credentials: FrozenCredentials {
                access_key_id: access_key_id.into(),
                secret_access_key: secret_access_key.into(),
                session_token,
            },
            region: region.into(),
        }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn caller_identity(&self) -> Result<CallerIdentity> {
        if self.credentials.access_key_id.is_empty()
            || self.credentials.secret_access_key.is_empty()
        {
            return Err(FacadeError::Credential(
                "static credentials are missing an access key or secret".to_string(),
            ));
        }
        Ok(CallerIdentity {
            user_id: Some(self.credentials.access_key_id.clone()),
            ..CallerIdentity::default()
        })
    }

    fn frozen_credentials(&self) -> Result<FrozenCredentials> {
        Ok(self.credentials.clone())
    }

    fn region(&self) -> Result<String> {
        Ok(self.region.clone())
    }
}

/// Placeholder used when no identity provider is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentityProvider;

impl IdentityProvider for NoIdentityProvider {
    fn caller_identity(&self) -> Result<CallerIdentity> {
        Err(FacadeError::Credential(
            "no identity provider configured".to_string(),
        ))
    }

    fn frozen_credentials(&self) -> Result<FrozenCredentials> {
        Err(FacadeError::Credential(
            "no identity provider configured".to_string(),
        ))
    }

    fn region(&self) -> Result<String> {
        Err(FacadeError::Credential(
            "no identity provider configured".to_string(),
        ))
    }
}

/// Identity provider used when the builder is not given one.
pub fn default_identity_provider() -> Box<dyn IdentityProvider> {
    #[cfg(feature = "aws")]
    {
        Box::new(AwsIdentityProvider::new())
    }
    #[cfg(not(feature = "aws"))]
    {
        Box::new(NoIdentityProvider)
    }
}

/// Where session statements run.
pub(crate) trait SessionStatements {
    fn run(&self, sql: &str) -> Result<()>;
}

impl SessionStatements for EngineConnection {
    fn run(&self, sql: &str) -> Result<()> {
        self.execute_batch(sql)
    }
}

/// Verify identity, fetch credentials, load extensions, inject settings.
///
/// Identity and credential lookups finish before the first statement runs,
/// so a failing provider leaves the session untouched.
#[instrument(skip_all, fields(extensions = ?extensions))]
pub(crate) fn enable_remote_storage(
    session: &dyn SessionStatements,
    provider: &dyn IdentityProvider,
    extensions: &[String],
) -> Result<()> {
    let identity = provider.caller_identity().map_err(|err| {
        error!(error = %err, "caller identity check failed");
        err
    })?;
    info!(account = ?identity.account, arn = ?identity.arn, "verified caller identity");

    let credentials = CredentialSet::fetch(provider).map_err(|err| {
        error!(error = %err, "failed to fetch temporary credentials");
        err
    })?;

    for ext in extensions {
        session.run(&sql::install_and_load(ext))?;
    }
    info!("required extensions installed and loaded");

    for (key, value) in credentials.session_settings() {
        session.run(&sql::set_option(key, value))?;
    }
    info!(region = %credentials.region, "S3 credentials set in DuckDB");
    Ok(())
}
