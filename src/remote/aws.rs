//! AWS default-chain identity provider.
//!
//! The SDK is async; the facade is not. Each call loads the shared config
//! fresh and drives the SDK future on a private current-thread runtime.

use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_sts::error::DisplayErrorContext;
use tokio::runtime::Runtime;
use tracing::debug;

use crate::error::{FacadeError, Result};
use crate::remote::{CallerIdentity, FrozenCredentials, IdentityProvider};

#[derive(Debug, Default)]
pub struct AwsIdentityProvider {
    profile: Option<String>,
}

impl AwsIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a named profile instead of the default chain's choice.
    pub fn with_profile(profile: impl Into<String>) -> Self {
        Self {
            profile: Some(profile.into()),
        }
    }

    fn runtime() -> Result<Runtime> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| {
                FacadeError::Credential(format!("failed to start AWS SDK runtime: {err}"))
            })
    }

    fn load(&self, runtime: &Runtime) -> SdkConfig {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(profile) = self.profile.as_deref() {
            loader = loader.profile_name(profile);
        }
        runtime.block_on(loader.load())
    }
}

impl IdentityProvider for AwsIdentityProvider {
    fn caller_identity(&self) -> Result<CallerIdentity> {
        let runtime = Self::runtime()?;
        let sdk_config = self.load(&runtime);
        let client = aws_sdk_sts::Client::new(&sdk_config);
        let output = runtime
            .block_on(client.get_caller_identity().send())
            .map_err(|err| {
                FacadeError::Credential(format!(
                    "STS GetCallerIdentity failed: {}",
                    DisplayErrorContext(&err)
                ))
            })?;
        debug!(arn = ?output.arn(), "resolved AWS caller identity");
        Ok(CallerIdentity {
            account: output.account().map(str::to_string),
            arn: output.arn().map(str::to_string),
            user_id: output.user_id().map(str::to_string),
        })
    }

    fn frozen_credentials(&self) -> Result<FrozenCredentials> {
        let runtime = Self::runtime()?;
        let sdk_config = self.load(&runtime);
        let provider = sdk_config.credentials_provider().ok_or_else(|| {
            FacadeError::Credential("no AWS credentials provider configured".to_string())
        })?;
        let credentials = runtime
            .block_on(provider.provide_credentials())
            .map_err(|err| {
                FacadeError::Credential(format!(
                    "failed to fetch AWS credentials: {}",
                    DisplayErrorContext(&err)
                ))
            })?;
        Ok(FrozenCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().map(str::to_string),
        })
    }

    fn region(&self) -> Result<String> {
        let runtime = Self::runtime()?;
        let sdk_config = self.load(&runtime);
        sdk_config
            .region()
            .map(|region| region.to_string())
            .ok_or_else(|| FacadeError::Credential("no AWS region configured".to_string()))
    }
}
