//! Tracing setup.
//!
//! The facade never installs a global subscriber on its own. It logs through
//! the [`Dispatch`] it was built with, so applications either call
//! [`init_tracing`] once at startup or hand a dispatcher to the builder.

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

use crate::config::FacadeConfig;

const DEFAULT_FILTER: &str = "info";

/// Build a fmt dispatcher honouring `RUST_LOG` and the configured log format.
pub fn dispatch_for(config: &FacadeConfig) -> Dispatch {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if config.log_format == "json" {
        Dispatch::new(
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_target(false)
                .with_file(true)
                .with_line_number(true)
                .finish(),
        )
    } else {
        Dispatch::new(
            tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter)
                .with_target(false)
                .with_file(true)
                .with_line_number(true)
                .finish(),
        )
    }
}

/// Install [`dispatch_for`] as the process-wide default.
pub fn init_tracing(config: &FacadeConfig) -> anyhow::Result<()> {
    tracing::dispatcher::set_global_default(dispatch_for(config))
        .map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
