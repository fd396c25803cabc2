//! Logging setup for hosts embedding the ledger.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter directives.
pub const LOG_ENV: &str = "LOYALTY_LOG";

/// Initialize tracing with the `LOYALTY_LOG` environment variable.
///
/// Defaults to "info" level if `LOYALTY_LOG` is not set. Does nothing if a global subscriber
/// is already installed.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
