//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter, e.g. `CO2_LOG=co2_outlook=debug`.
pub const LOG_ENV: &str = "CO2_LOG";

const DEFAULT_FILTER: &str = "co2_outlook=warn";

static INIT: Once = Once::new();

/// Install the global subscriber, writing to stderr so stdout stays clean for
/// reports and plots.
///
/// Falls back to `co2_outlook=warn` if `CO2_LOG` is unset or invalid.
/// Idempotent. The TUI never calls this: log lines would corrupt the
/// alternate screen.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .without_time(),
            )
            .with(filter)
            .try_init();
    });
}
