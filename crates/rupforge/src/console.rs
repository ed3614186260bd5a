//! Console logging for filter evaluation.
//!
//! Installs a `tracing` subscriber printing structured filter events.
//! `RUST_LOG` overrides the default `rupforge=info` directive; use
//! `rupforge_filters=debug` to see per-jump values during exhaustive
//! evaluation.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

const DEFAULT_DIRECTIVES: &str = "rupforge=info";

/// Initializes console output.
///
/// Safe to call multiple times - only the first call has effect. Does
/// nothing when another global subscriber is already installed.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).compact())
            .try_init();
    });
}
