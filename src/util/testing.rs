//! Shared test setup: one global tracing subscriber for all tests.

use std::sync::Once;

use tracing::debug;
use tracing_subscriber::{filter::filter_fn, fmt, prelude::*, EnvFilter};

static TEST_SETUP: Once = Once::new();

/// Modules whose logs drown out the crate's own output.
const NOISY_MODULES: [&str; 5] = ["hyper", "reqwest", "rustls", "skim", "tuikit"];

/// Install the test subscriber once per process.
///
/// `RUST_LOG` wins when set; otherwise the crate logs at debug.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if tracing::dispatcher::has_been_set() {
            return;
        }
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quizmap=debug"));
        let module_filter = filter_fn(|metadata| {
            !NOISY_MODULES
                .iter()
                .any(|name| metadata.target().starts_with(name))
        });

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_test_writer()
                .with_target(true)
                .compact()
                .with_filter(module_filter)
                .with_filter(env_filter),
        );
        if let Err(e) = subscriber.try_init() {
            eprintln!("test logging unavailable: {e}");
        }
        debug!("test subscriber installed");
    });
}
