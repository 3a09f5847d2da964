//! Logging and latency profiling for the admin CLI.
//!
//! The business crate logs through the `log` facade. The subscriber installed
//! here bridges those records into `tracing`, so `RUST_LOG` controls both.
//!
//! With `--timing`, spans of functions annotated with `#[instrument]` log their
//! duration when they close:
//! ```ignore
//! #[tracing::instrument(skip_all)]
//! async fn run_status() {
//!     // ...
//! }
//! ```

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Level used when `RUST_LOG` does not say otherwise.
///
/// Span close events are logged at INFO, so `timing` needs at least INFO.
fn default_level(verbose: bool, timing: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else if timing {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

/// Initialize tracing subscriber with optional timing output.
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing(verbose: bool, timing: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbose, timing).into())
        .from_env_lossy();

    let span_events = if timing {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_level(true)
                .with_span_events(span_events)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
