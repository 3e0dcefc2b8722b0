//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the rewind tracing/logging system.
///
/// Reads the `REWIND_LOG` environment variable for per-module log levels.
/// Format: `REWIND_LOG=rewind_engine=debug,rewind_storage=warn`
///
/// Falls back to `rewind=info` if `REWIND_LOG` is not set or is invalid.
/// Calling this more than once is a no-op.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("REWIND_LOG")
            .unwrap_or_else(|_| EnvFilter::new("rewind=info"));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init();
    });
}
