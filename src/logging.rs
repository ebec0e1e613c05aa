use std::io::stderr;

use tracing::Level;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer};

/// Install a stderr subscriber. `RUST_LOG` wins over `verbosity`
/// (0 = info, 1 = debug, 2+ = trace).
pub fn init(verbosity: u8) -> Result<(), TryInitError> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
    let console_layer = fmt::layer().without_time().with_writer(stderr).with_filter(filter);
    tracing_subscriber::registry().with(console_layer).try_init()
}
