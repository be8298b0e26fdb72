//! Log subscriber setup. Logs go to stderr; stdout carries the JSON event stream.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn init(level: Level) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
}
