use folio_config::LoggingSettings;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "info";

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `logging.filter`, which wins over `info`.
pub fn init_tracing(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(settings.filter.as_deref().unwrap_or(DEFAULT_FILTER))
    })?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if settings.json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };
    result.map_err(|err| anyhow::anyhow!("failed to init tracing: {err}"))
}
