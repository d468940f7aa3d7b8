use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

const DEFAULT_FILTER: &str = "info,tower_http=debug";
const SERVICE_LABEL: &str = "newslens";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Log filter plus an optional Loki push endpoint
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: String,
    /// Shipping to Loki is on whenever this is set.
    pub loki_url: Option<Url>,
}

impl LoggingConfig {
    /// Reads `RUST_LOG` and `LOKI_URL`. A malformed `LOKI_URL` is a startup error.
    pub fn from_env() -> Result<Self, url::ParseError> {
        Self::from_values(
            std::env::var("RUST_LOG").ok(),
            std::env::var("LOKI_URL").ok(),
        )
    }

    fn from_values(filter: Option<String>, loki_url: Option<String>) -> Result<Self, url::ParseError> {
        let loki_url = match loki_url.filter(|u| !u.trim().is_empty()) {
            Some(raw) => Some(Url::parse(raw.trim())?),
            None => None,
        };

        Ok(Self {
            filter: filter
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FILTER.to_string()),
            loki_url,
        })
    }
}

/// Install the global subscriber. Must run inside the tokio runtime when Loki is on.
pub fn init_logging(config: LoggingConfig) -> Result<(), BoxError> {
    let filter = EnvFilter::try_new(&config.filter)?;
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    match config.loki_url {
        #[cfg(feature = "loki")]
        Some(url) => {
            let (loki_layer, task) = tracing_loki::builder()
                .label("service", SERVICE_LABEL)?
                .build_url(url.clone())?;
            tokio::spawn(task);

            registry.with(loki_layer).try_init()?;
            tracing::info!("Logging to console and Loki at {}", url);
        }
        #[cfg(not(feature = "loki"))]
        Some(url) => {
            registry.try_init()?;
            tracing::warn!(
                "LOKI_URL={} ignored: built without the `loki` feature ({} logs stay on the console)",
                url,
                SERVICE_LABEL
            );
        }
        None => {
            registry.try_init()?;
            tracing::info!("Logging to console");
        }
    }

    Ok(())
}
