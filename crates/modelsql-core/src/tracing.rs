//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::constants::LOG_ENV_VAR;

/// Install the global fmt subscriber. `MODELSQL_LOG` overrides `config.level`.
///
/// Returns `false` when a global subscriber was already installed (e.g. by
/// the host application), in which case the existing one keeps running.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let directive = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| config.level.clone());

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if config.json {
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(build_filter(&directive))
                .with_thread_names(true)
                .json()
                .finish(),
        )
    } else {
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(build_filter(&directive))
                .with_thread_names(true)
                .compact()
                .finish(),
        )
    };

    tracing::subscriber::set_global_default(subscriber).is_ok()
}

/// Parse a filter directive, falling back to `info` when it does not parse.
fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_install_is_refused() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
