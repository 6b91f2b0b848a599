//! Tracing setup.

use std::sync::Once;

use crate::config::{ConfigError, LoggingConfig};

/// Install a `tracing-subscriber` fmt subscriber writing to stderr.
///
/// Only the first call installs anything; later calls just validate the
/// configuration. An already installed global subscriber is left alone.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    static INIT: Once = Once::new();

    let level = config.max_level()?;
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_ansi(config.ansi)
            .with_max_level(level)
            .try_init();
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_repeatable() {
        let config = LoggingConfig::default();
        init_tracing(&config).unwrap();
        init_tracing(&config).unwrap();
        tracing::warn!("logging initialized twice");
    }

    #[test]
    fn test_init_rejects_bad_level() {
        let config = LoggingConfig {
            level: "chatty".to_string(),
            ansi: false,
        };
        assert!(matches!(
            init_tracing(&config),
            Err(ConfigError::InvalidLevel(_))
        ));
    }
}
