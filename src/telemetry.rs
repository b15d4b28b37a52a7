use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(f, "invalid log level/filter '{}'", value)
            }
            TelemetryError::Subscriber(err) => write!(f, "logging setup failed: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Filter used when RUST_LOG is unset: `--verbose` wins, then the
/// configured level, then warnings only.
pub fn default_filter(verbose: bool, configured: Option<&str>) -> String {
    if verbose {
        return "hh_scout=debug,warn".to_string();
    }
    match configured.map(str::trim).filter(|l| !l.is_empty()) {
        Some(level) => level.to_string(),
        None => "warn".to_string(),
    }
}

/// Install the stderr subscriber. Logs go to stderr so stdout stays clean
/// for tables, TSV and CSV.
pub fn init(verbose: bool, configured: Option<&str>) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let value = default_filter(verbose, configured);
            EnvFilter::try_new(&value).map_err(|source| TelemetryError::EnvFilter { value, source })?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(true, Some("info")), "hh_scout=debug,warn");
        assert_eq!(default_filter(false, Some("info")), "info");
        assert_eq!(default_filter(false, Some("  ")), "warn");
        assert_eq!(default_filter(false, None), "warn");
    }

    #[test]
    fn test_default_filters_parse() {
        for value in [default_filter(true, None), default_filter(false, None)] {
            assert!(EnvFilter::try_new(&value).is_ok());
        }
    }
}
