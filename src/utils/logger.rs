use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    /// One JSON object per event, for log shippers.
    Json,
}

impl LogFormat {
    pub fn from_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "orchestra_ops=debug,info"
    } else {
        "orchestra_ops=info"
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logger(format: LogFormat, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);
    let layer = match format {
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer.json().boxed(),
    };

    tracing_subscriber::registry().with(filter).with(layer).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(false), "orchestra_ops=info");
        assert!(default_directives(true).contains("orchestra_ops=debug"));
        assert_eq!(LogFormat::from_flag(true), LogFormat::Json);
        assert_eq!(LogFormat::from_flag(false), LogFormat::Compact);
    }
}
