//! Process-wide tracing setup.
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Directive used when `RUST_LOG` is unset: our own events and the HTTP trace
/// layer, nothing from dependencies.
pub fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("warn,cotacao={level},tower_http={level}")
}

/// Installs the global subscriber. Logs go to stderr so they never mix with
/// command output. `RUST_LOG` wins over `verbose` when set.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_follows_verbosity() {
        assert_eq!(
            default_directive(false),
            "warn,cotacao=info,tower_http=info"
        );
        assert_eq!(
            default_directive(true),
            "warn,cotacao=debug,tower_http=debug"
        );
    }

    #[test]
    fn test_default_directive_parses() {
        for verbose in [false, true] {
            assert!(EnvFilter::try_new(default_directive(verbose)).is_ok());
        }
    }
}
