//! Logging initialization

/// Filter used when `RUST_LOG` is not set
fn default_filter(debug: bool) -> &'static str {
    if debug { "debug" } else { "warn" }
}

/// Initialize logging based on debug flag
///
/// Output goes to stderr so stdout stays clean for reports and JSON. Without
/// `--debug` only warnings and errors are shown. `RUST_LOG` takes precedence
/// over both defaults.
pub fn init_logging(debug: bool, ansi: bool) {
    let result = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter(debug))),
        )
        .with_ansi(ansi)
        .with_target(debug)
        .with_file(debug)
        .with_line_number(debug)
        .try_init();

    if let Err(e) = result {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(true), "debug");
        assert_eq!(default_filter(false), "warn");
    }
}
