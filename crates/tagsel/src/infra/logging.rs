//! Diagnostic logging to stderr.
//!
//! `TAGSEL_LOG` accepts any `EnvFilter` directive (`debug`, `tagsel::app=trace`) and wins over
//! the `-v` count given on the command line.

use std::sync::Once;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::uptime;

const ENV_VAR: &str = "TAGSEL_LOG";

static INIT: Once = Once::new();

/// Map a repeated `-v` flag to a default directive.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn filter(verbosity: u8) -> EnvFilter {
    match std::env::var(ENV_VAR) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(level_for(verbosity)),
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(verbosity: u8) {
    INIT.call_once(|| {
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter(verbosity))
            .with_writer(std::io::stderr)
            .with_timer(uptime())
            .with_target(verbosity >= 2)
            .try_init();
        if let Err(err) = installed {
            eprintln!("tagsel: logging disabled: {err}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(1), "info");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(7), "trace");
    }
}
