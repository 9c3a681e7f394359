// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "FITSYNC_LOG";

/// Filter directive for the given `-v` count. An explicit `-v` overrides
/// the environment; otherwise `FITSYNC_LOG` applies, falling back to `warn`.
pub fn filter_directive(verbose: u8, env: Option<&str>) -> String {
    match (verbose, env) {
        (0, Some(directive)) if !directive.trim().is_empty() => directive.to_string(),
        (0, _) => "warn".to_string(),
        (1, _) => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Installs the stderr subscriber. Logs never go to stdout, which carries
/// command output.
pub fn setup_logging(verbose: u8) {
    let env = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(verbose, env.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second install (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
