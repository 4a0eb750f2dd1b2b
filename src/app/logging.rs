// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Module defaults appended to a bare level so sqlx statement logging stays
/// quiet unless asked for explicitly.
const QUIET_MODULES: &str = "sqlx=warn,sqlx::query=warn";

fn filter_spec(log_level: &str) -> String {
    // Custom directive strings (with ',' or '=') are respected as-is.
    let normalized = log_level.trim();
    if normalized.is_empty() {
        return format!("info,{QUIET_MODULES}");
    }
    if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!("{normalized},{QUIET_MODULES}")
    }
}

pub fn setup_logging(log_level: &str, json_format: bool) {
    let filter_spec = filter_spec(log_level);
    let filter = EnvFilter::from_str(&filter_spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        subscriber.with(fmt_layer).init();
    }

    tracing::debug!(
        filter = %filter_spec,
        format = if json_format { "json" } else { "compact" },
        "Logging initialized"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_levels_get_quiet_module_defaults() {
        assert_eq!(filter_spec("debug"), "debug,sqlx=warn,sqlx::query=warn");
        assert_eq!(filter_spec(""), "info,sqlx=warn,sqlx::query=warn");
        assert_eq!(filter_spec("ledger=trace,info"), "ledger=trace,info");
    }
}
