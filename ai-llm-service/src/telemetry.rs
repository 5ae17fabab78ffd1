use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Crate target prefixes of the workspace; only their events are rendered.
pub const WORKSPACE_TARGETS: [&str; 5] = [
    "tableau_ai_backend",
    "api",
    "tableau_client",
    "table_insights",
    "ai_llm_service",
];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        // no fractional seconds, Z-suffix
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

fn is_workspace_target(target: &str) -> bool {
    WORKSPACE_TARGETS.iter().any(|prefix| {
        target == *prefix
            || target
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with("::"))
    })
}

/// Build a **workspace-scoped** formatting layer that renders only events
/// emitted by the crates of this workspace.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format
/// - `file:line` and target (module path)
/// - Span close events (duration at the end of spans)
/// - ANSI colors only when stdout is a terminal
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();

    let only_workspace = filter::filter_fn(|meta| is_workspace_target(meta.target()));

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_workspace)
}

/// Level directive for one workspace crate, e.g. `tableau_client=debug`.
pub fn level_directive(target: &str, level: Level) -> Directive {
    format!("{target}={}", level.as_str().to_lowercase())
        .parse()
        .unwrap_or_else(|_| LevelFilter::from_level(level).into())
}

/// Create an EnvFilter from `RUST_LOG` or fallback `default`, then raise
/// every workspace crate to `level`.
///
/// Example: `default = "warn"`, `level = Level::INFO` shows other crates at
/// WARN and this workspace at INFO.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    let from_env = EnvFilter::try_from_default_env().ok();
    let has_env = from_env.is_some();
    let mut filter = from_env.unwrap_or_else(|| EnvFilter::new(default));
    if !has_env {
        for target in WORKSPACE_TARGETS {
            filter = filter.add_directive(level_directive(target, level));
        }
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_targets_match_by_crate_path() {
        assert!(is_workspace_target("api"));
        assert!(is_workspace_target("tableau_client::client"));
        assert!(!is_workspace_target("apigee"));
        assert!(!is_workspace_target("hyper::proto"));
    }

    #[test]
    fn directive_is_crate_scoped() {
        let d = level_directive("table_insights", Level::DEBUG);
        assert_eq!(d.to_string(), "table_insights=debug");
    }
}
