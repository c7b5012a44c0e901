//! Parsing of the Envoy admin `/stats` payload.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Gauge counting client connections currently open on the proxy.
pub const DOWNSTREAM_CX_ACTIVE: &str = "http.envoy.downstream_cx_active";

static DOWNSTREAM_CX_ACTIVE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^http[.]envoy[.]downstream_cx_active:[ ]+([0-9]+)\s*$")
        .expect("downstream_cx_active pattern is valid")
});

/// Longest excerpt of an unparseable payload kept in the error.
const EXCERPT_LEN: usize = 120;

/// The stats payload did not contain a usable `downstream_cx_active` line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to parse envoy downstream connections from {excerpt:?}")]
pub struct StatsParseError {
    excerpt: String,
}

impl StatsParseError {
    fn new(body: &str) -> Self {
        Self {
            excerpt: body.trim().chars().take(EXCERPT_LEN).collect(),
        }
    }
}

/// Extract the active downstream connection count from a stats payload.
pub fn parse_downstream_cx_active(body: &str) -> Result<u64, StatsParseError> {
    let captures = DOWNSTREAM_CX_ACTIVE_LINE
        .captures(body)
        .ok_or_else(|| StatsParseError::new(body))?;

    captures[1].parse().map_err(|_| StatsParseError::new(body))
}

/// Render a count the way `/check/stats` reports it.
pub fn render_downstream_cx_active(count: u64) -> String {
    format!("{DOWNSTREAM_CX_ACTIVE}: {count}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_padded_line() {
        assert_eq!(parse_downstream_cx_active("http.envoy.downstream_cx_active:   42\n"), Ok(42));
        assert_eq!(parse_downstream_cx_active("http.envoy.downstream_cx_active: 0"), Ok(0));
    }

    #[test]
    fn finds_line_among_other_stats() {
        let body = "cluster.backend.upstream_cx_active: 3\nhttp.envoy.downstream_cx_active: 7\n";
        assert_eq!(parse_downstream_cx_active(body), Ok(7));
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(parse_downstream_cx_active("garbage").is_err());
        assert!(parse_downstream_cx_active("").is_err());
        assert!(parse_downstream_cx_active("http.envoy.downstream_cx_active:").is_err());
        assert!(parse_downstream_cx_active("http.envoy.downstream_cx_active: -1").is_err());
        assert!(parse_downstream_cx_active("listener.http.envoy.downstream_cx_active: 4").is_err());
    }

    #[test]
    fn rejects_counts_beyond_u64() {
        let body = "http.envoy.downstream_cx_active: 99999999999999999999999";
        assert!(parse_downstream_cx_active(body).is_err());
    }

    #[test]
    fn render_matches_parse() {
        let line = render_downstream_cx_active(12);
        assert_eq!(line, "http.envoy.downstream_cx_active: 12\n");
        assert_eq!(parse_downstream_cx_active(&line), Ok(12));
    }
}
