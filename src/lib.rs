//! # Team Gauge
//!
//! Pulls a player's recent Summoner's Rift matches and judges how their
//! teammates performed against the enemy team.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (regions, participants, match summaries, results)
//! - **fetch**: Upstream API client and payload normalization
//! - **pipeline**: Run orchestration, progress reporting and failure policy
//! - **calculate**: KDA, win rate and team-quality aggregation
//! - **report**: Plain-text rendering of a result
//! - **config**: Configuration loading and validation

pub mod calculate;
pub mod config;
pub mod fetch;
pub mod models;
pub mod pipeline;
pub mod report;

pub use models::*;
pub use pipeline::{AnalysisError, AnalysisPipeline, AnalysisRequest, ErrorKind, PipelineEvent};

use std::time::Duration;

/// Parse a human-friendly duration string (e.g., "10s", "2m", "500ms").
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(n) = s.strip_suffix("ms") {
        return n.parse().ok().map(Duration::from_millis);
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Default to seconds
        (s, 1)
    };

    let num: u64 = num_str.parse().ok()?;
    num.checked_mul(multiplier).map(Duration::from_secs)
}

/// Parse a request timeout; zero is rejected.
pub fn parse_timeout(s: &str) -> Option<Duration> {
    parse_duration(s).filter(|d| !d.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("15s"), Some(Duration::from_secs(15)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("750ms"), Some(Duration::from_millis(750)));
    }

    #[test]
    fn test_parse_duration_default_seconds() {
        assert_eq!(parse_duration("20"), Some(Duration::from_secs(20)));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("1h"), None);
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert_eq!(parse_duration("18446744073709551615m"), None);
        assert_eq!(
            parse_duration("18446744073709551615s"),
            Some(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn test_parse_timeout_rejects_zero() {
        assert_eq!(parse_timeout("0s"), None);
        assert_eq!(parse_timeout("0"), None);
        assert_eq!(parse_timeout("0ms"), None);
        assert_eq!(parse_timeout("250ms"), Some(Duration::from_millis(250)));
    }
}
