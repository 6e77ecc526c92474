use ktest_minimize::{Completion, RunStats};
use serde::Serialize;

/// JSON report printed with `--json`
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub status: Completion,
    pub stats: RunStats,
    /// Result of re-running the predicate on the final lines, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    /// Kept lines without their terminators
    pub lines: Vec<&'a str>,
}

impl Report<'_> {
    /// One-line human summary for the log
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{}: {} -> {} lines ({:.1}% removed) in {} predicate calls",
            self.status,
            self.stats.initial_len,
            self.stats.result_len,
            self.stats.reduction() * 100.0,
            self.stats.predicate_calls
        );
        match self.verified {
            Some(true) => out.push_str(", result verified"),
            Some(false) => out.push_str(", result FAILED verification"),
            None => {}
        }
        out
    }
}
