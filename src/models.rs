//! Core data models used throughout DSAKit.
//!
//! These types represent the problem metadata and catalog records that flow
//! through the ingestion pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Site a problem page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemSource {
    LeetCode,
    Codeforces,
    HackerRank,
    Unknown,
}

impl ProblemSource {
    /// Detect the source from a URL by host fragment. First match wins.
    pub fn detect(url: &str) -> Self {
        let lower = url.to_lowercase();
        if lower.contains("leetcode.com") {
            ProblemSource::LeetCode
        } else if lower.contains("codeforces.com") {
            ProblemSource::Codeforces
        } else if lower.contains("hackerrank.com") {
            ProblemSource::HackerRank
        } else {
            ProblemSource::Unknown
        }
    }

    /// Lowercase tag used in directory names and prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemSource::LeetCode => "leetcode",
            ProblemSource::Codeforces => "codeforces",
            ProblemSource::HackerRank => "hackerrank",
            ProblemSource::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProblemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Problem metadata pulled from a page. Missing fields are empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemInfo {
    pub source: ProblemSource,
    pub id: String,
    pub title: String,
    /// Plain text, markup stripped.
    pub description: String,
}

impl ProblemInfo {
    /// All-empty info, still tagged with its source.
    pub fn empty(source: ProblemSource) -> Self {
        Self {
            source,
            id: String::new(),
            title: String::new(),
            description: String::new(),
        }
    }

    /// Workspace directory name: `<source>-<id>`.
    pub fn workspace_name(&self) -> String {
        format!("{}-{}", self.source, self.id)
    }
}

/// A persisted workspace record, keyed by problem id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub url: String,
    pub workspace_path: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_by_host_fragment() {
        assert_eq!(
            ProblemSource::detect("https://leetcode.com/problems/two-sum/"),
            ProblemSource::LeetCode
        );
        assert_eq!(
            ProblemSource::detect("https://CODEFORCES.com/problemset/problem/1/A"),
            ProblemSource::Codeforces
        );
        assert_eq!(
            ProblemSource::detect("https://www.hackerrank.com/challenges/x"),
            ProblemSource::HackerRank
        );
        assert_eq!(
            ProblemSource::detect("https://example.com"),
            ProblemSource::Unknown
        );
    }

    #[test]
    fn first_match_wins() {
        // A leetcode URL mentioning another host still resolves to leetcode.
        assert_eq!(
            ProblemSource::detect("https://leetcode.com/problems/x/?ref=codeforces.com"),
            ProblemSource::LeetCode
        );
    }

    #[test]
    fn workspace_name_joins_source_and_id() {
        let info = ProblemInfo {
            source: ProblemSource::LeetCode,
            id: "1".to_string(),
            title: "Two Sum".to_string(),
            description: String::new(),
        };
        assert_eq!(info.workspace_name(), "leetcode-1");
        assert_eq!(ProblemInfo::empty(ProblemSource::Unknown).workspace_name(), "unknown-");
    }
}
