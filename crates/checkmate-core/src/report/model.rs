use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::Target;

/// Reporter-shaped audit report.
///
/// Buckets the active reporter does not emit are `None` and omitted from
/// JSON entirely (as opposed to an empty list, which means "emitted, but
/// nothing in it").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub url: String,
    /// RFC 3339, UTC, millisecond precision.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<RuleSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passes: Option<Vec<RuleSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incomplete: Option<Vec<RuleSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inapplicable: Option<Vec<RuleSummary>>,
}

impl Report {
    pub fn violation_count(&self) -> usize {
        self.violations.as_ref().map_or(0, Vec::len)
    }

    /// CI-compatible exit code: 0 without violations, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.violation_count() == 0 { 0 } else { 1 }
    }
}

/// One rule as it appears in a report bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSummary {
    pub id: String,
    pub description: String,
    pub help: Option<String>,
    /// `null` when the rule result carried none.
    pub help_url: Option<String>,
    pub tags: Vec<String>,
    pub impact: Option<String>,
    pub nodes: Vec<NodeSummary>,
}

/// One node a rule was applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub html: String,
    pub target: Vec<String>,
    pub impact: Option<String>,
    pub any: Vec<CheckSummary>,
    pub all: Vec<CheckSummary>,
    pub none: Vec<CheckSummary>,
}

/// A check outcome with its `result` stripped.
///
/// Bucket membership already says whether the check passed. `impact` and
/// `data` are written exactly when the input carried them, `null` included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckSummary {
    #[serde(
        default,
        deserialize_with = "crate::util::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub impact: Option<Option<String>>,
    pub related_nodes: Vec<RelatedSummary>,
    #[serde(
        default,
        deserialize_with = "crate::util::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A related node in public shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedSummary {
    pub target: Target,
    pub html: String,
}
