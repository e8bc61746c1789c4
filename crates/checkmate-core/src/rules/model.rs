//! Per-rule results as produced by an audit run.
//!
//! This is the input of aggregation. It is read, never mutated.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::{NodeRef, RelatedNode};

/// Overall verdict keyword of a rule or node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Outcome {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
    #[serde(rename = "NA")]
    NotApplicable,
    #[serde(rename = "CANTTELL")]
    CantTell,
}

/// Result of one rule across every node it was applied to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub help_url: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub page_level: bool,
    #[serde(default)]
    pub result: Option<Outcome>,
    #[serde(default)]
    pub passes: Vec<NodeResult>,
    #[serde(default)]
    pub violations: Vec<NodeResult>,
}

/// Outcome of a rule on a single node, split into check buckets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
    #[serde(default)]
    pub result: Option<Outcome>,
    pub node: NodeRef,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub any: Vec<CheckEntry>,
    #[serde(default)]
    pub all: Vec<CheckEntry>,
    #[serde(default)]
    pub none: Vec<CheckEntry>,
}

/// One check's verdict on a node.
///
/// Fields the aggregator has no use for are kept in `extra` and forwarded
/// to the report unchanged. `impact` and `data` distinguish an absent key
/// (`None`) from an explicit `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckEntry {
    #[serde(default)]
    pub result: Option<bool>,
    #[serde(
        default,
        deserialize_with = "crate::util::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub impact: Option<Option<String>>,
    #[serde(default)]
    pub related_nodes: Vec<RelatedNode>,
    #[serde(
        default,
        deserialize_with = "crate::util::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
