use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::RelatedNode;

/// Outcome of one check invocation against one entity.
///
/// Created fresh for every `Check::run` that applies and never shared
/// between invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub id: String,
    /// Verdict. Usually a boolean; non-boolean checks may produce any value.
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub related_nodes: Vec<RelatedNode>,
    /// Auxiliary payload attached through `EvaluationHelper::data`.
    #[serde(default)]
    pub data: Value,
}

impl CheckResult {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result: Value::Null,
            related_nodes: Vec::new(),
            data: Value::Null,
        }
    }
}
