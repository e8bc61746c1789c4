//! Capabilities the engine consumes from the tree under audit.
//!
//! The engine never inspects an entity directly. Applicability goes
//! through [`SelectorMatcher`], and anything that ends up in a result goes
//! through [`DescribeEntity`].

use serde::{Deserialize, Serialize};

/// Structural matching predicate. Assumed pure.
pub trait SelectorMatcher<E: ?Sized> {
    fn matches_selector(&self, entity: &E, selector: &str) -> bool;
}

impl<E: ?Sized, F> SelectorMatcher<E> for F
where
    F: Fn(&E, &str) -> bool,
{
    fn matches_selector(&self, entity: &E, selector: &str) -> bool {
        self(entity, selector)
    }
}

/// Serialization of an entity into report-facing references.
pub trait DescribeEntity {
    /// Serialized markup of the entity.
    fn source(&self) -> String;

    /// Ordered selector path. Includes one segment per isolation boundary
    /// crossed to reach the entity.
    fn selector_path(&self) -> Vec<String>;

    /// Path of isolation boundaries (frames) the entity lives behind.
    fn frames(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Selector as produced upstream: either a single selector or a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Single(String),
    Path(Vec<String>),
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Target::Single(s.to_string())
    }
}

impl From<Vec<String>> for Target {
    fn from(path: Vec<String>) -> Self {
        Target::Path(path)
    }
}

/// Reference to an entity related to a check outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedNode {
    pub selector: Target,
    pub source: String,
}

impl RelatedNode {
    pub fn describe<D: DescribeEntity + ?Sized>(entity: &D) -> Self {
        Self {
            selector: Target::Path(entity.selector_path()),
            source: entity.source(),
        }
    }
}

/// The entity a node-level outcome was recorded against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub selector: Vec<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<String>,
}

impl NodeRef {
    pub fn describe<D: DescribeEntity + ?Sized>(entity: &D) -> Self {
        Self {
            selector: entity.selector_path(),
            source: entity.source(),
            frames: entity.frames(),
        }
    }
}
