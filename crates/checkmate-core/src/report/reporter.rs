//! Reporter selection.
//!
//! A reporter is nothing more than a choice of buckets handed to the
//! [`ResultAggregator`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audit::AuditContext;
use crate::report::aggregate::{BucketSet, ResultAggregator};
use crate::report::model::Report;
use crate::rules::model::RuleResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReporterKind {
    /// Violations only.
    #[default]
    NoPasses,
    /// Violations, passes, incomplete and inapplicable.
    Full,
}

impl ReporterKind {
    pub const ALL: [ReporterKind; 2] = [ReporterKind::NoPasses, ReporterKind::Full];

    pub fn as_str(self) -> &'static str {
        match self {
            ReporterKind::NoPasses => "no-passes",
            ReporterKind::Full => "full",
        }
    }

    pub fn buckets(self) -> BucketSet {
        match self {
            ReporterKind::NoPasses => BucketSet::VIOLATIONS_ONLY,
            ReporterKind::Full => BucketSet::ALL,
        }
    }
}

impl std::fmt::Display for ReporterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown reporter {0:?} (expected \"no-passes\" or \"full\")")]
pub struct UnknownReporter(pub String);

impl FromStr for ReporterKind {
    type Err = UnknownReporter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReporterKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownReporter(s.to_string()))
    }
}

/// Aggregator configured for `kind`.
pub fn select(kind: ReporterKind) -> ResultAggregator {
    ResultAggregator::new(kind.buckets())
}

/// Reduce `results` with the reporter named by `kind`.
pub fn report(kind: ReporterKind, results: &[RuleResult], context: &AuditContext) -> Report {
    select(kind).aggregate(results, context)
}
