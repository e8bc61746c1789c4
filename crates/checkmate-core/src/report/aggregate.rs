//! Reduction of raw rule results into a report.
//!
//! Responsibilities:
//! - Select, per rule, the buckets it contributes to (via `rules::classify`)
//! - Flatten node entries into public node summaries
//! - Strip check verdicts and rename related-node fields
//! - Stamp the report with the audited url and the aggregation time
//!
//! Non-responsibilities:
//! - Sorting or deduplication: every level keeps its input order
//! - Deciding which buckets a report carries (the reporter does that)

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::debug;

use crate::audit::AuditContext;
use crate::report::model::{CheckSummary, NodeSummary, RelatedSummary, Report, RuleSummary};
use crate::rules::classify::classify;
use crate::rules::model::{CheckEntry, NodeResult, RuleResult};

/// Which buckets a report carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSet {
    pub violations: bool,
    pub passes: bool,
    pub incomplete: bool,
    pub inapplicable: bool,
}

impl BucketSet {
    pub const VIOLATIONS_ONLY: BucketSet = BucketSet {
        violations: true,
        passes: false,
        incomplete: false,
        inapplicable: false,
    };

    pub const ALL: BucketSet = BucketSet {
        violations: true,
        passes: true,
        incomplete: true,
        inapplicable: true,
    };
}

#[derive(Debug, Clone)]
pub struct ResultAggregator {
    buckets: BucketSet,
}

impl ResultAggregator {
    pub fn new(buckets: BucketSet) -> Self {
        Self { buckets }
    }

    pub fn buckets(&self) -> BucketSet {
        self.buckets
    }

    /// Reduce `results` into a report stamped with the current time.
    pub fn aggregate(&self, results: &[RuleResult], context: &AuditContext) -> Report {
        self.aggregate_at(results, context, Utc::now())
    }

    /// Reduce `results` into a report stamped with `at`.
    pub fn aggregate_at(
        &self,
        results: &[RuleResult],
        context: &AuditContext,
        at: DateTime<Utc>,
    ) -> Report {
        let mut violations = Vec::new();
        let mut passes = Vec::new();
        let mut incomplete = Vec::new();
        let mut inapplicable = Vec::new();

        for rule in results {
            let class = classify(rule);
            if self.buckets.violations && class.violation {
                violations.push(summarize_rule(rule, &rule.violations));
            }
            if self.buckets.passes && class.pass {
                passes.push(summarize_rule(rule, &rule.passes));
            }
            if self.buckets.incomplete && class.incomplete {
                incomplete.push(summarize_rule(rule, &rule.violations));
            }
            if self.buckets.inapplicable && class.inapplicable {
                inapplicable.push(summarize_rule(rule, &[]));
            }
        }

        let report = Report {
            url: context.url.clone(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            violations: self.buckets.violations.then_some(violations),
            passes: self.buckets.passes.then_some(passes),
            incomplete: self.buckets.incomplete.then_some(incomplete),
            inapplicable: self.buckets.inapplicable.then_some(inapplicable),
        };

        debug!(
            rules = results.len(),
            violations = report.violation_count(),
            url = %report.url,
            "aggregated report"
        );

        report
    }
}

/// Summarize `rule` using `entries` as its nodes.
pub fn summarize_rule(rule: &RuleResult, entries: &[NodeResult]) -> RuleSummary {
    RuleSummary {
        id: rule.id.clone(),
        description: rule.description.clone(),
        help: rule.help.clone(),
        help_url: rule.help_url.clone(),
        tags: rule.tags.clone(),
        impact: rule.impact.clone(),
        nodes: entries
            .iter()
            .map(|entry| summarize_node(entry, rule.impact.as_deref()))
            .collect(),
    }
}

/// A node without an impact of its own inherits the rule's.
fn summarize_node(entry: &NodeResult, rule_impact: Option<&str>) -> NodeSummary {
    NodeSummary {
        html: entry.node.source.clone(),
        target: entry.node.selector.clone(),
        impact: entry
            .impact
            .clone()
            .or_else(|| rule_impact.map(str::to_string)),
        any: entry.any.iter().map(summarize_check).collect(),
        all: entry.all.iter().map(summarize_check).collect(),
        none: entry.none.iter().map(summarize_check).collect(),
    }
}

fn summarize_check(outcome: &CheckEntry) -> CheckSummary {
    CheckSummary {
        impact: outcome.impact.clone(),
        related_nodes: outcome
            .related_nodes
            .iter()
            .map(|related| RelatedSummary {
                target: related.selector.clone(),
                html: related.source.clone(),
            })
            .collect(),
        data: outcome.data.clone(),
        extra: outcome.extra.clone(),
    }
}
