//! The audit-run seam.
//!
//! Producing rule results (traversal, the rule catalog, fan-out across
//! isolation boundaries) happens behind [`AuditProducer`]. This module only
//! wires a producer to a reporter and hands the finished report on.

use serde_json::Value;
use tracing::debug;

use crate::error::AuditError;
use crate::report::model::Report;
use crate::report::reporter::{self, ReporterKind};
use crate::rules::model::RuleResult;

/// Where an audit ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    pub url: String,
}

impl AuditContext {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

pub type ResultsCallback = Box<dyn FnOnce(Result<Vec<RuleResult>, AuditError>)>;

/// Runs an audit and delivers its rule results through `done`, now or later.
pub trait AuditProducer {
    fn run_audit(&self, context: &AuditContext, options: &Value, done: ResultsCallback);
}

impl<F> AuditProducer for F
where
    F: Fn(&AuditContext, &Value, ResultsCallback),
{
    fn run_audit(&self, context: &AuditContext, options: &Value, done: ResultsCallback) {
        self(context, options, done)
    }
}

/// Producer replaying results gathered elsewhere, e.g. read from disk.
#[derive(Debug, Clone, Default)]
pub struct RecordedResults(pub Vec<RuleResult>);

impl AuditProducer for RecordedResults {
    fn run_audit(&self, _context: &AuditContext, _options: &Value, done: ResultsCallback) {
        done(Ok(self.0.clone()))
    }
}

/// Run an audit through `producer` and reduce its results with `reporter`.
///
/// Producer failures are passed through untouched; nothing is aggregated.
pub fn run_and_report(
    producer: &dyn AuditProducer,
    context: &AuditContext,
    options: &Value,
    reporter: ReporterKind,
    done: impl FnOnce(Result<Report, AuditError>) + 'static,
) {
    let context_for_report = context.clone();
    producer.run_audit(
        context,
        options,
        Box::new(move |outcome| {
            let report = outcome.map(|results| {
                debug!(rules = results.len(), %reporter, "audit results received");
                reporter::report(reporter, &results, &context_for_report)
            });
            done(report)
        }),
    );
}
