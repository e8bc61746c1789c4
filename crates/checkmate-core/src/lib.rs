//! Rule-based audit engine core.
//!
//! Two halves:
//! - `check`: the unit of testable logic, its applicability, synchronous
//!   and asynchronous execution, and reconfiguration.
//! - `report`: reduction of raw per-rule results into a reporter-shaped
//!   report.

pub mod audit;
pub mod check;
pub mod entity;
pub mod error;
pub mod report;
pub mod rules;
pub mod schedule;

mod util;

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::audit::{AuditContext, RecordedResults, run_and_report};
use crate::report::model::Report;
use crate::report::reporter::ReporterKind;

pub const TOOL_NAME: &str = "checkmate";

/// Read recorded rule results from `path` and reduce them with `reporter`.
pub fn report_file(path: &Path, reporter: ReporterKind, context: &AuditContext) -> Result<Report> {
    let results = rules::read::read_results(path)?;

    let slot = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&slot);
    run_and_report(
        &RecordedResults(results),
        context,
        &Value::Null,
        reporter,
        move |report| *sink.borrow_mut() = Some(report),
    );

    let outcome = slot.borrow_mut().take();
    match outcome {
        Some(report) => Ok(report?),
        None => Err(anyhow!("recorded results did not complete")),
    }
}
