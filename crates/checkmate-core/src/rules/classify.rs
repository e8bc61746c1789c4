//! Bucket classification for rule results.
//!
//! Decides which report buckets a single rule contributes to. Which of
//! those buckets actually appear in a report is the reporter's decision.
//!
//! The policy is deliberately simple:
//!
//!   - overall CANTTELL                        → incomplete (only)
//!   - violation entries, or overall FAIL      → violations
//!   - pass entries, or overall PASS           → passes
//!   - overall NA, or nothing recorded at all  → inapplicable
//!
//! A rule may land in both violations and passes (some nodes pass, others
//! fail). An undecided rule never counts as a violation, even when it
//! carries violation entries. Classification never depends on the order
//! of entries.

use crate::rules::model::{Outcome, RuleResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub violation: bool,
    pub pass: bool,
    pub incomplete: bool,
    pub inapplicable: bool,
}

pub fn classify(rule: &RuleResult) -> Classification {
    let outcome = rule.result;
    let incomplete = outcome == Some(Outcome::CantTell);
    let violation =
        !incomplete && (!rule.violations.is_empty() || outcome == Some(Outcome::Fail));
    let pass = !incomplete && (!rule.passes.is_empty() || outcome == Some(Outcome::Pass));
    let inapplicable =
        outcome == Some(Outcome::NotApplicable) || !(violation || pass || incomplete);

    Classification {
        violation,
        pass,
        incomplete,
        inapplicable,
    }
}
