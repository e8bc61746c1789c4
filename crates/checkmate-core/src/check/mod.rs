//! Checks: small, independently authored units of testable logic.
//!
//! A [`Check`] is applied to one entity at a time. It decides whether it
//! applies ([`Check::matches`]), runs its evaluation logic against an
//! [`EvaluationHelper`] and reports through a single-use completion
//! channel, whether the logic finished synchronously or not.
//!
//! A verdict is always delivered on a later turn of the [`Scheduler`],
//! never inside the `run` call itself. A check that does not apply, or
//! whose evaluation fails outright, settles before `run` returns.

pub mod compile;
pub mod helper;
pub mod result;
pub mod spec;

use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::error::CompileError;
use crate::schedule::Scheduler;

pub use compile::{AfterFn, EvaluateFn, ExecutionContextCompiler, FunctionSource, MatchesFn};
pub use helper::{AsyncCompletion, CheckOutcome, EvaluationHelper};
pub use result::CheckResult;
pub use spec::{CheckDefinition, CheckOverride, CheckPatch, CheckSpec};

use helper::Invocation;

/// Per-call overrides for [`Check::run`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunOptions {
    /// Overrides the check's own `enabled` flag for this call.
    pub enabled: Option<bool>,
    /// Overrides the check's own options for this call.
    pub options: Option<Value>,
}

/// A reusable test unit.
///
/// Ids are not unique: the same check may be instantiated several times.
/// `configure` takes `&mut self` and therefore cannot interleave with a
/// `run` call. Invocations already in flight hold their own state and keep
/// the configuration they were started with.
pub struct Check<E: ?Sized> {
    id: String,
    options: Value,
    selector: Option<String>,
    evaluate: EvaluateFn<E>,
    after: Option<AfterFn>,
    matches: Option<MatchesFn<E>>,
    enabled: bool,
    compiler: Rc<ExecutionContextCompiler<E>>,
}

impl<E: ?Sized + 'static> Check<E> {
    pub fn new(
        spec: CheckSpec<E>,
        compiler: &Rc<ExecutionContextCompiler<E>>,
    ) -> Result<Self, CompileError> {
        let evaluate = compiler.compile_evaluate(spec.evaluate)?;
        let after = spec
            .after
            .map(|src| compiler.compile_after(src))
            .transpose()?;
        let matches = spec
            .matches
            .map(|src| compiler.compile_matches(src))
            .transpose()?;

        Ok(Self {
            id: spec.id,
            options: spec.options,
            selector: spec.selector,
            evaluate,
            after,
            matches,
            enabled: spec.enabled.unwrap_or(true),
            compiler: Rc::clone(compiler),
        })
    }

    pub fn from_definition(
        definition: CheckDefinition,
        compiler: &Rc<ExecutionContextCompiler<E>>,
    ) -> Result<Self, CompileError> {
        Self::new(definition.into_spec(), compiler)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn options(&self) -> &Value {
        &self.options
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_after(&self) -> bool {
        self.after.is_some()
    }

    pub fn has_custom_matches(&self) -> bool {
        self.matches.is_some()
    }

    /// Whether this check applies to `entity`.
    ///
    /// A custom `matches` replaces selector matching entirely. Otherwise a
    /// check without a selector (or with an empty one) applies everywhere.
    pub fn matches(&self, entity: &E) -> bool {
        if let Some(custom) = &self.matches {
            return custom(entity);
        }

        match self.selector.as_deref() {
            None | Some("") => true,
            Some(selector) => self.compiler.matcher().matches_selector(entity, selector),
        }
    }

    /// Runs the check against `entity`.
    ///
    /// `done` receives exactly one outcome:
    /// - `Ok(None)` before `run` returns when the check is disabled or does
    ///   not match; the evaluation logic is not invoked.
    /// - `Err(_)` before `run` returns when the evaluation logic returns an
    ///   error, or on a later turn when it rejects through its asynchronous
    ///   completion.
    /// - `Ok(Some(result))` on a later scheduler turn otherwise.
    ///
    /// If the evaluation declared itself asynchronous, its return value is
    /// ignored and settlement is left to its completion handle.
    pub fn run(
        &self,
        entity: &E,
        options: &RunOptions,
        scheduler: &Rc<Scheduler>,
        done: impl FnOnce(CheckOutcome) + 'static,
    ) {
        let enabled = options.enabled.unwrap_or(self.enabled);
        if !enabled || !self.matches(entity) {
            debug!(check = %self.id, enabled, "check inapplicable");
            done(Ok(None));
            return;
        }

        let check_options = options.options.as_ref().unwrap_or(&self.options);
        let invocation = Invocation::new(&self.id, Rc::clone(scheduler), Box::new(done));
        let helper = EvaluationHelper::new(Rc::clone(&invocation));

        match (self.evaluate)(&helper, entity, check_options) {
            Err(error) => invocation.reject_now(error),
            Ok(verdict) if !invocation.is_async() => invocation.resolve(verdict),
            Ok(_) => debug!(check = %self.id, "check running asynchronously"),
        }
    }

    /// Applies the check's `after` post-processing to `results`.
    ///
    /// Without an `after` the results are returned unchanged.
    pub fn after_all(&self, results: Vec<CheckResult>, options: Option<&Value>) -> Vec<CheckResult> {
        match &self.after {
            Some(after) => after(results, options.unwrap_or(&self.options)),
            None => results,
        }
    }

    /// Replaces the attributes present in `spec`. Absent ones are untouched.
    ///
    /// Every replacement is compiled before any is applied, so a failed
    /// compile leaves the check as it was.
    pub fn configure(&mut self, spec: CheckOverride<E>) -> Result<(), CompileError> {
        let evaluate = spec
            .evaluate
            .map(|src| self.compiler.compile_evaluate(src))
            .transpose()?;
        let after = spec
            .after
            .map(|src| src.map(|s| self.compiler.compile_after(s)).transpose())
            .transpose()?;
        let matches = spec
            .matches
            .map(|src| src.map(|s| self.compiler.compile_matches(s)).transpose())
            .transpose()?;

        if let Some(options) = spec.options {
            self.options = options;
        }
        if let Some(selector) = spec.selector {
            self.selector = selector;
        }
        if let Some(evaluate) = evaluate {
            self.evaluate = evaluate;
        }
        if let Some(after) = after {
            self.after = after;
        }
        if let Some(matches) = matches {
            self.matches = matches;
        }
        if let Some(enabled) = spec.enabled {
            self.enabled = enabled;
        }

        debug!(check = %self.id, "check reconfigured");
        Ok(())
    }

    pub fn configure_from_patch(&mut self, patch: CheckPatch) -> Result<(), CompileError> {
        self.configure(patch.into_override())
    }
}

impl<E: ?Sized> std::fmt::Debug for Check<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("selector", &self.selector)
            .field("has_after", &self.after.is_some())
            .field("has_custom_matches", &self.matches.is_some())
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CheckError, EvaluationError};
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    /// Entities are plain tag names; a selector matches its exact tag.
    fn compiler() -> Rc<ExecutionContextCompiler<str>> {
        let mut c: ExecutionContextCompiler<str> =
            ExecutionContextCompiler::new(|e: &str, sel: &str| e == sel);
        c.register_evaluate("is-img", |_, e: &str, _| Ok(json!(e == "img")))
            .register_evaluate("min-len", |_, e: &str, opts: &Value| {
                let min = opts["min"]
                    .as_u64()
                    .ok_or_else(|| EvaluationError::invalid("missing min"))?;
                Ok(json!(e.len() as u64 >= min))
            })
            .register_matches("never", |_: &str| false);
        Rc::new(c)
    }

    fn capture() -> (Rc<RefCell<Option<CheckOutcome>>>, impl FnOnce(CheckOutcome) + 'static) {
        let slot = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&slot);
        (slot, move |outcome: CheckOutcome| *sink.borrow_mut() = Some(outcome))
    }

    fn run_to_end(check: &Check<str>, entity: &str, options: &RunOptions) -> CheckOutcome {
        let sched = Scheduler::new();
        let (slot, done) = capture();
        check.run(entity, options, &sched, done);
        sched.run_until_idle();
        let outcome = slot.borrow_mut().take();
        outcome.expect("check never settled")
    }

    #[test]
    fn construction_defaults() {
        let c = compiler();
        let check = Check::new(CheckSpec::from_text("img", "is-img"), &c).unwrap();
        assert_eq!(check.id(), "img");
        assert!(check.enabled());
        assert_eq!(check.options(), &Value::Null);
        assert!(!check.has_after());
        assert!(!check.has_custom_matches());
    }

    #[test]
    fn construction_fails_on_unknown_text() {
        let c = compiler();
        let err = Check::new(CheckSpec::from_text("x", "nope"), &c).unwrap_err();
        assert!(matches!(err, CompileError::Unresolved { .. }));
    }

    #[test]
    fn matches_without_selector_is_always_true() {
        let c = compiler();
        let check = Check::new(CheckSpec::from_text("img", "is-img"), &c).unwrap();
        for e in ["div", "img", ""] {
            assert!(check.matches(e));
        }
    }

    #[test]
    fn matches_defers_to_selector_matcher() {
        let c = compiler();
        let check = Check::new(CheckSpec::from_text("img", "is-img").selector("img"), &c).unwrap();
        assert!(check.matches("img"));
        assert!(!check.matches("div"));
    }

    #[test]
    fn custom_matches_replaces_selector() {
        let c = compiler();
        let check = Check::new(
            CheckSpec::from_text("img", "is-img")
                .selector("img")
                .matches(|e: &str| e == "div"),
            &c,
        )
        .unwrap();
        assert!(!check.matches("img"));
        assert!(check.matches("div"));
    }

    #[test]
    fn sync_verdict_is_delivered_after_run_returns() {
        let c = compiler();
        let check = Check::new(CheckSpec::from_text("img", "is-img"), &c).unwrap();
        let sched = Scheduler::new();
        let (slot, done) = capture();

        check.run("img", &RunOptions::default(), &sched, done);
        assert!(slot.borrow().is_none());
        assert_eq!(sched.pending(), 1);

        sched.run_until_idle();
        let outcome = slot.borrow_mut().take().unwrap();
        let result = outcome.unwrap().unwrap();
        assert_eq!(result.id, "img");
        assert_eq!(result.result, json!(true));
    }

    #[test]
    fn inapplicable_check_settles_before_run_returns() {
        let c = compiler();
        let check = Check::new(
            CheckSpec::from_text("img", "is-img")
                .selector("img")
                .enabled(false),
            &c,
        )
        .unwrap();
        let sched = Scheduler::new();

        let (slot, done) = capture();
        check.run("img", &RunOptions::default(), &sched, done);
        assert_eq!(slot.borrow_mut().take(), Some(Ok(None)));

        let on = RunOptions {
            enabled: Some(true),
            ..Default::default()
        };
        let (slot, done) = capture();
        check.run("div", &on, &sched, done);
        assert_eq!(slot.borrow_mut().take(), Some(Ok(None)));
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn evaluation_error_settles_before_run_returns() {
        let c = compiler();
        let check = Check::new(
            CheckSpec::new("boom", |_, _: &str, _| Err(EvaluationError::failed("boom"))),
            &c,
        )
        .unwrap();
        let sched = Scheduler::new();

        let (slot, done) = capture();
        check.run("img", &RunOptions::default(), &sched, done);
        let outcome = slot.borrow_mut().take().unwrap();
        assert_eq!(outcome.unwrap_err().evaluation(), &EvaluationError::failed("boom"));
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn dropped_async_completion_rejects_the_check() {
        let c = compiler();
        let check = Check::new(
            CheckSpec::new("forgetful", |helper: &EvaluationHelper, _: &str, _| {
                let _ = helper.asynchronous();
                Ok(Value::Null)
            }),
            &c,
        )
        .unwrap();

        let err = run_to_end(&check, "img", &RunOptions::default()).unwrap_err();
        assert_eq!(err.check_id(), "forgetful");
    }

    #[test]
    fn false_verdict_is_not_inapplicable() {
        let c = compiler();
        let check = Check::new(CheckSpec::from_text("img", "is-img"), &c).unwrap();
        let result = run_to_end(&check, "div", &RunOptions::default());
        assert_eq!(result.unwrap().unwrap().result, json!(false));
    }

    #[test]
    fn disabled_check_resolves_none_without_evaluating() {
        let c = compiler();
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let check = Check::new(
            CheckSpec::new("count", move |_, _: &str, _| {
                counter.set(counter.get() + 1);
                Ok(json!(true))
            })
            .enabled(false),
            &c,
        )
        .unwrap();

        assert_eq!(run_to_end(&check, "img", &RunOptions::default()), Ok(None));
        assert_eq!(calls.get(), 0);

        let forced = RunOptions {
            enabled: Some(true),
            ..Default::default()
        };
        assert!(run_to_end(&check, "img", &forced).unwrap().is_some());
        assert_eq!(calls.get(), 1);
        assert!(!check.enabled());
    }

    #[test]
    fn per_call_disable_overrides_enabled_check() {
        let c = compiler();
        let check = Check::new(CheckSpec::from_text("img", "is-img"), &c).unwrap();
        let off = RunOptions {
            enabled: Some(false),
            ..Default::default()
        };
        assert_eq!(run_to_end(&check, "img", &off), Ok(None));
    }

    #[test]
    fn non_matching_entity_resolves_none() {
        let c = compiler();
        let check = Check::new(CheckSpec::from_text("img", "is-img").selector("img"), &c).unwrap();
        assert_eq!(run_to_end(&check, "div", &RunOptions::default()), Ok(None));
    }

    #[test]
    fn per_call_options_override_stored_options() {
        let c = compiler();
        let check = Check::new(
            CheckSpec::from_text("len", "min-len").options(json!({"min": 10})),
            &c,
        )
        .unwrap();

        let stored = run_to_end(&check, "abc", &RunOptions::default());
        assert_eq!(stored.unwrap().unwrap().result, json!(false));

        let relaxed = RunOptions {
            options: Some(json!({"min": 2})),
            ..Default::default()
        };
        let result = run_to_end(&check, "abc", &relaxed);
        assert_eq!(result.unwrap().unwrap().result, json!(true));
        assert_eq!(check.options(), &json!({"min": 10}));
    }

    #[test]
    fn evaluation_error_rejects() {
        let c = compiler();
        let check = Check::new(CheckSpec::from_text("len", "min-len"), &c).unwrap();
        let err = run_to_end(&check, "abc", &RunOptions::default()).unwrap_err();
        assert_eq!(
            err,
            CheckError::Evaluation {
                check_id: "len".into(),
                source: EvaluationError::invalid("missing min"),
            }
        );
    }

    #[test]
    fn async_evaluation_settles_through_its_completion() {
        let c = compiler();
        let sched = Scheduler::new();
        let deferred = Rc::clone(&sched);
        let check = Check::new(
            CheckSpec::new("slow", move |helper: &EvaluationHelper, e: &str, _| {
                let done = helper.asynchronous();
                let helper = helper.clone();
                let verdict = e.starts_with('h');
                deferred.defer(move || {
                    helper.data(json!({"checked": true}));
                    done.resolve(verdict);
                });
                // Ignored once the evaluation is asynchronous.
                Ok(json!("ignored"))
            }),
            &c,
        )
        .unwrap();

        let (slot, done) = capture();
        check.run("h1", &RunOptions::default(), &sched, done);
        assert!(sched.turn());
        assert!(slot.borrow().is_none());
        sched.run_until_idle();

        let outcome = slot.borrow_mut().take().unwrap();
        let result = outcome.unwrap().unwrap();
        assert_eq!(result.result, json!(true));
        assert_eq!(result.data, json!({"checked": true}));
    }

    #[test]
    fn async_rejection_reaches_done() {
        let c = compiler();
        let check = Check::new(
            CheckSpec::new("broken", |helper: &EvaluationHelper, _: &str, _| {
                helper
                    .asynchronous()
                    .reject(EvaluationError::failed("timeout"));
                Ok(Value::Null)
            }),
            &c,
        )
        .unwrap();

        let err = run_to_end(&check, "img", &RunOptions::default()).unwrap_err();
        assert_eq!(err.evaluation(), &EvaluationError::failed("timeout"));
    }

    #[test]
    fn sync_error_after_async_resolution_is_dropped() {
        let c = compiler();
        let check = Check::new(
            CheckSpec::new("racy", |helper: &EvaluationHelper, _: &str, _| {
                helper.asynchronous().resolve(true);
                Err(EvaluationError::failed("after the fact"))
            }),
            &c,
        )
        .unwrap();

        let result = run_to_end(&check, "img", &RunOptions::default());
        assert_eq!(result.unwrap().unwrap().result, json!(true));
    }

    #[test]
    fn configure_options_touches_nothing_else() {
        let c = compiler();
        let mut check = Check::new(
            CheckSpec::from_text("img", "is-img")
                .selector("img")
                .enabled(false),
            &c,
        )
        .unwrap();

        check
            .configure(CheckOverride::new().options(json!({"level": "AAA"})))
            .unwrap();

        assert_eq!(check.options(), &json!({"level": "AAA"}));
        assert_eq!(check.selector(), Some("img"));
        assert!(!check.enabled());
        let forced = RunOptions {
            enabled: Some(true),
            ..Default::default()
        };
        assert_eq!(
            run_to_end(&check, "img", &forced).unwrap().unwrap().result,
            json!(true)
        );
    }

    #[test]
    fn configure_swaps_evaluate_for_text_source() {
        let c = compiler();
        let mut check = Check::new(CheckSpec::new("swap", |_, _: &str, _| Ok(json!(1))), &c).unwrap();
        check
            .configure(
                CheckOverride::new()
                    .evaluate_text("min-len")
                    .options(json!({"min": 1})),
            )
            .unwrap();
        let result = run_to_end(&check, "a", &RunOptions::default());
        assert_eq!(result.unwrap().unwrap().result, json!(true));
    }

    #[test]
    fn failed_configure_leaves_check_untouched() {
        let c = compiler();
        let mut check = Check::new(CheckSpec::from_text("img", "is-img"), &c).unwrap();
        let err = check
            .configure(
                CheckOverride::new()
                    .options(json!(1))
                    .matches(Some(FunctionSource::text("missing"))),
            )
            .unwrap_err();
        assert!(matches!(err, CompileError::Unresolved { .. }));
        assert_eq!(check.options(), &Value::Null);
        assert!(!check.has_custom_matches());
    }

    #[test]
    fn patch_can_clear_selector_and_matches() {
        let c = compiler();
        let mut check = Check::new(
            CheckSpec::from_text("img", "is-img").selector("img"),
            &c,
        )
        .unwrap();

        check
            .configure_from_patch(serde_json::from_value(json!({"matches": "never"})).unwrap())
            .unwrap();
        assert!(!check.matches("img"));

        check
            .configure_from_patch(
                serde_json::from_value(json!({"matches": null, "selector": null})).unwrap(),
            )
            .unwrap();
        assert!(check.matches("div"));
        assert_eq!(check.selector(), None);
    }

    #[test]
    fn after_all_is_identity_without_after() {
        let c = compiler();
        let check = Check::new(CheckSpec::from_text("img", "is-img"), &c).unwrap();
        let results = vec![CheckResult::new("img"), CheckResult::new("img")];
        assert_eq!(check.after_all(results.clone(), None), results);
    }

    #[test]
    fn after_all_applies_post_processing() {
        let c = compiler();
        let check = Check::new(
            CheckSpec::from_text("img", "is-img")
                .options(json!({"keep": 1}))
                .after(|mut results, opts| {
                    results.truncate(opts["keep"].as_u64().unwrap_or(0) as usize);
                    results
                }),
            &c,
        )
        .unwrap();
        let results = vec![CheckResult::new("img"), CheckResult::new("img")];
        assert_eq!(check.after_all(results.clone(), None).len(), 1);
        assert!(check.after_all(results, Some(&json!({"keep": 0}))).is_empty());
    }

    #[test]
    fn from_definition_compiles_every_text_field() {
        let c = compiler();
        let def: CheckDefinition = serde_json::from_value(json!({
            "id": "img",
            "evaluate": "is-img",
            "matches": "never",
            "enabled": false,
            "options": {"a": 1}
        }))
        .unwrap();
        let check = Check::from_definition(def, &c).unwrap();
        assert!(!check.enabled());
        assert!(!check.matches("img"));
        assert_eq!(check.options(), &json!({"a": 1}));
    }
}
