//! Turning function sources into callables.
//!
//! A check's logic arrives either as an in-process closure or as text. Text
//! is never executed: it is a reference resolved by name against the
//! functions registered on the [`ExecutionContextCompiler`], which is the
//! explicit ambient API the logic may rely on. A name that was never
//! registered is a [`CompileError`], reported to whoever built or
//! reconfigured the check.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::check::helper::EvaluationHelper;
use crate::check::result::CheckResult;
use crate::entity::SelectorMatcher;
use crate::error::{CompileError, EvaluationError, FunctionKind};

/// Evaluation logic: `(helper, entity, options) -> verdict`.
pub type EvaluateFn<E> =
    Rc<dyn Fn(&EvaluationHelper, &E, &Value) -> Result<Value, EvaluationError>>;

/// Post-processing over all results a check produced: `(results, options) -> results`.
pub type AfterFn = Rc<dyn Fn(Vec<CheckResult>, &Value) -> Vec<CheckResult>>;

/// Custom applicability predicate replacing selector matching.
pub type MatchesFn<E> = Rc<dyn Fn(&E) -> bool>;

/// Either a ready callable or a textual reference to one.
pub enum FunctionSource<F> {
    Callable(F),
    Text(String),
}

impl<F> FunctionSource<F> {
    pub fn text(source: impl Into<String>) -> Self {
        FunctionSource::Text(source.into())
    }
}

impl<F> std::fmt::Debug for FunctionSource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FunctionSource::Callable(_) => f.write_str("Callable(..)"),
            FunctionSource::Text(text) => f.debug_tuple("Text").field(text).finish(),
        }
    }
}

/// Compiles function sources against a fixed set of named callables and the
/// selector matcher checks fall back on when they carry no custom `matches`.
pub struct ExecutionContextCompiler<E: ?Sized> {
    evaluate: HashMap<String, EvaluateFn<E>>,
    after: HashMap<String, AfterFn>,
    matches: HashMap<String, MatchesFn<E>>,
    matcher: Rc<dyn SelectorMatcher<E>>,
}

impl<E: ?Sized + 'static> ExecutionContextCompiler<E> {
    pub fn new(matcher: impl SelectorMatcher<E> + 'static) -> Self {
        Self {
            evaluate: HashMap::new(),
            after: HashMap::new(),
            matches: HashMap::new(),
            matcher: Rc::new(matcher),
        }
    }

    pub fn register_evaluate(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&EvaluationHelper, &E, &Value) -> Result<Value, EvaluationError> + 'static,
    ) -> &mut Self {
        self.evaluate.insert(name.into(), Rc::new(f));
        self
    }

    pub fn register_after(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(Vec<CheckResult>, &Value) -> Vec<CheckResult> + 'static,
    ) -> &mut Self {
        self.after.insert(name.into(), Rc::new(f));
        self
    }

    pub fn register_matches(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&E) -> bool + 'static,
    ) -> &mut Self {
        self.matches.insert(name.into(), Rc::new(f));
        self
    }

    pub fn compile_evaluate(
        &self,
        source: FunctionSource<EvaluateFn<E>>,
    ) -> Result<EvaluateFn<E>, CompileError> {
        resolve(&self.evaluate, FunctionKind::Evaluate, source)
    }

    pub fn compile_after(&self, source: FunctionSource<AfterFn>) -> Result<AfterFn, CompileError> {
        resolve(&self.after, FunctionKind::After, source)
    }

    pub fn compile_matches(
        &self,
        source: FunctionSource<MatchesFn<E>>,
    ) -> Result<MatchesFn<E>, CompileError> {
        resolve(&self.matches, FunctionKind::Matches, source)
    }

    pub(crate) fn matcher(&self) -> &dyn SelectorMatcher<E> {
        self.matcher.as_ref()
    }
}

fn resolve<F: Clone>(
    table: &HashMap<String, F>,
    kind: FunctionKind,
    source: FunctionSource<F>,
) -> Result<F, CompileError> {
    match source {
        FunctionSource::Callable(f) => Ok(f),
        FunctionSource::Text(text) => {
            let name = parse_reference(kind, &text)?;
            table
                .get(name)
                .cloned()
                .ok_or_else(|| CompileError::Unresolved {
                    kind,
                    name: name.to_string(),
                })
        }
    }
}

/// Validates a textual reference: a single token of ASCII alphanumerics and
/// `-`, `_`, `.`, `:`, optionally surrounded by whitespace.
fn parse_reference(kind: FunctionKind, text: &str) -> Result<&str, CompileError> {
    let name = text.trim();
    if name.is_empty() {
        return Err(CompileError::Malformed {
            kind,
            source_text: text.to_string(),
            reason: "empty source".into(),
        });
    }

    if let Some((offset, c)) = name
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')))
    {
        return Err(CompileError::Malformed {
            kind,
            source_text: text.to_string(),
            reason: format!("unexpected character {c:?} at offset {offset}"),
        });
    }

    Ok(name)
}
