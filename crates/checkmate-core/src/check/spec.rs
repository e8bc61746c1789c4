//! Inputs for building and reconfiguring checks.
//!
//! [`CheckSpec`] and [`CheckOverride`] accept closures or textual sources.
//! [`CheckDefinition`] and [`CheckPatch`] are their serialized forms, in
//! which every function field is text.

use std::rc::Rc;

use serde::Deserialize;
use serde_json::Value;

use crate::check::compile::{AfterFn, EvaluateFn, FunctionSource, MatchesFn};
use crate::check::helper::EvaluationHelper;
use crate::check::result::CheckResult;
use crate::error::EvaluationError;

/// Everything needed to construct a `Check`.
pub struct CheckSpec<E: ?Sized> {
    pub id: String,
    pub options: Value,
    pub selector: Option<String>,
    pub evaluate: FunctionSource<EvaluateFn<E>>,
    pub after: Option<FunctionSource<AfterFn>>,
    pub matches: Option<FunctionSource<MatchesFn<E>>>,
    /// `None` means enabled.
    pub enabled: Option<bool>,
}

impl<E: ?Sized + 'static> CheckSpec<E> {
    pub fn new(
        id: impl Into<String>,
        evaluate: impl Fn(&EvaluationHelper, &E, &Value) -> Result<Value, EvaluationError> + 'static,
    ) -> Self {
        Self::with_source(id, FunctionSource::Callable(Rc::new(evaluate)))
    }

    /// Spec whose evaluation logic is a textual reference.
    pub fn from_text(id: impl Into<String>, evaluate: impl Into<String>) -> Self {
        Self::with_source(id, FunctionSource::Text(evaluate.into()))
    }

    fn with_source(id: impl Into<String>, evaluate: FunctionSource<EvaluateFn<E>>) -> Self {
        Self {
            id: id.into(),
            options: Value::Null,
            selector: None,
            evaluate,
            after: None,
            matches: None,
            enabled: None,
        }
    }

    pub fn options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn after(
        mut self,
        after: impl Fn(Vec<CheckResult>, &Value) -> Vec<CheckResult> + 'static,
    ) -> Self {
        self.after = Some(FunctionSource::Callable(Rc::new(after)));
        self
    }

    pub fn matches(mut self, matches: impl Fn(&E) -> bool + 'static) -> Self {
        self.matches = Some(FunctionSource::Callable(Rc::new(matches)));
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }
}

impl<E: ?Sized> std::fmt::Debug for CheckSpec<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckSpec")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("selector", &self.selector)
            .field("evaluate", &self.evaluate)
            .field("after", &self.after)
            .field("matches", &self.matches)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Partial reconfiguration of a `Check`.
///
/// Only fields that are `Some` are applied. For `selector`, `after` and
/// `matches`, `Some(None)` clears the attribute back to its default.
pub struct CheckOverride<E: ?Sized> {
    pub options: Option<Value>,
    pub selector: Option<Option<String>>,
    pub evaluate: Option<FunctionSource<EvaluateFn<E>>>,
    pub after: Option<Option<FunctionSource<AfterFn>>>,
    pub matches: Option<Option<FunctionSource<MatchesFn<E>>>>,
    pub enabled: Option<bool>,
}

impl<E: ?Sized> Default for CheckOverride<E> {
    fn default() -> Self {
        Self {
            options: None,
            selector: None,
            evaluate: None,
            after: None,
            matches: None,
            enabled: None,
        }
    }
}

impl<E: ?Sized + 'static> CheckOverride<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    pub fn selector(mut self, selector: Option<String>) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn evaluate(
        mut self,
        evaluate: impl Fn(&EvaluationHelper, &E, &Value) -> Result<Value, EvaluationError> + 'static,
    ) -> Self {
        self.evaluate = Some(FunctionSource::Callable(Rc::new(evaluate)));
        self
    }

    pub fn evaluate_text(mut self, evaluate: impl Into<String>) -> Self {
        self.evaluate = Some(FunctionSource::Text(evaluate.into()));
        self
    }

    pub fn after(mut self, after: Option<FunctionSource<AfterFn>>) -> Self {
        self.after = Some(after);
        self
    }

    pub fn matches(mut self, matches: Option<FunctionSource<MatchesFn<E>>>) -> Self {
        self.matches = Some(matches);
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }
}

/// Serialized check: all logic given as textual references.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckDefinition {
    pub id: String,
    #[serde(default)]
    pub options: Value,
    #[serde(default)]
    pub selector: Option<String>,
    pub evaluate: String,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub matches: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl CheckDefinition {
    pub fn into_spec<E: ?Sized + 'static>(self) -> CheckSpec<E> {
        CheckSpec {
            id: self.id,
            options: self.options,
            selector: self.selector,
            evaluate: FunctionSource::Text(self.evaluate),
            after: self.after.map(FunctionSource::Text),
            matches: self.matches.map(FunctionSource::Text),
            enabled: self.enabled,
        }
    }
}

/// Serialized reconfiguration.
///
/// A key that is absent leaves the attribute untouched. A key present with
/// `null` sets `options` to `null` and clears `selector`, `after` and
/// `matches`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckPatch {
    #[serde(default, deserialize_with = "crate::util::present")]
    pub options: Option<Value>,
    #[serde(default, deserialize_with = "crate::util::present")]
    pub selector: Option<Option<String>>,
    #[serde(default)]
    pub evaluate: Option<String>,
    #[serde(default, deserialize_with = "crate::util::present")]
    pub after: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::util::present")]
    pub matches: Option<Option<String>>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl CheckPatch {
    pub fn into_override<E: ?Sized + 'static>(self) -> CheckOverride<E> {
        CheckOverride {
            options: self.options,
            selector: self.selector,
            evaluate: self.evaluate.map(FunctionSource::Text),
            after: self.after.map(|a| a.map(FunctionSource::Text)),
            matches: self.matches.map(|m| m.map(FunctionSource::Text)),
            enabled: self.enabled,
        }
    }
}
