//! Per-invocation execution context handed to evaluation logic.
//!
//! Each `Check::run` that applies allocates one [`Invocation`]: the carrier
//! being populated, the async flag, and the completion channel. The
//! channel settles at most once. The first resolve or reject wins and any
//! later attempt is logged and dropped.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::check::result::CheckResult;
use crate::error::{CheckError, EvaluationError};
use crate::schedule::Scheduler;

/// What a check's completion channel receives.
///
/// `Ok(None)` means the check did not apply (disabled or not matching),
/// which is distinct from a `false` verdict.
pub type CheckOutcome = Result<Option<CheckResult>, CheckError>;

pub(crate) type Completion = Box<dyn FnOnce(CheckOutcome)>;

pub(crate) struct Invocation {
    check_id: String,
    carrier: RefCell<Option<CheckResult>>,
    is_async: Cell<bool>,
    handles: Cell<usize>,
    completion: RefCell<Option<Completion>>,
    scheduler: Rc<Scheduler>,
}

impl Invocation {
    pub(crate) fn new(check_id: &str, scheduler: Rc<Scheduler>, completion: Completion) -> Rc<Self> {
        Rc::new(Self {
            check_id: check_id.to_string(),
            carrier: RefCell::new(Some(CheckResult::new(check_id))),
            is_async: Cell::new(false),
            handles: Cell::new(0),
            completion: RefCell::new(Some(completion)),
            scheduler,
        })
    }

    pub(crate) fn is_async(&self) -> bool {
        self.is_async.get()
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.completion.borrow().is_none()
    }

    pub(crate) fn resolve(&self, verdict: Value) {
        let Some(completion) = self.take_completion("resolve") else {
            return;
        };
        let mut carrier = self
            .carrier
            .borrow_mut()
            .take()
            .unwrap_or_else(|| CheckResult::new(self.check_id.as_str()));
        carrier.result = verdict;
        debug!(check = %self.check_id, result = %carrier.result, "check resolved");
        self.scheduler
            .defer(move || completion(Ok(Some(carrier))));
    }

    pub(crate) fn reject(&self, error: EvaluationError) {
        if let Some((completion, error)) = self.rejection(error) {
            self.scheduler.defer(move || completion(Err(error)));
        }
    }

    /// Rejects in the caller's stack, for errors raised by the evaluation
    /// call itself.
    pub(crate) fn reject_now(&self, error: EvaluationError) {
        if let Some((completion, error)) = self.rejection(error) {
            completion(Err(error));
        }
    }

    fn rejection(&self, error: EvaluationError) -> Option<(Completion, CheckError)> {
        let completion = self.take_completion("reject")?;
        self.carrier.borrow_mut().take();
        debug!(check = %self.check_id, %error, "check rejected");
        let error = CheckError::Evaluation {
            check_id: self.check_id.clone(),
            source: error,
        };
        Some((completion, error))
    }

    fn take_completion(&self, attempt: &str) -> Option<Completion> {
        let completion = self.completion.borrow_mut().take();
        if completion.is_none() {
            warn!(
                check = %self.check_id,
                attempt,
                "check already settled; ignoring repeated completion"
            );
        }
        completion
    }
}

/// The execution context evaluation logic runs against.
///
/// Offers exactly two capabilities: declaring the evaluation asynchronous
/// and attaching auxiliary data. Cloning is cheap and clones refer to the
/// same invocation, so a clone may be moved into deferred work.
#[derive(Clone)]
pub struct EvaluationHelper {
    invocation: Rc<Invocation>,
}

impl EvaluationHelper {
    pub(crate) fn new(invocation: Rc<Invocation>) -> Self {
        Self { invocation }
    }

    /// Marks this invocation as asynchronous and returns its completion.
    ///
    /// Once called, the value returned by the evaluation function is
    /// ignored and the check settles only through the returned handle.
    /// Calling this more than once hands out handles to the same channel.
    pub fn asynchronous(&self) -> AsyncCompletion {
        self.invocation.is_async.set(true);
        let handles = &self.invocation.handles;
        handles.set(handles.get() + 1);
        AsyncCompletion {
            invocation: Rc::clone(&self.invocation),
        }
    }

    /// Attaches `payload` to the result. Last write wins.
    pub fn data(&self, payload: impl Into<Value>) {
        match self.invocation.carrier.borrow_mut().as_mut() {
            Some(carrier) => carrier.data = payload.into(),
            None => debug!(
                check = %self.invocation.check_id,
                "data attached after settlement; dropped"
            ),
        }
    }
}

impl std::fmt::Debug for EvaluationHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationHelper")
            .field("check_id", &self.invocation.check_id)
            .field("is_async", &self.invocation.is_async())
            .finish()
    }
}

/// Single-use completion of an asynchronous evaluation.
///
/// Every method consumes the handle. Dropping the last outstanding handle
/// of an unsettled invocation rejects it, so the check still settles.
#[must_use = "an asynchronous check only settles through its completion"]
pub struct AsyncCompletion {
    invocation: Rc<Invocation>,
}

impl AsyncCompletion {
    pub fn resolve(self, verdict: impl Into<Value>) {
        self.invocation.resolve(verdict.into());
    }

    pub fn reject(self, error: EvaluationError) {
        self.invocation.reject(error);
    }

    pub fn complete(self, outcome: Result<Value, EvaluationError>) {
        match outcome {
            Ok(verdict) => self.resolve(verdict),
            Err(error) => self.reject(error),
        }
    }
}

impl Drop for AsyncCompletion {
    fn drop(&mut self) {
        let handles = &self.invocation.handles;
        let remaining = handles.get().saturating_sub(1);
        handles.set(remaining);
        if remaining == 0 && !self.invocation.is_settled() {
            warn!(
                check = %self.invocation.check_id,
                "asynchronous completion dropped before settling"
            );
            self.invocation
                .reject(EvaluationError::failed("completion dropped before settling"));
        }
    }
}

impl std::fmt::Debug for AsyncCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncCompletion")
            .field("check_id", &self.invocation.check_id)
            .finish()
    }
}
