//! Single-threaded cooperative event queue.
//!
//! Check completion is always deferred to a later turn of this queue, even
//! when the verdict is known synchronously. Nothing here blocks: a task runs
//! only when the owner drives the queue with [`Scheduler::turn`] or
//! [`Scheduler::run_until_idle`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

/// FIFO queue of deferred tasks.
///
/// Shared by `Rc` between the caller driving it and the checks scheduling
/// onto it. Tasks may schedule further tasks while running; those land at
/// the back of the queue and run on a later turn.
#[derive(Default)]
pub struct Scheduler {
    queue: RefCell<VecDeque<Task>>,
}

impl Scheduler {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Enqueue `task` to run on a later turn.
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(task));
    }

    /// Number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run the oldest queued task. Returns `false` when the queue was empty.
    pub fn turn(&self) -> bool {
        // The borrow must end before the task runs so it can defer more work.
        let next = self.queue.borrow_mut().pop_front();
        match next {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Drive the queue until no task remains. Returns the number of turns taken.
    pub fn run_until_idle(&self) -> usize {
        let mut turns = 0;
        while self.turn() {
            turns += 1;
        }
        turns
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.pending())
            .finish()
    }
}
