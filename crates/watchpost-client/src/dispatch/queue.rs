//! Budgeted FIFO dispatch queue.
//!
//! Decouples message arrival from routing. Messages are pushed as they
//! arrive; a zero-delay wake-up is armed on the first push after idle; each
//! wake-up routes at most `budget` messages and re-arms itself if any are
//! left, so a burst (reconnect replay, crash-loop spam) never monopolises the
//! consumer.
//!
//! The queue is single-threaded by construction (`Cell`/`RefCell`, so
//! `!Sync`). A wake-up that fires while a drain is already running, e.g.
//! from inside the handler, is a no-op.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use watchpost_core::Message;

/// Messages routed per wake-up unless configured otherwise.
pub const DEFAULT_BUDGET: usize = 200;

/// Arms and cancels the zero-delay wake-up that drives [`DispatchQueue::on_wake`].
pub trait WakeScheduler {
    fn schedule(&self);
    fn cancel(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainPhase {
    Idle,
    Scheduled,
    Draining,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeOutcome {
    /// A drain was already in progress; nothing was done.
    Reentrant,
    /// The queue was shut down.
    Closed,
    Drained { processed: usize, remaining: usize },
}

pub struct DispatchQueue<S: WakeScheduler> {
    queue: RefCell<VecDeque<Message>>,
    phase: Cell<DrainPhase>,
    closed: Cell<bool>,
    budget: usize,
    scheduler: S,
}

impl<S: WakeScheduler> DispatchQueue<S> {
    pub fn new(budget: usize, scheduler: S) -> Self {
        Self {
            queue: RefCell::new(VecDeque::new()),
            phase: Cell::new(DrainPhase::Idle),
            closed: Cell::new(false),
            budget: budget.max(1),
            scheduler,
        }
    }

    /// Append to the tail; arms the wake-up when the queue was idle.
    pub fn push(&self, msg: Message) {
        if self.closed.get() {
            tracing::debug!(cmd = msg.cmd(), "dispatch queue closed; message discarded");
            return;
        }
        self.queue.borrow_mut().push_back(msg);
        if self.phase.get() == DrainPhase::Idle {
            self.phase.set(DrainPhase::Scheduled);
            self.scheduler.schedule();
        }
    }

    /// Wake-up entry point: route up to `budget` messages through `handle`,
    /// in arrival order.
    pub fn on_wake(&self, mut handle: impl FnMut(Message)) -> WakeOutcome {
        if self.closed.get() {
            return WakeOutcome::Closed;
        }
        if self.phase.get() == DrainPhase::Draining {
            tracing::debug!("wake-up during drain ignored");
            return WakeOutcome::Reentrant;
        }
        self.phase.set(DrainPhase::Draining);

        let mut processed = 0;
        while processed < self.budget {
            // the borrow must end before `handle` runs; it may push or wake
            let next = self.queue.borrow_mut().pop_front();
            let Some(msg) = next else { break };
            handle(msg);
            processed += 1;
            if self.closed.get() {
                return WakeOutcome::Closed;
            }
        }

        let remaining = self.queue.borrow().len();
        if remaining > 0 {
            self.phase.set(DrainPhase::Scheduled);
            self.scheduler.schedule();
        } else {
            self.phase.set(DrainPhase::Idle);
        }
        WakeOutcome::Drained {
            processed,
            remaining,
        }
    }

    /// Cancel any pending wake-up and discard everything queued. Later
    /// pushes are dropped. Returns the number of discarded messages.
    pub fn shutdown(&self) -> usize {
        self.closed.set(true);
        self.scheduler.cancel();
        self.phase.set(DrainPhase::Idle);
        let discarded = self.queue.borrow().len();
        self.queue.borrow_mut().clear();
        discarded
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    pub fn phase(&self) -> DrainPhase {
        self.phase.get()
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}
