#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::cell::Cell;
use std::rc::Rc;

use watchpost_client::dispatch::{DispatchQueue, DrainPhase, WakeOutcome, WakeScheduler};
use watchpost_core::Message;

#[derive(Clone, Default)]
struct CountingScheduler {
    scheduled: Rc<Cell<usize>>,
    cancelled: Rc<Cell<usize>>,
}

impl WakeScheduler for CountingScheduler {
    fn schedule(&self) {
        self.scheduled.set(self.scheduled.get() + 1);
    }
    fn cancel(&self) {
        self.cancelled.set(self.cancelled.get() + 1);
    }
}

fn seq(n: usize) -> Message {
    Message::new("ROBOT_EVENT").with("seq", n as u64)
}

fn seq_of(msg: &Message) -> u64 {
    msg.get("seq").and_then(|v| v.as_u64()).unwrap()
}

#[test]
fn burst_is_drained_in_budgeted_slices() {
    let sched = CountingScheduler::default();
    let q = DispatchQueue::new(200, sched.clone());
    for i in 0..500 {
        q.push(seq(i));
    }
    // only the first push after idle arms the wake-up
    assert_eq!(sched.scheduled.get(), 1);
    assert_eq!(q.phase(), DrainPhase::Scheduled);

    let mut seen = Vec::new();
    let first = q.on_wake(|m| seen.push(seq_of(&m)));
    assert_eq!(
        first,
        WakeOutcome::Drained {
            processed: 200,
            remaining: 300
        }
    );
    assert_eq!(sched.scheduled.get(), 2);

    let second = q.on_wake(|m| seen.push(seq_of(&m)));
    assert_eq!(
        second,
        WakeOutcome::Drained {
            processed: 200,
            remaining: 100
        }
    );
    let third = q.on_wake(|m| seen.push(seq_of(&m)));
    assert_eq!(
        third,
        WakeOutcome::Drained {
            processed: 100,
            remaining: 0
        }
    );

    assert_eq!(q.phase(), DrainPhase::Idle);
    assert_eq!(sched.scheduled.get(), 3);
    assert_eq!(seen, (0..500).collect::<Vec<u64>>());
}

#[test]
fn wake_during_drain_is_a_no_op() {
    let q = DispatchQueue::new(10, CountingScheduler::default());
    for i in 0..3 {
        q.push(seq(i));
    }

    let depth = Cell::new(0usize);
    let max_depth = Cell::new(0usize);
    let mut inner = Vec::new();
    let mut handled = Vec::new();

    let outcome = q.on_wake(|m| {
        depth.set(depth.get() + 1);
        max_depth.set(max_depth.get().max(depth.get()));
        inner.push(q.on_wake(|_| panic!("nested drain must not route")));
        handled.push(seq_of(&m));
        depth.set(depth.get() - 1);
    });

    assert_eq!(
        outcome,
        WakeOutcome::Drained {
            processed: 3,
            remaining: 0
        }
    );
    assert_eq!(max_depth.get(), 1);
    assert!(inner.iter().all(|o| *o == WakeOutcome::Reentrant));
    assert_eq!(handled, vec![0, 1, 2]);
}

#[test]
fn push_from_handler_is_routed_later_in_order() {
    let sched = CountingScheduler::default();
    let q = DispatchQueue::new(2, sched.clone());
    q.push(seq(0));
    q.push(seq(1));

    let mut seen = Vec::new();
    q.on_wake(|m| {
        let n = seq_of(&m);
        if n == 0 {
            q.push(seq(2));
        }
        seen.push(n);
    });
    assert_eq!(seen, vec![0, 1]);
    assert_eq!(q.len(), 1);
    assert_eq!(q.phase(), DrainPhase::Scheduled);

    q.on_wake(|m| seen.push(seq_of(&m)));
    assert_eq!(seen, vec![0, 1, 2]);
    assert!(q.is_empty());
}

#[test]
fn shutdown_discards_and_blocks_further_work() {
    let sched = CountingScheduler::default();
    let q = DispatchQueue::new(200, sched.clone());
    for i in 0..5 {
        q.push(seq(i));
    }
    assert_eq!(q.shutdown(), 5);
    assert_eq!(sched.cancelled.get(), 1);
    assert!(q.is_closed());

    q.push(seq(9));
    assert!(q.is_empty());
    assert_eq!(q.on_wake(|_| panic!("closed queue must not route")), WakeOutcome::Closed);
}

#[test]
fn shutdown_from_handler_stops_the_drain() {
    let q = DispatchQueue::new(200, CountingScheduler::default());
    for i in 0..4 {
        q.push(seq(i));
    }
    let mut seen = Vec::new();
    let outcome = q.on_wake(|m| {
        seen.push(seq_of(&m));
        q.shutdown();
    });
    assert_eq!(outcome, WakeOutcome::Closed);
    assert_eq!(seen, vec![0]);
    assert!(q.is_empty());
}

#[test]
fn zero_budget_is_clamped_to_one() {
    let q = DispatchQueue::new(0, CountingScheduler::default());
    assert_eq!(q.budget(), 1);
}
