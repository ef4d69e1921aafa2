//! Event dispatcher with explicit deferral.
//!
//! One event is processed at a time. Before a new event is handled, every
//! deferred event whose backoff has elapsed is re-delivered, oldest first.
//! An event the reconciler defers is queued again with a delay from the
//! retry policy until its budget runs out, at which point it is dropped.

use tracing::{debug, warn};

use super::queue::DeferQueue;
use super::retry::{DeferralBudget, RetryPolicy};
use crate::error::Result;
use crate::reconcile::{Collaborators, Outcome, Reconciler};
use crate::types::event::Event;

/// One processed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handled {
    pub event: Event,
    pub outcome: Outcome,
    /// Whether this was a re-delivery of a deferred event.
    pub redelivered: bool,
}

pub struct Dispatcher {
    reconciler: Reconciler,
    queue: DeferQueue,
    budget: DeferralBudget,
}

impl Dispatcher {
    pub fn new(reconciler: Reconciler, policy: RetryPolicy) -> Self {
        Dispatcher {
            reconciler,
            queue: DeferQueue::new(),
            budget: DeferralBudget::new(policy),
        }
    }

    /// Build a dispatcher whose retry policy comes from the reconciler's settings.
    pub fn from_reconciler(reconciler: Reconciler) -> Self {
        let policy = RetryPolicy::from(&reconciler.settings().retry);
        Self::new(reconciler, policy)
    }

    pub fn queue(&self) -> &DeferQueue {
        &self.queue
    }

    /// Re-deliver due events, then handle `event`.
    pub fn deliver(
        &mut self,
        event: Event,
        now_ms: u64,
        ctx: &mut Collaborators<'_>,
    ) -> Result<Vec<Handled>> {
        let mut handled = self.tick(now_ms, ctx)?;
        // A fresh event supersedes a not-yet-due deferred copy of itself.
        self.queue.cancel(&event.key());
        let outcome = self.run(&event, now_ms, ctx)?;
        handled.push(Handled {
            event,
            outcome,
            redelivered: false,
        });
        Ok(handled)
    }

    /// Re-deliver every deferred event that is due at `now_ms`.
    pub fn tick(&mut self, now_ms: u64, ctx: &mut Collaborators<'_>) -> Result<Vec<Handled>> {
        let mut handled = Vec::new();
        let mut due = self.queue.take_due(now_ms).into_iter();
        while let Some(event) = due.next() {
            debug!(event = %event.key(), "re-delivering deferred event");
            match self.run(&event, now_ms, ctx) {
                Ok(outcome) => handled.push(Handled {
                    event,
                    outcome,
                    redelivered: true,
                }),
                Err(e) => {
                    // Events not reached yet stay queued, in their original order.
                    for rest in due {
                        self.queue.defer(rest, now_ms);
                    }
                    return Err(e);
                }
            }
        }
        Ok(handled)
    }

    fn run(&mut self, event: &Event, now_ms: u64, ctx: &mut Collaborators<'_>) -> Result<Outcome> {
        let key = event.key();
        let outcome = self.reconciler.handle(event, ctx)?;
        if !outcome.deferred {
            self.budget.settle(&key);
            return Ok(outcome);
        }

        let attempts = self.budget.deferrals(&key) + 1;
        match self.budget.defer(&key) {
            Some(delay) => self.queue.defer(event.clone(), now_ms.saturating_add(delay)),
            None => warn!(
                event = %key,
                attempts,
                "retry budget exhausted, dropping deferred event"
            ),
        }
        Ok(outcome)
    }
}
