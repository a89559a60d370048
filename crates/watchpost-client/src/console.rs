//! Consumer-side runtime.
//!
//! Owns the dispatch queue, the router and the surface on a single task.
//! Transport events arrive over the client's channel; messages go through
//! the budgeted queue, everything else is reflected on the surface directly.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Notify};

use watchpost_core::Message;

use crate::clock::{system_clock, Clock};
use crate::config::ConsoleConfig;
use crate::dispatch::{DispatchQueue, NotifyScheduler, WakeOutcome};
use crate::obs::ConsoleMetrics;
use crate::router::{CommandRouter, RouterConfig};
use crate::surface::ConsoleSurface;
use crate::transport::ClientEvent;

pub struct Console<S: ConsoleSurface> {
    router: CommandRouter,
    queue: DispatchQueue<NotifyScheduler>,
    wake: Arc<Notify>,
    surface: S,
    metrics: Arc<ConsoleMetrics>,
    clock: Clock,
}

impl<S: ConsoleSurface> Console<S> {
    pub fn new(cfg: &ConsoleConfig, surface: S, metrics: Arc<ConsoleMetrics>) -> Self {
        let scheduler = NotifyScheduler::new();
        let wake = scheduler.notify();
        Self {
            router: CommandRouter::new(RouterConfig::from(&cfg.dedup))
                .with_metrics(Arc::clone(&metrics)),
            queue: DispatchQueue::new(cfg.dispatch.budget, scheduler),
            wake,
            surface,
            metrics,
            clock: system_clock,
        }
    }

    /// Replace the routing clock (epoch milliseconds).
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Run until `shutdown` resolves or the transport task goes away, then
    /// tear the queue down.
    pub async fn run<F>(&mut self, mut events: mpsc::UnboundedReceiver<ClientEvent>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let wake = Arc::clone(&self.wake);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("console shutdown requested");
                    break;
                }
                ev = events.recv() => match ev {
                    Some(ev) => self.handle_event(ev),
                    None => {
                        tracing::info!("transport task ended");
                        while !self.queue.is_empty() {
                            self.drain();
                        }
                        break;
                    }
                },
                _ = wake.notified() => {
                    self.drain();
                }
            }
        }

        let discarded = self.queue.shutdown();
        if discarded > 0 {
            tracing::warn!(discarded, "dispatch queue torn down with pending messages");
        }
        self.metrics.dispatch_queue_depth.set(&[], 0);
    }

    /// Apply one transport event.
    pub fn handle_event(&mut self, ev: ClientEvent) {
        match ev {
            ClientEvent::Message(msg) => self.enqueue(msg),
            ClientEvent::StateChanged(state) => self.surface.set_connection_state(state),
            ClientEvent::Error(err) => {
                tracing::warn!(error = %err, "network error");
                self.surface.set_network_error(&err);
            }
        }
    }

    pub fn enqueue(&mut self, msg: Message) {
        self.queue.push(msg);
        self.metrics
            .dispatch_queue_depth
            .set(&[], self.queue.len() as i64);
    }

    /// One wake-up: route up to `budget` queued messages.
    pub fn drain(&mut self) -> WakeOutcome {
        let started = Instant::now();
        let now_ms = (self.clock)();
        let router = &mut self.router;
        let surface = &mut self.surface;

        let outcome = self.queue.on_wake(|msg| {
            router.route(&msg, now_ms, &mut *surface);
        });

        if let WakeOutcome::Drained { processed, remaining } = outcome {
            if processed > 0 {
                self.metrics.drain_duration.observe(&[], started.elapsed());
                tracing::debug!(processed, remaining, "dispatch drain");
            }
            self.metrics.dispatch_queue_depth.set(&[], remaining as i64);
        }
        outcome
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}
