//! Command router.
//!
//! Classifies each inbound message by command, applies dedup/cooldown to
//! notification side effects, maintains the equipment cache and decides
//! whether the message reaches the log sink. Runs once per message on the
//! consumer task; never fails.

pub mod dedup;
pub mod equipment;
pub mod fields;
pub mod rules;

use std::sync::Arc;

use watchpost_core::Message;

use crate::config::DedupSection;
use crate::obs::ConsoleMetrics;
use crate::surface::ConsoleSurface;

pub use dedup::DedupCache;
pub use equipment::{EquipmentChange, EquipmentState, FactoryReading};
pub use fields::MessageFields;
pub use rules::{RouteCtx, Rule, RuleOutcome, DEFAULT_RULE, RULES};

/// Global cooldown between two `fire_confirmed` notifications.
pub const DEFAULT_FIRE_COOLDOWN_MS: i64 = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Forward,
    Absorb,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Forward => "forward",
            Verdict::Absorb => "absorb",
        }
    }
}

/// Outcome of routing one message, with the rule that decided it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    pub rule: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct RouterConfig {
    pub window_ms: i64,
    pub fire_cooldown_ms: i64,
    pub max_entries: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            window_ms: dedup::DEFAULT_WINDOW_MS,
            fire_cooldown_ms: DEFAULT_FIRE_COOLDOWN_MS,
            max_entries: 0,
        }
    }
}

impl From<&DedupSection> for RouterConfig {
    fn from(s: &DedupSection) -> Self {
        Self {
            window_ms: s.window_ms,
            fire_cooldown_ms: s.fire_cooldown_ms,
            max_entries: s.max_entries,
        }
    }
}

/// Cross-message state the rules read and write.
#[derive(Debug)]
pub struct RouterState {
    pub dedup: DedupCache,
    pub equipment: EquipmentState,
    pub last_fire_confirmed_ms: Option<i64>,
    pub fire_cooldown_ms: i64,
    /// Last `ESTOP_STATE` seen; display only.
    pub emergency_stop: Option<bool>,
}

pub struct CommandRouter {
    state: RouterState,
    metrics: Option<Arc<ConsoleMetrics>>,
}

impl Default for CommandRouter {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl CommandRouter {
    pub fn new(cfg: RouterConfig) -> Self {
        Self {
            state: RouterState {
                dedup: DedupCache::new(cfg.window_ms, cfg.max_entries),
                equipment: EquipmentState::default(),
                last_fire_confirmed_ms: None,
                fire_cooldown_ms: cfg.fire_cooldown_ms,
                emergency_stop: None,
            },
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<ConsoleMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Route one message. A `Forward` verdict means `append_json` was called
    /// exactly once with `msg`; `Absorb` means it was not called at all.
    pub fn route(
        &mut self,
        msg: &Message,
        now_ms: i64,
        surface: &mut dyn ConsoleSurface,
    ) -> Decision {
        let fields = MessageFields::extract(msg);
        let mut ctx = RouteCtx {
            msg,
            fields: &fields,
            now_ms,
            state: &mut self.state,
            surface,
            metrics: self.metrics.as_deref(),
        };

        let mut decision = Decision {
            verdict: Verdict::Forward,
            rule: DEFAULT_RULE,
        };
        for rule in RULES.iter() {
            match (rule.apply)(&mut ctx) {
                RuleOutcome::Continue => continue,
                RuleOutcome::Absorb => {
                    decision = Decision {
                        verdict: Verdict::Absorb,
                        rule: rule.name,
                    };
                    break;
                }
                RuleOutcome::Forward => {
                    decision.rule = rule.name;
                    break;
                }
            }
        }

        if decision.verdict == Verdict::Forward {
            ctx.surface.append_json(msg);
        }
        if let Some(m) = &self.metrics {
            m.routed
                .inc(&[("verdict", decision.verdict.as_str()), ("rule", decision.rule)]);
        }
        tracing::trace!(cmd = %fields.cmd, verdict = decision.verdict.as_str(), rule = decision.rule, "routed");
        decision
    }

    pub fn equipment(&self) -> EquipmentState {
        self.state.equipment
    }

    pub fn emergency_stop(&self) -> Option<bool> {
        self.state.emergency_stop
    }

    pub fn dedup(&self) -> &DedupCache {
        &self.state.dedup
    }

    pub fn last_fire_confirmed_ms(&self) -> Option<i64> {
        self.state.last_fire_confirmed_ms
    }
}
