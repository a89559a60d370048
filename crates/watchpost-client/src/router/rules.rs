//! Ordered routing rules.
//!
//! Each rule inspects the message and returns `Continue` (not mine, or mine
//! but let later rules and the default forward see it), `Absorb` (handled,
//! never reaches the log sink) or `Forward` (send to the log sink now).
//! Dedup inside a rule only gates its notification side effect; it never
//! changes the rule's outcome.

use watchpost_core::Message;

use crate::obs::ConsoleMetrics;
use crate::surface::ConsoleSurface;

use super::equipment::FactoryReading;
use super::fields::MessageFields;
use super::RouterState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    Continue,
    Absorb,
    Forward,
}

/// Everything a rule may read or touch while routing one message.
pub struct RouteCtx<'a> {
    pub msg: &'a Message,
    pub fields: &'a MessageFields,
    pub now_ms: i64,
    pub state: &'a mut RouterState,
    pub surface: &'a mut dyn ConsoleSurface,
    pub metrics: Option<&'a ConsoleMetrics>,
}

impl RouteCtx<'_> {
    fn dedup(&mut self, key: &str) -> bool {
        self.state.dedup.check(key, self.now_ms)
    }

    fn suppressed(&self, rule: &str) {
        tracing::debug!(rule, cmd = %self.fields.cmd, id = %self.fields.id, "side effect suppressed");
        if let Some(m) = self.metrics {
            m.dedup_suppressed.inc(&[("rule", rule)]);
        }
    }
}

pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&mut RouteCtx<'_>) -> RuleOutcome,
}

/// Priority order; the first `Absorb`/`Forward` wins.
pub const RULES: [Rule; 6] = [
    Rule { name: "estop_state", apply: estop_state },
    Rule { name: "fire_event", apply: fire_event },
    Rule { name: "go_to_fail", apply: go_to_fail },
    Rule { name: "upload_failed", apply: upload_failed },
    Rule { name: "upload_ok", apply: upload_ok },
    Rule { name: "factory_push", apply: factory_push },
];

/// Name reported when no rule terminated and the message was forwarded.
pub const DEFAULT_RULE: &str = "default";

const FACTORY_CMDS: [&str; 3] = ["FACTORY_DATA", "FACTORY_UPDATE", "FACTORY_DATA_PUSH"];

fn label(id: &str, detail: &str) -> String {
    match (id.is_empty(), detail.is_empty()) {
        (true, true) => "-".to_string(),
        (false, true) => id.to_string(),
        (true, false) => detail.to_string(),
        (false, false) => format!("{id}: {detail}"),
    }
}

fn estop_state(ctx: &mut RouteCtx<'_>) -> RuleOutcome {
    if ctx.fields.cmd != "ESTOP_STATE" {
        return RuleOutcome::Continue;
    }
    let engaged = ctx.msg.bool_field("engaged").unwrap_or(false);
    ctx.state.emergency_stop = Some(engaged);
    ctx.surface.set_emergency_stop(engaged);
    RuleOutcome::Continue
}

fn fire_event(ctx: &mut RouteCtx<'_>) -> RuleOutcome {
    if ctx.fields.cmd != "FIRE_EVENT" {
        return RuleOutcome::Continue;
    }

    if ctx.fields.event_is("fire_confirmed") {
        let cooled = ctx
            .state
            .last_fire_confirmed_ms
            .map_or(true, |last| ctx.now_ms - last >= ctx.state.fire_cooldown_ms);
        if !cooled {
            ctx.suppressed("fire_cooldown");
            return RuleOutcome::Absorb;
        }

        let key = format!("FIRE_EVENT|confirmed|{}", ctx.fields.id);
        if ctx.dedup(&key) {
            ctx.surface
                .notify("Fire confirmed", &label(&ctx.fields.id, ""));
            ctx.state.last_fire_confirmed_ms = Some(ctx.now_ms);
        } else {
            ctx.suppressed("fire_confirmed");
        }
        return RuleOutcome::Absorb;
    }

    if ctx.fields.event_is("session_ended") {
        let key = format!("FIRE_EVENT|ended|{}", ctx.fields.id);
        if ctx.dedup(&key) {
            ctx.surface
                .notify("Fire session ended", &label(&ctx.fields.id, ""));
        } else {
            ctx.suppressed("session_ended");
        }
        return RuleOutcome::Absorb;
    }

    // other sub-events are shown elsewhere; keep them out of the log sink
    RuleOutcome::Absorb
}

fn go_to_fail(ctx: &mut RouteCtx<'_>) -> RuleOutcome {
    if ctx.fields.cmd != "GO_TO_FAIL" {
        return RuleOutcome::Continue;
    }
    let key = format!("GO_TO_FAIL|{}|{}", ctx.fields.id, ctx.fields.reason);
    if ctx.dedup(&key) {
        ctx.surface
            .notify("Robot move failed", &label(&ctx.fields.id, &ctx.fields.reason));
    } else {
        ctx.suppressed("go_to_fail");
    }
    RuleOutcome::Continue
}

fn upload_failed(ctx: &mut RouteCtx<'_>) -> RuleOutcome {
    if ctx.fields.cmd != "UPLOAD_DONE" || ctx.fields.ok {
        return RuleOutcome::Continue;
    }
    let f = ctx.fields;
    let key = format!("UPLOAD_DONE|FAIL|{}|{}|{}", f.id, f.saved_path, f.reason);
    if ctx.dedup(&key) {
        ctx.surface
            .notify("Evidence upload failed", &label(&f.id, &f.reason));
    } else {
        ctx.suppressed("upload_failed");
    }
    RuleOutcome::Continue
}

fn upload_ok(ctx: &mut RouteCtx<'_>) -> RuleOutcome {
    if ctx.fields.cmd != "UPLOAD_DONE" || !ctx.fields.ok {
        return RuleOutcome::Continue;
    }
    let f = ctx.fields;
    let key = format!("UPLOAD_DONE|OK|{}|{}", f.id, f.saved_path);
    if ctx.dedup(&key) {
        ctx.surface
            .notify("Evidence uploaded", &label(&f.id, &f.saved_path));
    } else {
        ctx.suppressed("upload_ok");
    }
    RuleOutcome::Continue
}

fn factory_push(ctx: &mut RouteCtx<'_>) -> RuleOutcome {
    if !FACTORY_CMDS.contains(&ctx.fields.cmd.as_str()) {
        return RuleOutcome::Continue;
    }
    let reading = FactoryReading::parse(ctx.msg);
    let change = ctx.state.equipment.apply(&reading);
    if change.run || change.door {
        let eq = ctx.state.equipment;
        ctx.surface.set_factory_state(eq.run, eq.door);
    }
    if change.any() {
        tracing::debug!(?change, state = ?ctx.state.equipment, "equipment state updated");
    }
    // state pushes never reach the log sink, changed or not
    RuleOutcome::Absorb
}
