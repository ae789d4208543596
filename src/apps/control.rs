use crate::apps::{App, AppInit, AppRegistry, FieldKind, FieldSpec};
use crate::eval::context::{ExecutionContext, Signal, Step};
use crate::eval::engine::Engine;
use crate::expression::eval::Condition;
use crate::foundation::error::InkframeResult;
use serde_json::Value;

/// Asks the coordinator for a fresh top-level render.
struct RerenderApp {
    trigger: String,
}

impl App for RerenderApp {
    fn run(&mut self, engine: &Engine, _ctx: &mut ExecutionContext<'_>) -> Step {
        engine.request_rerender(&self.trigger);
        Ok(())
    }
}

/// Short-circuits the whole dispatch, optionally only when a condition holds.
struct HaltApp {
    condition: Option<Condition>,
    reason: String,
}

impl App for HaltApp {
    fn run(&mut self, _engine: &Engine, ctx: &mut ExecutionContext<'_>) -> Step {
        let halt = match &self.condition {
            Some(c) => c.evaluate(&ctx.state)?,
            None => true,
        };
        if halt {
            return Err(Signal::halt(self.reason.clone()));
        }
        Ok(())
    }
}

/// Writes a fixed value into scene state.
struct SetStateApp {
    key: String,
    value: Value,
}

impl App for SetStateApp {
    fn run(&mut self, _engine: &Engine, ctx: &mut ExecutionContext<'_>) -> Step {
        ctx.state.insert(self.key.clone(), self.value.clone());
        Ok(())
    }
}

fn rerender(init: AppInit<'_>) -> InkframeResult<Box<dyn App>> {
    Ok(Box::new(RerenderApp {
        trigger: format!("app:{}", init.node.id),
    }))
}

fn halt(init: AppInit<'_>) -> InkframeResult<Box<dyn App>> {
    let condition = match init.config.opt_str("condition") {
        Some(src) => Some(Condition::parse(src)?),
        None => None,
    };
    Ok(Box::new(HaltApp {
        condition,
        reason: init.config.str("reason")?.to_owned(),
    }))
}

fn set_state(init: AppInit<'_>) -> InkframeResult<Box<dyn App>> {
    Ok(Box::new(SetStateApp {
        key: init.config.str("key")?.to_owned(),
        value: init.config.get("value").cloned().unwrap_or(Value::Null),
    }))
}

pub(crate) fn register(r: &mut AppRegistry) {
    r.register("rerender", vec![], rerender);
    r.register(
        "halt",
        vec![
            FieldSpec::new("condition", FieldKind::String).with_default(""),
            FieldSpec::new("reason", FieldKind::String).with_default("halted by scene"),
        ],
        halt,
    );
    r.register(
        "set_state",
        vec![
            FieldSpec::new("key", FieldKind::String).required(),
            FieldSpec::new("value", FieldKind::Json),
        ],
        set_state,
    );
}
