use crate::apps::{App, AppInit, AppRegistry, FieldKind, FieldSpec};
use crate::eval::context::{ExecutionContext, Signal, Step};
use crate::eval::engine::Engine;
use crate::expression::eval::Condition;
use crate::foundation::error::InkframeResult;

/// Conditional branch.
///
/// Evaluates its condition against scene state, then explicitly runs the chain attached to the
/// `then` or `else` handle. The default-chain walk does not continue past this node.
struct IfApp {
    node_id: String,
    condition: Condition,
}

impl App for IfApp {
    fn run(&mut self, engine: &Engine, ctx: &mut ExecutionContext<'_>) -> Step {
        let taken = self.condition.evaluate(&ctx.state)?;
        let handle = if taken { "then" } else { "else" };
        let target = engine.field_target(&self.node_id, handle).ok_or_else(|| {
            Signal::run(format!(
                "condition '{}' selected '{handle}' but no node is connected to it",
                self.condition.source()
            ))
        })?;
        engine.run_chain(target, ctx)
    }

    fn ends_chain(&self) -> bool {
        true
    }
}

fn construct(init: AppInit<'_>) -> InkframeResult<Box<dyn App>> {
    let src = init.config.str("condition")?;
    let condition = Condition::parse(src)?;
    Ok(Box::new(IfApp {
        node_id: init.node.id.clone(),
        condition,
    }))
}

pub(crate) fn register(r: &mut AppRegistry) {
    r.register(
        "if",
        vec![FieldSpec::new("condition", FieldKind::String).required()],
        construct,
    );
}
