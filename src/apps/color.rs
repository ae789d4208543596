use crate::apps::{App, AppInit, AppRegistry, FieldKind, FieldSpec};
use crate::eval::context::{ExecutionContext, Step};
use crate::eval::engine::Engine;
use crate::foundation::color::Color;
use crate::foundation::error::InkframeResult;

/// Fills the whole image with one color.
struct ColorApp {
    color: Color,
}

impl App for ColorApp {
    fn run(&mut self, _engine: &Engine, ctx: &mut ExecutionContext<'_>) -> Step {
        let px = self.color.to_pixel();
        for p in ctx.image_mut()?.pixels_mut() {
            *p = px;
        }
        Ok(())
    }
}

fn construct(init: AppInit<'_>) -> InkframeResult<Box<dyn App>> {
    Ok(Box::new(ColorApp {
        color: init.config.color("color")?,
    }))
}

pub(crate) fn register(r: &mut AppRegistry) {
    r.register(
        "color",
        vec![FieldSpec::new("color", FieldKind::Color).with_default("#ffffff")],
        construct,
    );
}
