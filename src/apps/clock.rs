use crate::apps::glyphs::{GLYPH_H, draw_text, text_width};
use crate::apps::{App, AppInit, AppRegistry, FieldKind, FieldSpec};
use crate::eval::context::{ExecutionContext, Signal, Step};
use crate::eval::engine::Engine;
use crate::foundation::color::Color;
use crate::foundation::error::{InkframeError, InkframeResult};
use time::OffsetDateTime;
use time::format_description;

const POSITIONS: &[&str] = &["top-left", "top-right", "bottom-left", "bottom-right", "center"];

/// Draws the current time.
struct ClockApp {
    format: String,
    position: String,
    scale: u32,
    margin: i64,
    color: Color,
    utc: bool,
}

impl ClockApp {
    fn now(&self) -> OffsetDateTime {
        if self.utc {
            return OffsetDateTime::now_utc();
        }
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }

    fn format_time(&self, at: OffsetDateTime) -> Result<String, InkframeError> {
        let items = format_description::parse(&self.format)
            .map_err(|e| InkframeError::run(format!("clock format: {e}")))?;
        at.format(&items[..])
            .map_err(|e| InkframeError::run(format!("clock format: {e}")))
    }
}

impl App for ClockApp {
    fn run(&mut self, _engine: &Engine, ctx: &mut ExecutionContext<'_>) -> Step {
        let text = self.format_time(self.now())?;
        let img = ctx.image_mut()?;

        let (w, h) = (i64::from(img.width()), i64::from(img.height()));
        let tw = i64::from(text_width(&text, self.scale));
        let th = i64::from(GLYPH_H * self.scale);
        let m = self.margin;
        let (x, y) = match self.position.as_str() {
            "top-left" => (m, m),
            "top-right" => (w - tw - m, m),
            "bottom-left" => (m, h - th - m),
            "bottom-right" => (w - tw - m, h - th - m),
            "center" => ((w - tw) / 2, (h - th) / 2),
            other => return Err(Signal::run(format!("unknown clock position '{other}'"))),
        };
        draw_text(img, &text, x, y, self.scale, self.color.to_pixel());
        ctx.state
            .insert("clock".to_owned(), serde_json::Value::String(text));
        Ok(())
    }
}

fn construct(init: AppInit<'_>) -> InkframeResult<Box<dyn App>> {
    let c = &init.config;
    let format = c.str("format")?.to_owned();
    format_description::parse(&format)
        .map_err(|e| InkframeError::config(format!("invalid clock format '{format}': {e}")))?;
    let scale = c.i64("scale")?;
    if !(1..=64).contains(&scale) {
        return Err(InkframeError::config(format!(
            "clock scale must be within 1..=64 (got {scale})"
        )));
    }
    Ok(Box::new(ClockApp {
        format,
        position: c.str("position")?.to_owned(),
        scale: scale as u32,
        margin: c.i64("margin")?,
        color: c.color("color")?,
        utc: c.bool("utc")?,
    }))
}

pub(crate) fn register(r: &mut AppRegistry) {
    r.register(
        "clock",
        vec![
            FieldSpec::new("format", FieldKind::String).with_default("[hour]:[minute]"),
            FieldSpec::new("position", FieldKind::Select)
                .with_options(POSITIONS)
                .with_default("center"),
            FieldSpec::new("scale", FieldKind::Integer).with_default(4),
            FieldSpec::new("margin", FieldKind::Integer).with_default(8),
            FieldSpec::new("color", FieldKind::Color).with_default("#000000"),
            FieldSpec::new("utc", FieldKind::Boolean).with_default(false),
        ],
        construct,
    );
}
