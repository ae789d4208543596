use crate::apps::{App, AppInit, AppRegistry, FieldKind, FieldSpec};
use crate::eval::context::{ExecutionContext, Signal, Step};
use crate::eval::engine::Engine;
use crate::foundation::core::{Canvas, Rect};
use crate::foundation::error::{InkframeError, InkframeResult};
use crate::scene::model::JsonMap;
use image::imageops;

const MAX_CELLS_PER_AXIS: u32 = 100;

/// Layout of a `rows x columns` grid over an image.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    /// Number of rows, at least 1.
    pub rows: u32,
    /// Number of columns, at least 1.
    pub columns: u32,
    /// Outer margin: top, right, bottom, left.
    pub margin: [u32; 4],
    /// Gap between rows, then between columns.
    pub gap: [u32; 2],
    /// Relative row heights. Empty or wrong length means equal.
    pub row_ratios: Vec<f64>,
    /// Relative column widths. Empty or wrong length means equal.
    pub column_ratios: Vec<f64>,
}

impl GridSpec {
    /// Equal grid without margins or gaps.
    pub fn new(rows: u32, columns: u32) -> Self {
        Self {
            rows: rows.max(1),
            columns: columns.max(1),
            margin: [0; 4],
            gap: [0; 2],
            row_ratios: Vec::new(),
            column_ratios: Vec::new(),
        }
    }
}

/// Cell rectangles in row-major order.
///
/// The interior (canvas minus margins and gaps) is distributed proportionally to the ratios,
/// rounding down; the last row and column absorb the remainder so the cells tile the interior
/// exactly.
pub fn grid_cells(spec: &GridSpec, canvas: Canvas) -> Vec<Rect> {
    let [top, right, bottom, left] = spec.margin;
    let [row_gap, col_gap] = spec.gap;
    let rows = spec.rows.max(1);
    let columns = spec.columns.max(1);

    let avail_w = canvas
        .width
        .saturating_sub(left.saturating_add(right))
        .saturating_sub(col_gap.saturating_mul(columns - 1));
    let avail_h = canvas
        .height
        .saturating_sub(top.saturating_add(bottom))
        .saturating_sub(row_gap.saturating_mul(rows - 1));

    let widths = allocate(avail_w, &spec.column_ratios, columns);
    let heights = allocate(avail_h, &spec.row_ratios, rows);

    let mut cells = Vec::with_capacity((rows * columns) as usize);
    let mut y = top;
    for h in &heights {
        let mut x = left;
        for w in &widths {
            cells.push(Rect::new(x, y, *w, *h));
            x += w + col_gap;
        }
        y += h + row_gap;
    }
    cells
}

fn allocate(total: u32, ratios: &[f64], n: u32) -> Vec<u32> {
    let usable = ratios.len() == n as usize && ratios.iter().all(|r| r.is_finite() && *r > 0.0);
    let equal = vec![1.0; n as usize];
    let ratios = if usable { ratios } else { equal.as_slice() };
    let sum: f64 = ratios.iter().sum();

    let mut out = Vec::with_capacity(n as usize);
    let mut used = 0u32;
    for r in &ratios[..ratios.len() - 1] {
        let size = ((f64::from(total) * r / sum).floor() as u32).min(total - used);
        used += size;
        out.push(size);
    }
    out.push(total - used);
    out
}

/// Splits the image into a grid and renders each cell through the sub-pipeline attached to the
/// `render_function` handle.
///
/// Cells run one after another in row-major order. Each gets a child context with copies of
/// payload and state plus `row`/`column`. Any fault inside a cell aborts the whole split.
struct SplitApp {
    node_id: String,
    grid: GridSpec,
}

impl App for SplitApp {
    fn run(&mut self, engine: &Engine, ctx: &mut ExecutionContext<'_>) -> Step {
        let target = engine
            .field_target(&self.node_id, "render_function")
            .ok_or_else(|| Signal::run("no node is connected to 'render_function'"))?;
        let canvas = Canvas::of(ctx.image_mut()?);
        let cells = grid_cells(&self.grid, canvas);

        for (i, cell) in cells.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            let row = i as u32 / self.grid.columns;
            let column = i as u32 % self.grid.columns;

            let crop = match &ctx.image {
                Some(img) => imageops::crop_imm(img, cell.x, cell.y, cell.width, cell.height).to_image(),
                None => return Err(Signal::run("image disappeared during split")),
            };
            let mut extra = JsonMap::new();
            extra.insert("row".to_owned(), row.into());
            extra.insert("column".to_owned(), column.into());

            let (image, ran, errored, outcome) = {
                let mut child = ctx.child(&extra, Some(crop));
                let outcome = engine.run_chain_until_fault(target, &mut child);
                (
                    child.image.take(),
                    std::mem::take(&mut child.apps_ran),
                    std::mem::take(&mut child.apps_errored),
                    outcome,
                )
            };
            ctx.apps_ran.extend(ran);
            ctx.apps_errored.extend(errored.iter().cloned());
            outcome?;
            if !errored.is_empty() {
                return Err(Signal::run(format!(
                    "cell (row {row}, column {column}) failed in {}",
                    errored.join(", ")
                )));
            }

            if let Some(img) = image {
                let img = if img.dimensions() == (cell.width, cell.height) {
                    img
                } else {
                    imageops::crop_imm(&img, 0, 0, cell.width, cell.height).to_image()
                };
                imageops::replace(ctx.image_mut()?, &img, i64::from(cell.x), i64::from(cell.y));
            }
        }
        Ok(())
    }
}

fn parse_numbers(field: &str, s: &str) -> InkframeResult<Vec<f64>> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or_else(|| {
                    InkframeError::config(format!("{field}: '{t}' is not a non-negative number"))
                })
        })
        .collect()
}

fn parse_pixels(field: &str, s: &str) -> InkframeResult<Vec<u32>> {
    Ok(parse_numbers(field, s)?
        .into_iter()
        .map(|v| v.round() as u32)
        .collect())
}

fn construct(init: AppInit<'_>) -> InkframeResult<Box<dyn App>> {
    let c = &init.config;
    let axis = |name: &str| -> InkframeResult<u32> {
        let v = c.i64(name)?;
        if !(1..=i64::from(MAX_CELLS_PER_AXIS)).contains(&v) {
            return Err(InkframeError::config(format!(
                "{name} must be within 1..={MAX_CELLS_PER_AXIS} (got {v})"
            )));
        }
        Ok(v as u32)
    };

    let margin = match parse_pixels("margin", c.str("margin")?)?.as_slice() {
        [] => [0; 4],
        [all] => [*all; 4],
        [v, h] => [*v, *h, *v, *h],
        [t, r, b, l] => [*t, *r, *b, *l],
        other => {
            return Err(InkframeError::config(format!(
                "margin takes 1, 2 or 4 values (got {})",
                other.len()
            )));
        }
    };
    let gap = match parse_pixels("gap", c.str("gap")?)?.as_slice() {
        [] => [0; 2],
        [all] => [*all; 2],
        [r, col] => [*r, *col],
        other => {
            return Err(InkframeError::config(format!(
                "gap takes 1 or 2 values (got {})",
                other.len()
            )));
        }
    };

    Ok(Box::new(SplitApp {
        node_id: init.node.id.clone(),
        grid: GridSpec {
            rows: axis("rows")?,
            columns: axis("columns")?,
            margin,
            gap,
            row_ratios: parse_numbers("height_ratios", c.str("height_ratios")?)?,
            column_ratios: parse_numbers("width_ratios", c.str("width_ratios")?)?,
        },
    }))
}

pub(crate) fn register(r: &mut AppRegistry) {
    r.register(
        "split",
        vec![
            FieldSpec::new("rows", FieldKind::Integer).with_default(1),
            FieldSpec::new("columns", FieldKind::Integer).with_default(1),
            FieldSpec::new("margin", FieldKind::String).with_default("0"),
            FieldSpec::new("gap", FieldKind::String).with_default("0"),
            FieldSpec::new("height_ratios", FieldKind::String).with_default(""),
            FieldSpec::new("width_ratios", FieldKind::String).with_default(""),
        ],
        construct,
    );
}

#[cfg(test)]
#[path = "../../tests/unit/apps/split.rs"]
mod tests;
