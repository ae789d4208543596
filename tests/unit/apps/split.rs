use super::*;

fn assert_tiles(spec: &GridSpec, canvas: Canvas) {
    let cells = grid_cells(spec, canvas);
    assert_eq!(cells.len(), (spec.rows * spec.columns) as usize);

    for (i, a) in cells.iter().enumerate() {
        assert!(a.x + a.width <= canvas.width, "cell {i} overflows horizontally: {a:?}");
        assert!(a.y + a.height <= canvas.height, "cell {i} overflows vertically: {a:?}");
        for b in &cells[i + 1..] {
            assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
        }
    }

    let [top, right, bottom, left] = spec.margin;
    let [row_gap, col_gap] = spec.gap;
    let interior_w = canvas.width - left - right - col_gap * (spec.columns - 1);
    let interior_h = canvas.height - top - bottom - row_gap * (spec.rows - 1);
    let covered: u64 = cells.iter().map(Rect::area).sum();
    assert_eq!(covered, u64::from(interior_w) * u64::from(interior_h));
}

#[test]
fn equal_grid_gives_remainder_to_last_cell() {
    let cells = grid_cells(&GridSpec::new(1, 3), Canvas::new(10, 4));
    let widths: Vec<u32> = cells.iter().map(|c| c.width).collect();
    assert_eq!(widths, vec![3, 3, 4]);
    assert_eq!(cells[2].x, 6);
    assert!(cells.iter().all(|c| c.height == 4 && c.y == 0));
}

#[test]
fn cells_are_row_major() {
    let cells = grid_cells(&GridSpec::new(2, 2), Canvas::new(8, 6));
    assert_eq!(cells[0], Rect::new(0, 0, 4, 3));
    assert_eq!(cells[1], Rect::new(4, 0, 4, 3));
    assert_eq!(cells[2], Rect::new(0, 3, 4, 3));
    assert_eq!(cells[3], Rect::new(4, 3, 4, 3));
}

#[test]
fn margins_and_gaps_are_excluded() {
    let spec = GridSpec {
        margin: [2, 3, 4, 5],
        gap: [1, 2],
        ..GridSpec::new(2, 3)
    };
    let cells = grid_cells(&spec, Canvas::new(40, 30));
    assert_eq!(cells[0].x, 5);
    assert_eq!(cells[0].y, 2);
    assert_eq!(cells[1].x, cells[0].x + cells[0].width + 2);
    assert_eq!(cells[3].y, cells[0].y + cells[0].height + 1);
    assert_tiles(&spec, Canvas::new(40, 30));
}

#[test]
fn ratios_distribute_proportionally() {
    let spec = GridSpec {
        column_ratios: vec![1.0, 2.0, 1.0],
        row_ratios: vec![3.0, 1.0],
        ..GridSpec::new(2, 3)
    };
    let cells = grid_cells(&spec, Canvas::new(100, 40));
    assert_eq!(cells[0].width, 25);
    assert_eq!(cells[1].width, 50);
    assert_eq!(cells[2].width, 25);
    assert_eq!(cells[0].height, 30);
    assert_eq!(cells[3].height, 10);
}

#[test]
fn unusable_ratios_fall_back_to_equal() {
    let wrong_len = GridSpec {
        column_ratios: vec![1.0, 2.0],
        ..GridSpec::new(1, 3)
    };
    let zero = GridSpec {
        column_ratios: vec![1.0, 0.0, 1.0],
        ..GridSpec::new(1, 3)
    };
    let equal = grid_cells(&GridSpec::new(1, 3), Canvas::new(30, 5));
    assert_eq!(grid_cells(&wrong_len, Canvas::new(30, 5)), equal);
    assert_eq!(grid_cells(&zero, Canvas::new(30, 5)), equal);
}

#[test]
fn tiling_holds_across_awkward_sizes() {
    for (w, h) in [(1, 1), (7, 3), (13, 17), (800, 480), (101, 99)] {
        for (rows, columns) in [(1, 1), (2, 3), (3, 2), (5, 7)] {
            let spec = GridSpec {
                row_ratios: (1..=rows).map(f64::from).collect(),
                ..GridSpec::new(rows, columns)
            };
            assert_tiles(&spec, Canvas::new(w, h));
            assert_tiles(&GridSpec::new(rows, columns), Canvas::new(w, h));
        }
    }
}

#[test]
fn oversized_margins_collapse_to_empty_cells() {
    let spec = GridSpec {
        margin: [10, 10, 10, 10],
        ..GridSpec::new(2, 2)
    };
    let cells = grid_cells(&spec, Canvas::new(8, 8));
    assert_eq!(cells.len(), 4);
    assert!(cells.iter().all(Rect::is_empty));
}

#[test]
fn number_lists_accept_spaces_and_commas() {
    assert_eq!(parse_numbers("x", "1, 2 3").unwrap(), vec![1.0, 2.0, 3.0]);
    assert!(parse_numbers("x", "").unwrap().is_empty());
    assert!(parse_numbers("x", "1 -2").is_err());
    assert!(parse_numbers("x", "wide").is_err());
}
