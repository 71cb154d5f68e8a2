use ratatui::layout::Rect;

/// Fraction of the available area reserved for the stage grid: 80% of the
/// width, 70% of the height, centered.
const WIDTH_NUM: u32 = 8;
const WIDTH_DEN: u32 = 10;
const HEIGHT_NUM: u32 = 7;
const HEIGHT_DEN: u32 = 10;

/// Horizontal gap between stage columns.
pub const COLUMN_GUTTER: u16 = 2;
/// Vertical margin subtracted from the reserved height.
pub const COLUMN_MARGIN: u16 = 2;

/// Computes one column rectangle per stage, left-to-right in stage order.
///
/// The caller must refuse to lay out zero stages; an empty input yields an
/// empty layout rather than a panic.
pub fn compute_layout(available: Rect, stage_count: usize) -> Vec<Rect> {
    if stage_count == 0 {
        debug_assert!(false, "layout requested for zero stages");
        return Vec::new();
    }
    let n = stage_count as u16;

    // widened so the product cannot overflow on very wide terminals
    let grid_w = (u32::from(available.width) * WIDTH_NUM / WIDTH_DEN) as u16;
    let grid_h = (u32::from(available.height) * HEIGHT_NUM / HEIGHT_DEN) as u16;
    let x0 = available.x + (available.width - grid_w) / 2;
    let y0 = available.y + (available.height - grid_h) / 2;

    let total_gutter = COLUMN_GUTTER * (n - 1);
    let col_w = grid_w.saturating_sub(total_gutter) / n;
    let col_h = grid_h.saturating_sub(COLUMN_MARGIN);

    (0..n)
        .map(|i| Rect {
            x: x0 + i * (col_w + COLUMN_GUTTER),
            y: y0,
            width: col_w,
            height: col_h,
        })
        .collect()
}
