use ratatui::layout::Rect;

/// Widest row the board is laid out in
pub const MAX_COLUMNS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Column count for `n` cards: roughly square, capped at `MAX_COLUMNS`
pub fn columns_for(n: usize) -> usize {
    if n == 0 {
        return 1;
    }
    let mut cols = 1;
    while cols * cols < n {
        cols += 1;
    }
    cols.min(MAX_COLUMNS)
}

pub fn rows_for(n: usize, cols: usize) -> usize {
    n.div_ceil(cols.max(1))
}

/// Cursor movement over a row-major grid whose last row may be short.
/// Left/right wrap through the whole deck, up/down stay in the column.
pub fn step(cursor: usize, len: usize, cols: usize, dir: Direction) -> usize {
    if len == 0 {
        return 0;
    }
    let cursor = cursor.min(len - 1);
    let cols = cols.max(1);
    match dir {
        Direction::Left => (cursor + len - 1) % len,
        Direction::Right => (cursor + 1) % len,
        Direction::Up => cursor.checked_sub(cols).unwrap_or(cursor),
        Direction::Down => {
            let below = cursor + cols;
            if below < len {
                below
            } else {
                cursor
            }
        }
    }
}

/// Screen rects for `n` cards laid out in `area`, row-major
pub fn cell_rects(area: Rect, n: usize) -> Vec<Rect> {
    if n == 0 || area.width == 0 || area.height == 0 {
        return Vec::new();
    }
    let cols = columns_for(n);
    let rows = rows_for(n, cols);
    let cell_w = area.width / cols as u16;
    let cell_h = (area.height / rows as u16).max(1);

    (0..n)
        .map(|i| {
            let (row, col) = ((i / cols) as u16, (i % cols) as u16);
            Rect {
                x: area.x + col * cell_w,
                y: area.y + row * cell_h,
                width: cell_w,
                height: cell_h,
            }
            .intersection(area)
        })
        .collect()
}
