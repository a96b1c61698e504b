/// Text overlays: real characters written into the static.
///
/// Each inserted cell holds its final form only in `proper`; on screen
/// it shows a random glyph until its revert lands, scheduled at a
/// uniform-random delay inside the reveal window. That is the
/// "materializing out of static" effect. Clearing does the reverse:
/// specials are replaced with fresh noise and dissolve over the same
/// window.
///
/// Every operation returns a completion deadline a fixed window after
/// the call. This is deliberately not a join on the per-cell timers: a
/// cell may still be mid-reveal when the deadline passes, and two calls
/// targeting the same row may race. Both are tolerated — the result
/// reads as noise either way.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::domain::cell::{Cell, Ink};
use crate::domain::grid::CharGrid;
use crate::domain::glyph::random_glyph;
use crate::sim::event::TimerEvent;
use crate::sim::session::Session;

/// Write `text` into the grid at (row, col), advancing left to right.
/// An embedded `'\n'` moves to the next row and resets to the starting
/// column. Returns the fixed completion deadline.
pub fn insert_text(
    s: &mut Session,
    text: &str,
    row: usize,
    col: usize,
    ink: Ink,
    link: Option<u16>,
    now: Instant,
) -> Instant {
    let dims = s.grid.dims();
    let window = Duration::from_millis(s.timing.reveal_window_ms);

    let mut r = row;
    let mut c = col;
    for ch in text.chars() {
        if ch == '\n' {
            r += 1;
            c = col;
            continue;
        }

        if r < dims.rows && c < dims.cols {
            let mut cell = Cell {
                content: ch,
                special: true,
                ink: Some(ink),
                link,
                proper: None,
            };
            cell.proper = Some(cell.snapshot());
            // staged as static until the revert materializes it
            cell.content = random_glyph(&mut s.rng);
            s.grid.set(r, c, cell);

            let delay = window.mul_f64(s.rng.random::<f64>());
            s.scheduler
                .schedule(now, delay, TimerEvent::Revert { row: r, col: c });
        }

        c += 1;
    }

    now + window
}

/// Replace every special cell in `row` with fresh noise, discarding its
/// proper memory, and schedule each to dissolve within the window.
pub fn clear_row(s: &mut Session, row: usize, now: Instant) -> Instant {
    let dims = s.grid.dims();
    let window = Duration::from_millis(s.timing.reveal_window_ms);

    for col in 0..dims.cols {
        if s.grid.get(row, col).is_some_and(|c| c.special) {
            let glyph = random_glyph(&mut s.rng);
            s.grid.set(row, col, Cell::noise(glyph));

            let delay = window.mul_f64(s.rng.random::<f64>());
            s.scheduler
                .schedule(now, delay, TimerEvent::Dissolve { row, col });
        }
    }

    now + window
}

/// Clear every row of the grid. One fixed deadline covers them all.
pub fn remove_specials(s: &mut Session, now: Instant) -> Instant {
    let dims = s.grid.dims();
    for row in 0..dims.rows {
        clear_row(s, row, now);
    }
    now + Duration::from_millis(s.timing.reveal_window_ms)
}

/// Restore a cell to its proper form, then re-snapshot it. Reverting a
/// second time is a no-op on content. Cells without a snapshot are left
/// alone.
pub fn revert_cell(grid: &mut CharGrid, row: usize, col: usize) {
    if let Some(proper) = grid.get(row, col).and_then(|c| c.proper) {
        grid.set(row, col, Cell::from_proper(proper));
    }
}

/// Dissolve step after a clear. If an overlay reclaimed the cell in the
/// meantime its proper form wins; otherwise the cell re-randomizes.
pub fn dissolve_cell(s: &mut Session, row: usize, col: usize) {
    if s.grid.get(row, col).is_some_and(|c| c.proper.is_some()) {
        revert_cell(&mut s.grid, row, col);
    } else {
        let glyph = random_glyph(&mut s.rng);
        s.grid.update(row, col, |cell| {
            cell.content = glyph;
            cell.ink = None;
        });
    }
}

/// Reflow long copy so each line fits the grid width with the given
/// left offset. Short text passes through untouched.
pub fn wrap_text(text: &str, cols: usize, offset: usize) -> String {
    if text.chars().count() + 2 <= cols {
        return text.to_string();
    }

    let mut row_len = 0usize;
    let mut out = String::new();

    for word in text.split(' ') {
        let word_len = word.chars().count();
        if row_len + word_len + offset + 6 >= cols {
            out.push('\n');
            row_len = 0;
        } else {
            out.push(' ');
            row_len += 1;
        }
        out.push_str(word);
        row_len += word_len;
    }

    out.trim().to_string()
}
