/// Background static.
///
/// `populate` fills the whole grid with random glyphs; `churn` runs on
/// the noise cadence and scribbles over a small fraction of cells,
/// picked with replacement. A churned cell that belongs to an overlay
/// (it carries a `proper` snapshot) gets a single restore scheduled a
/// short delay later, which is what makes narrative text flicker
/// instead of eroding away.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::domain::cell::Cell;
use crate::domain::glyph::random_glyph;
use crate::sim::event::TimerEvent;
use crate::sim::session::Session;

/// Fill every cell with fresh static. No cell is special afterwards.
pub fn populate(s: &mut Session) {
    let dims = s.grid.dims();
    for row in 0..dims.rows {
        for col in 0..dims.cols {
            let glyph = random_glyph(&mut s.rng);
            s.grid.set(row, col, Cell::noise(glyph));
        }
    }
}

/// One static update: overwrite `rows × cols × churn_fraction` cells
/// (duplicates possible) with random glyphs and no ink.
pub fn churn(s: &mut Session, now: Instant) {
    let dims = s.grid.dims();
    if dims.rows == 0 || dims.cols == 0 {
        return;
    }

    let touches = ((dims.rows * dims.cols) as f64 * s.timing.churn_fraction).ceil() as usize;
    let restore_delay = Duration::from_millis(s.timing.restore_delay_ms);

    for _ in 0..touches {
        let row = s.rng.random_range(0..dims.rows);
        let col = s.rng.random_range(0..dims.cols);
        let glyph = random_glyph(&mut s.rng);

        s.grid.update(row, col, |cell| {
            cell.content = glyph;
            cell.ink = None;
        });

        // An overlay cell mid-noise gets its proper form back shortly.
        if s.grid.get(row, col).is_some_and(|c| c.proper.is_some()) {
            s.scheduler
                .schedule(now, restore_delay, TimerEvent::Revert { row, col });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::Ink;
    use crate::sim::overlay;

    #[test]
    fn populate_fills_grid_with_plain_noise() {
        let mut s = Session::for_test(6, 10);
        populate(&mut s);
        for (_, _, cell) in s.grid.iter() {
            assert!(!cell.special);
            assert!(cell.ink.is_none());
            assert!(cell.proper.is_none());
        }
    }

    #[test]
    fn churn_never_creates_specials() {
        let mut s = Session::for_test(50, 40);
        populate(&mut s);
        let now = Instant::now();
        for _ in 0..20 {
            churn(&mut s, now);
        }
        assert!(s.grid.iter().all(|(_, _, c)| !c.special));
        // No overlay cells → nothing to restore.
        assert!(s.scheduler.pop_due(now + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn churn_count_tracks_grid_area() {
        // 50 × 40 = 2000 cells → 4 touches per update. Over many
        // updates with replacement, the number of changed cells stays
        // in that neighborhood; just make sure a single churn does not
        // rewrite the whole grid.
        let mut s = Session::for_test(50, 40);
        populate(&mut s);
        let before: Vec<char> = s.grid.iter().map(|(_, _, c)| c.content).collect();
        churn(&mut s, Instant::now());
        let changed = s
            .grid
            .iter()
            .zip(before)
            .filter(|((_, _, c), old)| c.content != *old)
            .count();
        assert!(changed <= 4, "churn touched {changed} cells");
    }

    #[test]
    fn churned_overlay_cells_get_a_restore_scheduled() {
        let mut s = Session::for_test(1, 1);
        let now = Instant::now();
        overlay::insert_text(&mut s, "x", 0, 0, Ink::Text, None, now);
        // Drain the reveal timer so only churn's restore remains.
        while s.scheduler.pop_due(now + Duration::from_secs(2)).is_some() {}

        churn(&mut s, now); // 1 cell, ceil(1 × 0.002) = 1 touch: must hit (0,0)
        let due = s.scheduler.pop_due(now + Duration::from_millis(300));
        assert_eq!(due, Some(TimerEvent::Revert { row: 0, col: 0 }));
    }
}
