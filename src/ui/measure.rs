/// Grid sizing.
///
/// Dimensions are found by probing a rendering surface rather than
/// asking it: columns grow two glyphs at a time until a one-line probe
/// wraps, rows grow one line at a time until the block fills the
/// surface, and one extra row is added for the partially visible line.
/// Both probes are capped so a surface that never wraps (or never
/// fills) cannot hang the calculation.

use std::io;

use crossterm::terminal;

use crate::domain::grid::GridDims;

pub const PROBE_CAP: usize = 2000;

/// Anything the grid can be measured against.
pub trait Surface {
    /// Rendered height of a single probe line of `glyphs` characters.
    fn line_height(&self, glyphs: usize) -> usize;
    /// Rendered height of a block of `lines` probe lines.
    fn block_height(&self, lines: usize) -> usize;
    /// Total height available to the grid.
    fn height(&self) -> usize;
}

/// Probe `surface` for the largest grid that fits it.
pub fn grid_dimensions(surface: &impl Surface) -> GridDims {
    let baseline = surface.line_height(1);

    let mut cols = 0;
    let mut glyphs = 1;
    while surface.line_height(glyphs) == baseline && cols < PROBE_CAP {
        glyphs += 2;
        cols += 2;
    }

    let mut rows = 0;
    while surface.block_height(rows) < surface.height() && rows < PROBE_CAP {
        rows += 1;
    }

    GridDims { rows: rows + 1, cols }
}

/// A terminal as a surface: one cell per glyph, lines wrap at the
/// terminal width.
pub struct TerminalSurface {
    cols: usize,
    rows: usize,
}

impl TerminalSurface {
    pub fn new(cols: u16, rows: u16) -> Self {
        TerminalSurface {
            cols: (cols as usize).max(1),
            rows: rows as usize,
        }
    }
}

impl Surface for TerminalSurface {
    fn line_height(&self, glyphs: usize) -> usize {
        glyphs.div_ceil(self.cols).max(1)
    }

    fn block_height(&self, lines: usize) -> usize {
        lines
    }

    fn height(&self) -> usize {
        self.rows
    }
}

/// A cell grid has no partially visible final line, and the two-at-a-
/// time column probe overshoots an odd width by one, so both axes are
/// clamped back to the terminal's real cell counts.
fn clamped_dimensions(surface: &TerminalSurface) -> GridDims {
    let mut dims = grid_dimensions(surface);
    dims.rows = dims.rows.min(surface.rows);
    dims.cols = dims.cols.min(surface.cols);
    dims
}

/// Measure the running terminal.
pub fn terminal_dimensions() -> io::Result<GridDims> {
    let (cols, rows) = terminal::size()?;
    Ok(clamped_dimensions(&TerminalSurface::new(cols, rows)))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A pixel-like surface: 8px per glyph column, 16px per line.
    struct PixelSurface {
        width_px: usize,
        height_px: usize,
    }

    impl Surface for PixelSurface {
        fn line_height(&self, glyphs: usize) -> usize {
            let per_line = (self.width_px / 8).max(1);
            16 * glyphs.div_ceil(per_line).max(1)
        }

        fn block_height(&self, lines: usize) -> usize {
            16 * lines
        }

        fn height(&self) -> usize {
            self.height_px
        }
    }

    /// A surface that never wraps and never fills.
    struct BottomlessSurface;

    impl Surface for BottomlessSurface {
        fn line_height(&self, _glyphs: usize) -> usize {
            16
        }
        fn block_height(&self, _lines: usize) -> usize {
            0
        }
        fn height(&self) -> usize {
            1
        }
    }

    #[test]
    fn columns_fill_the_surface_two_at_a_time() {
        let dims = grid_dimensions(&PixelSurface {
            width_px: 800,
            height_px: 480,
        });
        // 100 glyphs fit; the probe lands on the full even count.
        assert_eq!(dims.cols, 100);
    }

    #[test]
    fn rows_include_the_partial_final_line() {
        let dims = grid_dimensions(&PixelSurface {
            width_px: 800,
            height_px: 488,
        });
        // 30 full 16px lines plus the half-visible one, plus the probe's
        // final increment.
        assert_eq!(dims.rows, 32);
    }

    #[test]
    fn probes_terminate_against_a_bottomless_surface() {
        let dims = grid_dimensions(&BottomlessSurface);
        assert_eq!(dims.cols, PROBE_CAP);
        assert_eq!(dims.rows, PROBE_CAP + 1);
    }

    #[test]
    fn terminal_surface_matches_its_cell_grid() {
        let dims = clamped_dimensions(&TerminalSurface::new(80, 24));
        assert_eq!(dims.cols, 80);
        assert_eq!(dims.rows, 24);
    }

    #[test]
    fn odd_width_terminal_keeps_no_phantom_column() {
        let surface = TerminalSurface::new(79, 24);
        // the raw probe lands on the next even count
        assert_eq!(grid_dimensions(&surface).cols, 80);

        let dims = clamped_dimensions(&surface);
        assert_eq!(dims.cols, 79);
        assert_eq!(dims.rows, 24);
    }

    #[test]
    fn zero_width_terminal_does_not_divide_by_zero() {
        let surface = TerminalSurface::new(0, 24);
        let dims = grid_dimensions(&surface);
        assert!(dims.cols <= PROBE_CAP);
    }
}
