/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The static churns a fraction of the grid every tick; diffing keeps
/// the emitted escape stream proportional to that fraction instead of
/// repainting the whole screen at the frame rate.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
    terminal::{self, Clear, ClearType},
};

use crate::domain::cell::Ink;
use crate::sim::session::Session;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
    underline: bool,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gap pixels between rows match the cell color on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 18, b: 18 };

    /// Dimmed static, readable text, red underlined links.
    const NOISE_FG: Color = Color::DarkGrey;
    const TEXT_FG: Color = Color::White;
    const LINK_FG: Color = Color::Red;

    const BLANK: Cell = Cell {
        ch: ' ',
        fg: Cell::TEXT_FG,
        bg: Cell::BASE_BG,
        underline: false,
    };

    /// Sentinel that never equals a composed cell; filling the back
    /// buffer with it forces a full repaint.
    const INVALID: Cell = Cell {
        ch: '\u{0}',
        fg: Color::Black,
        bg: Color::Black,
        underline: false,
    };

    fn new(ch: char, fg: Color) -> Self {
        Cell {
            ch,
            fg,
            bg: Cell::BASE_BG,
            underline: false,
        }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(
                cx,
                y,
                Cell {
                    ch,
                    fg,
                    bg,
                    underline: false,
                },
            );
            cx += 1;
        }
    }
}

// ── Renderer ──

/// Where the typed topic echoes, between the prompt and the submit link.
const PROMPT_ROW: usize = 8;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            DisableMouseCapture,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, s: &Session) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(
                self.writer,
                SetBackgroundColor(Cell::BASE_BG),
                Clear(ClearType::All)
            )?;
        }

        self.front.clear();
        self.compose(s);
        self.flush_diff()?;

        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, s: &Session) {
        for (row, col, cell) in s.grid.iter() {
            // The pool's non-breaking space renders as a gap.
            let ch = if cell.content == '\u{a0}' { ' ' } else { cell.content };
            let mut out = match cell.ink {
                None => Cell::new(ch, Cell::NOISE_FG),
                Some(Ink::Text) => Cell::new(ch, Cell::TEXT_FG),
                Some(Ink::Link) => Cell::new(ch, Cell::LINK_FG),
            };
            out.underline = cell.ink == Some(Ink::Link);
            self.front.set(col, row, out);
        }

        if let Some(entry) = s.topic_entry.as_ref() {
            self.compose_prompt(&entry.buf);
        }

        if let Some(banner) = s.banner {
            self.compose_banner(banner);
        }
    }

    /// The typed topic, centered, with a block cursor after it.
    fn compose_prompt(&mut self, buf: &str) {
        let shown = format!("{buf}_");
        let len = shown.chars().count();
        let x = self.front.width.saturating_sub(len) / 2;
        self.front
            .put_str(x, PROMPT_ROW, &shown, Cell::TEXT_FG, Cell::BASE_BG);
    }

    /// Advisory on the bottom row when the screen is too small.
    fn compose_banner(&mut self, banner: &str) {
        let y = self.front.height.saturating_sub(1);
        self.front
            .put_str(0, y, banner, Color::Black, Color::Yellow);
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Cell::TEXT_FG;
        let mut last_bg = Cell::BASE_BG;
        let mut last_underline = false;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // IMPORTANT: Do NOT use ResetColor here — it resets to the
        // terminal's native default, which may differ from BASE_BG and
        // cause line artifacts.
        queue!(
            self.writer,
            SetForegroundColor(Cell::TEXT_FG),
            SetBackgroundColor(Cell::BASE_BG),
            SetAttribute(Attribute::NoUnderline),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell == prev {
                    need_move = true;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors and attributes only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                if cell.underline != last_underline {
                    let attr = if cell.underline {
                        Attribute::Underlined
                    } else {
                        Attribute::NoUnderline
                    };
                    queue!(self.writer, SetAttribute(attr))?;
                    last_underline = cell.underline;
                }

                queue!(self.writer, Print(cell.ch))?;

                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }
}
