/// One addressable position in the character grid.
///
/// A cell is either background static (`special == false`) or part of a
/// narrative overlay (`special == true`). Overlay cells snapshot their
/// intended form into `proper` at insert time, so the noise engine may
/// scribble over them and a later revert can restore the original glyph.

/// Foreground class of an overlay cell. The renderer maps these to
/// concrete terminal colors; background static has no ink.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Ink {
    /// Plain narrative text.
    Text,
    /// Activatable link text.
    Link,
}

/// Flat value snapshot of a cell's intended form.
///
/// Deliberately has no `proper` field of its own: snapshots never nest,
/// so reverting is a fixpoint rather than a walk up a chain.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct CellProper {
    pub content: char,
    pub special: bool,
    pub ink: Option<Ink>,
    pub link: Option<u16>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cell {
    /// Current glyph on screen.
    pub content: char,
    /// True while this cell carries narrative text rather than static.
    pub special: bool,
    pub ink: Option<Ink>,
    /// Index into the session's active option table. A special cell with
    /// a link renders as an activatable element.
    pub link: Option<u16>,
    /// Intended form, present only for overlay cells. Noise overwrites
    /// `content`/`ink` freely; this is what a revert restores.
    pub proper: Option<CellProper>,
}

impl Cell {
    /// A background static cell showing `glyph`.
    pub fn noise(glyph: char) -> Self {
        Cell {
            content: glyph,
            special: false,
            ink: None,
            link: None,
            proper: None,
        }
    }

    /// Snapshot the cell's current form (sans any existing snapshot).
    pub fn snapshot(&self) -> CellProper {
        CellProper {
            content: self.content,
            special: self.special,
            ink: self.ink,
            link: self.link,
        }
    }

    /// Rebuild a cell from a snapshot, re-snapshotting it as its own
    /// proper form. Applying this twice yields the same cell.
    pub fn from_proper(proper: CellProper) -> Self {
        let mut cell = Cell {
            content: proper.content,
            special: proper.special,
            ink: proper.ink,
            link: proper.link,
            proper: None,
        };
        cell.proper = Some(cell.snapshot());
        cell
    }
}
