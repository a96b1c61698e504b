/// Events dispatched when a scheduled timer falls due.
/// The main loop consumes these and routes them to the overlay engine
/// or the dialogue script.

use crate::story::Cue;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimerEvent {
    /// Restore a cell to its proper form (mid-reveal materialization,
    /// or recovery after a noise overwrite).
    Revert { row: usize, col: usize },
    /// Dissolve step after a clear: restore the proper form if one is
    /// still present, otherwise re-randomize the glyph.
    Dissolve { row: usize, col: usize },
    /// Advance the dialogue script.
    Cue(Cue),
}
