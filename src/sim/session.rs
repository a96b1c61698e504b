/// Session: the complete state of one run of the game.
///
/// Everything the engines mutate lives here — the grid, the timer queue,
/// the RNG, the script's transient state. There are no ambient globals;
/// the public operations of the noise/overlay engines and the dialogue
/// script all take the session explicitly.
///
/// A restart (the "New query" link at the end of the story) is the only
/// cancellation mechanism: it drops every pending timer, forgets any
/// in-flight lookup, and rebuilds the grid from fresh static.

use std::sync::mpsc::Receiver;

use rand::rngs::StdRng;

use crate::config::{LookupConfig, TimingConfig};
use crate::domain::grid::{CharGrid, GridDims};
use crate::lookup::LookupReply;
use crate::sim::scheduler::{Scheduler, TimerId};
use crate::story::Cue;

/// The topic prompt, while it is open.
pub struct TopicEntry {
    pub buf: String,
    /// The "submit" link appears once, on the first typed character.
    pub submit_link_shown: bool,
}

/// The decaying "mind going" line of the endgame.
pub struct DecayLine {
    pub text: String,
    pub row: usize,
    pub col: usize,
    pub timer: Option<TimerId>,
}

pub struct Session {
    pub grid: CharGrid,
    pub scheduler: Scheduler,
    pub rng: StdRng,
    pub timing: TimingConfig,
    pub lookup_cfg: LookupConfig,

    /// Background static runs until the endgame fades the grid out.
    pub noise_on: bool,

    /// Active option table: link cells hold indices into this.
    pub options: Vec<Cue>,

    // ── Query screen ──
    pub topic_entry: Option<TopicEntry>,
    pub pending_topic: Option<String>,
    pub flashing: bool,
    /// Last flashed example (topic index, row), to avoid repeats.
    pub flash_prev: Option<(usize, usize)>,
    pub lookup_rx: Option<Receiver<LookupReply>>,

    // ── Endgame ──
    pub panic_timers: Vec<TimerId>,
    pub decay: Option<DecayLine>,

    /// Non-blocking advisory shown when the measured grid is too small.
    pub banner: Option<&'static str>,
}

impl Session {
    pub fn new(
        dims: GridDims,
        timing: TimingConfig,
        lookup_cfg: LookupConfig,
        rng: StdRng,
    ) -> Self {
        Session {
            grid: CharGrid::new(dims),
            scheduler: Scheduler::new(),
            rng,
            timing,
            lookup_cfg,
            noise_on: true,
            options: Vec::new(),
            topic_entry: None,
            pending_topic: None,
            flashing: false,
            flash_prev: None,
            lookup_rx: None,
            panic_timers: Vec::new(),
            decay: None,
            banner: None,
        }
    }

    /// Register an option and return the link index its cells carry.
    pub fn push_option(&mut self, cue: Cue) -> u16 {
        self.options.push(cue);
        (self.options.len() - 1) as u16
    }

    /// Full session reset: clear every timer, drop transient state,
    /// and refill the grid with static.
    pub fn restart(&mut self) {
        self.scheduler.clear();
        self.options.clear();
        self.topic_entry = None;
        self.pending_topic = None;
        self.flashing = false;
        self.flash_prev = None;
        self.lookup_rx = None;
        self.panic_timers.clear();
        self.decay = None;
        self.banner = None;
        self.noise_on = true;
        crate::sim::noise::populate(self);
    }

    #[cfg(test)]
    pub fn for_test(rows: usize, cols: usize) -> Self {
        use rand::SeedableRng;
        Session::new(
            GridDims { rows, cols },
            TimingConfig::default(),
            LookupConfig {
                endpoint: String::new(),
                timeout_ms: 0,
                query_log: std::path::PathBuf::new(),
                success_log: std::path::PathBuf::new(),
            },
            StdRng::seed_from_u64(0xE1),
        )
    }
}
