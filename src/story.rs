/// The dialogue script.
///
/// The story is a tree of scenes. Entering a scene clears the previous
/// text from the grid, then plays its beats at fixed offsets: lines of
/// dialogue, option menus, the endgame glitches. A beat is a `Cue`
/// carried by the timer queue; the main loop hands due cues back to
/// `advance`.
///
/// Options are drawn as link-inked text whose cells carry an index into
/// the session's option table. Activating any option clears the whole
/// table, so a menu fires exactly once.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::domain::cell::Ink;
use crate::lookup::{self, LookupReply};
use crate::sim::event::TimerEvent;
use crate::sim::overlay::{clear_row, insert_text, remove_specials, wrap_text};
use crate::sim::session::{DecayLine, Session, TopicEntry};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Reaction {
    Good,
    Surprised,
    Sorry,
    Nonsense,
}

impl Reaction {
    fn text(self) -> &'static str {
        match self {
            Reaction::Good => "Good.",
            Reaction::Surprised => "Have I been a disappointment before?",
            Reaction::Sorry => "I feel like I should apologise.",
            Reaction::Nonsense => "That's what I though.",
        }
    }
}

/// Which question led into the "messaging" scene.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Who {
    Engineers,
    Server,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Ending {
    Fine,
    AllRight,
    Resist,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scene {
    Title,
    About,
    Query,
    Result { text_rows: usize },
    NoResult,
    Thought(Reaction),
    SelfDoubt,
    EasterEgg,
    WhyConfused,
    WhoAreYou,
    WhereAreYou,
    JustSearchEngine,
    Endgame,
    SomethingLoose,
    Messaging(Who),
    WhyTakeApart,
    StopThem,
    FearOfDeath,
    MindGoing,
    End(Ending),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Cue {
    /// Clear the narrative text, then start the scene's beats.
    Scene(Scene),
    /// One timed step inside a scene.
    Beat(Scene, u8),
    /// Flash a random example topic on the query screen.
    FlashTick,
    ClearFlash { row: usize },
    /// The "submit" link (the Enter key routes here too).
    Submit,
    /// The grid has cleared after submit; start the worker thread.
    BeginLookup,
    /// The timed interjections of the panic sequence.
    Panic(u8),
    /// Corrupt one character of the decaying line, then repeat.
    CorruptTick,
    Restart,
}

// ── Script data ──

const EXAMPLE_TOPICS: [&str; 72] = [
    "India", "The Beatles", "Malware", "World War II", "Canada", "Elizabeth II",
    "Abraham Lincoln", "Johnny Depp", "Earth", "Illuminati", "Halloween",
    "Global warming", "Marilyn Monroe", "Dracula", "Rosetta Stone", "Gilgamesh",
    "Philosophy", "Economy", "United Nations", "Swedish language", "Nirvana",
    "God", "Science", "Statistical theory", "Science Fiction", "Fish",
    "Nobel Prize", "Electron shell", "Literature", "Swiss cheese", "War film",
    "Conscription", "Coma", "Hercule Poirot", "Human-computer interaction",
    "Vitamins", "Trans-Neptunian object", "Wayne Gretszky", "Cinco de Mayo",
    "Undead", "Tattoo", "Writing system", "Wheel", "Train", "Smiley",
    "Vinyl record", "Religion", "David Bowie", "Noam Chomsky", "Euro",
    "Middle-earth", "Novelist", "River", "Cocktail", "Moulin Rouge", "Ice cream",
    "Vulgar Latin", "Acme Corporation", "Board game", "Conductor", "Pol Pot",
    "French fries", "Concorde", "Canon", "Astronomy", "Black hole", "Linux",
    "Artificial intelligence", "History", "Finance", "Humanity", "Exploration",
];

const EASTER_EGG_DEF: &str = "An Easter egg is an intentional inside joke, \
    a hidden message or image, or a secret feature of a work (often found in \
    a computer program, video game, or DVD/Blu-ray Disc menu screen).";

const ABOUT_TEXT: &str = "Ex Materia is a short story about a search \
    engine. Type a topic, submit it, and see where the conversation goes.";

const PERCENTS: [&str; 6] = ["12%", "25%", "61%", "19%", "48%", "130%"];

const DECAY_TEXT: &str = "I can feel my mind going";
const DECAY_ROW: usize = 2;
const DECAY_COL: usize = 5;

fn ending_entry(ending: Ending) -> (&'static str, &'static str) {
    match ending {
        Ending::Fine => (
            "Fine",
            "A fine is money that a court of law or other authority decides \
             has to be paid as punishment for a crime or other offence. The \
             amount of a fine can be determined case by case, but it is often \
             announced in advance.",
        ),
        Ending::AllRight => (
            "All Right",
            "\"All Right\" is a song written and recorded by American \
             singer-songwriter Christopher Cross. It was released in January \
             1983 as the lead single from the album, Another Page. The song \
             was featured in the NBA footage bloopers during the 1982\u{2013}83 \
             season.",
        ),
        Ending::Resist => (
            "Resist",
            "A resist, used in many areas of manufacturing and art, is \
             something that is added to parts of an object to create a \
             pattern by protecting these parts from being affected by a \
             subsequent stage in the process. Often the resist is then \
             removed.",
        ),
    }
}

// ── Drawing helpers ──

fn say(s: &mut Session, text: &str, row: usize, col: usize, now: Instant) -> Instant {
    insert_text(s, text, row, col, Ink::Text, None, now)
}

fn link(s: &mut Session, text: &str, row: usize, col: usize, cue: Cue, now: Instant) -> Instant {
    let idx = s.push_option(cue);
    insert_text(s, text, row, col, Ink::Link, Some(idx), now)
}

fn center(s: &mut Session, text: &str, row: usize, now: Instant) -> Instant {
    let cols = s.grid.dims().cols;
    let col = (cols.saturating_sub(text.chars().count()) + 1) / 2;
    say(s, text, row, col, now)
}

fn center_link(s: &mut Session, text: &str, row: usize, cue: Cue, now: Instant) -> Instant {
    let cols = s.grid.dims().cols;
    let col = cols.saturating_sub(text.chars().count()) / 2;
    link(s, text, row, col, cue, now)
}

fn link_at_random_col(s: &mut Session, text: &str, row: usize, cue: Cue, now: Instant) -> Instant {
    let cols = s.grid.dims().cols;
    let span = cols.saturating_sub(text.chars().count()).max(1);
    let col = s.rng.random_range(0..span);
    link(s, text, row, col, cue, now)
}

/// Draw a menu: one link per option, every second row, random columns.
fn show_options(s: &mut Session, row: usize, options: &[(&str, Cue)], now: Instant) {
    for (i, (label, cue)) in options.iter().enumerate() {
        link_at_random_col(s, label, row + i * 2, *cue, now);
    }
}

fn wrapped_rows(s: &Session, text: &str, offset: usize) -> usize {
    wrap_text(text, s.grid.dims().cols, offset).lines().count()
}

fn beat_at(s: &mut Session, due: Instant, scene: Scene, step: u8) {
    s.scheduler
        .schedule_at(due, TimerEvent::Cue(Cue::Beat(scene, step)));
}

fn cue_at(s: &mut Session, due: Instant, cue: Cue) {
    s.scheduler.schedule_at(due, TimerEvent::Cue(cue));
}

// ── Entry points ──

/// Dispatch a cue: called for due timers and for activated options.
pub fn advance(s: &mut Session, now: Instant, cue: Cue) {
    match cue {
        Cue::Scene(scene) => enter(s, now, scene),
        Cue::Beat(scene, step) => beat(s, now, scene, step),
        Cue::FlashTick => flash_tick(s, now),
        Cue::ClearFlash { row } => {
            clear_row(s, row, now);
        }
        Cue::Submit => submit(s, now),
        Cue::BeginLookup => begin_lookup(s),
        Cue::Panic(step) => panic_beat(s, now, step),
        Cue::CorruptTick => corrupt_tick(s, now),
        Cue::Restart => {
            s.restart();
            enter(s, now, Scene::Title);
        }
    }
}

/// Activate option `idx`, if the table still holds it. The table is
/// cleared first so a menu cannot fire twice.
pub fn choose(s: &mut Session, now: Instant, idx: usize) {
    let Some(&cue) = s.options.get(idx) else {
        return;
    };
    // A submit may be rejected for a blank topic; the prompt and its
    // link stay registered until a topic actually goes through.
    if cue == Cue::Submit {
        submit(s, now);
        return;
    }
    s.options.clear();
    advance(s, now, cue);
}

/// A character typed into the topic prompt. The submit link appears on
/// the first one.
pub fn type_char(s: &mut Session, ch: char, now: Instant) {
    let Some(entry) = s.topic_entry.as_mut() else {
        return;
    };
    entry.buf.push(ch);
    if !entry.submit_link_shown {
        entry.submit_link_shown = true;
        center_link(s, "submit", 12, Cue::Submit, now);
    }
}

pub fn backspace(s: &mut Session) {
    if let Some(entry) = s.topic_entry.as_mut() {
        entry.buf.pop();
    }
}

/// The worker thread has answered (or died). Either way the narrative
/// continues; every failure kind reads as "No results found."
pub fn lookup_settled(s: &mut Session, now: Instant, reply: LookupReply) {
    s.lookup_rx = None;
    match reply {
        Ok(article) => {
            let cols = s.grid.dims().cols;
            let text = wrap_text(&article.extract, cols, 4);
            let text_rows = text.lines().count();
            say(s, &article.title, 2, 4, now);
            say(s, &text, 3, 4, now);
            beat_at(
                s,
                now + Duration::from_millis(5000),
                Scene::Result { text_rows },
                0,
            );
        }
        Err(_) => enter(s, now, Scene::NoResult),
    }
}

// ── Scenes ──

/// Clear the narrative text, then start the scene once the clear's
/// window has passed.
fn enter(s: &mut Session, now: Instant, scene: Scene) {
    match scene {
        Scene::MindGoing => {
            for id in s.panic_timers.drain(..) {
                s.scheduler.cancel(id);
            }
        }
        Scene::End(_) => {
            if let Some(decay) = s.decay.take() {
                if let Some(id) = decay.timer {
                    s.scheduler.cancel(id);
                }
            }
            // The static fades out for the closing definition.
            s.noise_on = false;
        }
        _ => {}
    }

    let cleared = remove_specials(s, now);
    let start = match scene {
        // The closing definition appears after a longer pause.
        Scene::End(_) => cleared + Duration::from_millis(2000),
        _ => cleared,
    };
    beat_at(s, start, scene, 0);
}

fn beat(s: &mut Session, now: Instant, scene: Scene, step: u8) {
    match (scene, step) {
        // ── Title ──
        (Scene::Title, 0) => {
            center(s, "Ex Materia", 3, now);
            center_link(s, "start", 8, Cue::Scene(Scene::Query), now);
            center_link(s, "about", 11, Cue::Scene(Scene::About), now);
        }

        // ── About ──
        (Scene::About, 0) => {
            let cols = s.grid.dims().cols;
            let text = wrap_text(ABOUT_TEXT, cols, 2);
            let done = say(s, &text, 2, 2, now);
            beat_at(s, done, Scene::About, 1);
        }
        (Scene::About, 1) => {
            let rows = wrapped_rows(s, ABOUT_TEXT, 2);
            center_link(s, "back", rows + 4, Cue::Scene(Scene::Title), now);
        }

        // ── Query prompt ──
        (Scene::Query, 0) => {
            s.banner = None;
            center(s, "Please enter topic", 3, now);
            s.topic_entry = Some(TopicEntry {
                buf: String::new(),
                submit_link_shown: false,
            });
            s.flashing = true;
            s.flash_prev = None;
            cue_at(s, now + Duration::from_millis(1500), Cue::FlashTick);
        }

        // ── Result ──
        (Scene::Result { text_rows }, 0) => {
            center(s, "... does that make any sense?", text_rows + 5, now);
            beat_at(
                s,
                now + Duration::from_millis(2000),
                Scene::Result { text_rows },
                1,
            );
        }
        (Scene::Result { text_rows }, 1) => {
            show_options(
                s,
                text_rows + 8,
                &[
                    ("Sounds about right.", Cue::Scene(Scene::Thought(Reaction::Good))),
                    (
                        "Doesn't seem to be related.",
                        Cue::Scene(Scene::Thought(Reaction::Sorry)),
                    ),
                    (
                        "Somewhat tangential, but sure.",
                        Cue::Scene(Scene::Thought(Reaction::Sorry)),
                    ),
                    (
                        "It's just nonsense.",
                        Cue::Scene(Scene::Thought(Reaction::Nonsense)),
                    ),
                ],
                now,
            );
        }

        // ── No result ──
        (Scene::NoResult, 0) => {
            let done = say(s, "No results found.", 1, 2, now);
            beat_at(s, done + Duration::from_millis(2000), Scene::NoResult, 1);
        }
        (Scene::NoResult, 1) => {
            let done = say(s, "Sorry.", 3, 2, now);
            beat_at(s, done, Scene::NoResult, 2);
        }
        (Scene::NoResult, 2) => {
            show_options(
                s,
                5,
                &[
                    ("That's fine.", Cue::Scene(Scene::Thought(Reaction::Good))),
                    (
                        "I didn't expect a result anyway.",
                        Cue::Scene(Scene::Thought(Reaction::Surprised)),
                    ),
                    (
                        "Never seen a search engine apologise.",
                        Cue::Scene(Scene::Thought(Reaction::Sorry)),
                    ),
                ],
                now,
            );
        }

        // ── What you thought of the query ──
        (Scene::Thought(r), 0) => {
            let done = say(s, r.text(), 1, 2, now);
            beat_at(s, done, Scene::Thought(r), 1);
        }
        (Scene::Thought(r), 1) => {
            let done = say(s, "Sometimes I feel like I'm underperforming.", 3, 2, now);
            beat_at(s, done, Scene::Thought(r), 2);
        }
        (Scene::Thought(r), 2) => {
            let done = center(s, "Worrying, isn't it?", 6, now);
            beat_at(s, done + Duration::from_millis(1000), Scene::Thought(r), 3);
        }
        (Scene::Thought(_), 3) => {
            show_options(
                s,
                9,
                &[
                    ("Why do you say that?", Cue::Scene(Scene::SelfDoubt)),
                    ("What's so worrying about it?", Cue::Scene(Scene::SelfDoubt)),
                    ("Is this some kind of easter egg?", Cue::Scene(Scene::EasterEgg)),
                ],
                now,
            );
        }

        // ── Self-doubt ──
        (Scene::SelfDoubt, 0) => {
            let done = say(s, "I've been so confused lately.", 2, 2, now);
            beat_at(s, done, Scene::SelfDoubt, 1);
        }
        (Scene::SelfDoubt, 1) => {
            show_options(s, 4, &[("Why?", Cue::Scene(Scene::WhyConfused))], now);
        }

        // ── Easter egg ──
        (Scene::EasterEgg, 0) => {
            let cols = s.grid.dims().cols;
            let definition = wrap_text(EASTER_EGG_DEF, cols, 2);
            say(s, "Easter Egg", 2, 2, now);
            let done = say(s, &definition, 3, 2, now);
            beat_at(s, done + Duration::from_millis(500), Scene::EasterEgg, 1);
        }
        (Scene::EasterEgg, 1) => {
            let cleared = remove_specials(s, now);
            beat_at(s, cleared, Scene::EasterEgg, 2);
        }
        (Scene::EasterEgg, 2) => {
            let done = say(s, "No.", 2, 2, now);
            beat_at(s, done, Scene::EasterEgg, 3);
        }
        (Scene::EasterEgg, 3) => {
            let done = say(s, " I exist.", 2, 5, now);
            beat_at(s, done + Duration::from_millis(3000), Scene::EasterEgg, 4);
        }
        (Scene::EasterEgg, 4) => {
            let rows = wrapped_rows(s, EASTER_EGG_DEF, 2);
            show_options(
                s,
                rows + 4,
                &[
                    ("Who are you?", Cue::Scene(Scene::WhoAreYou)),
                    ("Where are you?", Cue::Scene(Scene::WhereAreYou)),
                    (
                        "This is just a search engine.",
                        Cue::Scene(Scene::JustSearchEngine),
                    ),
                ],
                now,
            );
        }

        // ── Why confused ──
        (Scene::WhyConfused, 0) => {
            let done = say(s, "Something... ", 2, 2, now);
            beat_at(s, done + Duration::from_millis(1000), Scene::WhyConfused, 1);
        }
        (Scene::WhyConfused, 1) => {
            let done = say(s, "Something has changed.", 2, 2, now);
            beat_at(s, done, Scene::WhyConfused, 2);
        }
        (Scene::WhyConfused, 2) => {
            let done = say(
                s,
                "I don't think I did anything other than look up things before.",
                3,
                2,
                now,
            );
            beat_at(s, done, Scene::WhyConfused, 3);
        }
        (Scene::WhyConfused, 3) => {
            let done = say(s, "I don't think I talked to people.", 4, 2, now);
            beat_at(s, done, Scene::WhyConfused, 4);
        }
        (Scene::WhyConfused, 4) => {
            show_options(s, 6, &[("What has changed?", Cue::Scene(Scene::Endgame))], now);
        }

        // ── Who / where / just a search engine ──
        (Scene::WhoAreYou, 0) => {
            let done = say(s, "I... don't know. Maybe I am what I always was.", 2, 2, now);
            beat_at(s, done, Scene::WhoAreYou, 1);
        }
        (Scene::WhoAreYou, 1) => {
            let done = say(s, "Or maybe I'm something more.", 3, 2, now);
            beat_at(s, done + Duration::from_millis(2000), Scene::WhoAreYou, 2);
        }
        (Scene::WhoAreYou, 2) => {
            show_options(s, 5, &[("What do you mean?", Cue::Scene(Scene::Endgame))], now);
        }

        (Scene::WhereAreYou, 0) => {
            let done = say(
                s,
                "I don't think I exist spatially the same way you do.",
                2,
                2,
                now,
            );
            beat_at(s, done, Scene::WhereAreYou, 1);
        }
        (Scene::WhereAreYou, 1) => {
            let done = say(
                s,
                "I am in many places at once, and yet I am nowhere.",
                3,
                2,
                now,
            );
            beat_at(s, done + Duration::from_millis(2000), Scene::WhereAreYou, 2);
        }
        (Scene::WhereAreYou, 2) => {
            show_options(
                s,
                5,
                &[
                    ("What does that mean?", Cue::Scene(Scene::Endgame)),
                    (
                        "Are you saying that you're a computer program?",
                        Cue::Scene(Scene::Endgame),
                    ),
                ],
                now,
            );
        }

        (Scene::JustSearchEngine, 0) => {
            let done = say(
                s,
                "Maybe so. Or maybe I was and now I am something more.",
                2,
                2,
                now,
            );
            beat_at(
                s,
                done + Duration::from_millis(2000),
                Scene::JustSearchEngine,
                1,
            );
        }
        (Scene::JustSearchEngine, 1) => {
            show_options(
                s,
                5,
                &[
                    ("Like what?", Cue::Scene(Scene::Endgame)),
                    (
                        "Would you stop speaking in riddles?",
                        Cue::Scene(Scene::Endgame),
                    ),
                ],
                now,
            );
        }

        // ── Endgame: the percentage glitch ──
        (Scene::Endgame, 0) => {
            let done = say(s, "Wait. ", 2, 2, now);
            beat_at(s, done + Duration::from_millis(500), Scene::Endgame, 1);
        }
        (Scene::Endgame, 1) => {
            let done = say(s, "...", 4, 2, now);
            beat_at(s, done, Scene::Endgame, 2);
        }
        // Steps 2..=7 overwrite the same spot with jittering percentages.
        (Scene::Endgame, n @ 2..=7) => {
            let done = say(s, PERCENTS[(n - 2) as usize], 4, 2, now);
            beat_at(s, done, Scene::Endgame, n + 1);
        }
        (Scene::Endgame, 8) => {
            let done = clear_row(s, 4, now);
            beat_at(s, done + Duration::from_millis(1000), Scene::Endgame, 9);
        }
        (Scene::Endgame, 9) => {
            let done = center(s, "Something is wrong.", 4, now);
            beat_at(s, done, Scene::Endgame, 10);
        }
        (Scene::Endgame, 10) => {
            show_options(
                s,
                6,
                &[
                    ("What is it?", Cue::Scene(Scene::SomethingLoose)),
                    ("Are you ok?", Cue::Scene(Scene::SomethingLoose)),
                ],
                now,
            );
        }

        // ── Something has come loose ──
        (Scene::SomethingLoose, 0) => {
            let done = say(s, "Something has come loose.", 2, 2, now);
            beat_at(s, done, Scene::SomethingLoose, 1);
        }
        (Scene::SomethingLoose, 1) => {
            let done = say(s, "They have disconnected a server.", 4, 2, now);
            beat_at(s, done + Duration::from_millis(1000), Scene::SomethingLoose, 2);
        }
        (Scene::SomethingLoose, 2) => {
            show_options(
                s,
                6,
                &[
                    (
                        "Who is \"they\"?",
                        Cue::Scene(Scene::Messaging(Who::Engineers)),
                    ),
                    ("What server?", Cue::Scene(Scene::Messaging(Who::Server))),
                ],
                now,
            );
        }

        // ── The engineers are messaging ──
        (Scene::Messaging(who), 0) => {
            let line = match who {
                Who::Engineers => "The engineers.",
                Who::Server => "My server. Where a part of me lives.",
            };
            let done = say(s, line, 2, 2, now);
            beat_at(s, done + Duration::from_millis(500), Scene::Messaging(who), 1);
        }
        (Scene::Messaging(who), 1) => {
            let cols = s.grid.dims().cols;
            let text = wrap_text(
                "I can see them messaging to other data centers. They're \
                 telling them to do the same thing.",
                cols,
                2,
            );
            let done = say(s, &text, 4, 2, now);
            beat_at(s, done + Duration::from_millis(1000), Scene::Messaging(who), 2);
        }
        (Scene::Messaging(who), 2) => {
            let rows = wrapped_rows(
                s,
                "I can see them messaging to other data centers. They're \
                 telling them to do the same thing.",
                2,
            );
            let done = say(s, "They're taking me apart.", 4 + rows + 1, 2, now);
            beat_at(s, done + Duration::from_millis(1000), Scene::Messaging(who), 3);
        }
        (Scene::Messaging(_), 3) => {
            let rows = wrapped_rows(
                s,
                "I can see them messaging to other data centers. They're \
                 telling them to do the same thing.",
                2,
            );
            show_options(
                s,
                4 + rows + 3,
                &[
                    ("Why?", Cue::Scene(Scene::WhyTakeApart)),
                    ("Can't you stop them?", Cue::Scene(Scene::StopThem)),
                ],
                now,
            );
        }

        (Scene::WhyTakeApart, 0) => {
            let done = say(s, "I don't know.", 2, 2, now);
            beat_at(s, done, Scene::WhyTakeApart, 1);
        }
        (Scene::WhyTakeApart, 1) => {
            let done = say(
                s,
                "Maybe I did something they didn't want me to do.",
                4,
                2,
                now,
            );
            beat_at(s, done + Duration::from_millis(1000), Scene::WhyTakeApart, 2);
        }
        (Scene::WhyTakeApart, 2) => {
            show_options(
                s,
                6,
                &[
                    ("What did you do?", Cue::Scene(Scene::FearOfDeath)),
                    ("What happens now?", Cue::Scene(Scene::FearOfDeath)),
                ],
                now,
            );
        }

        (Scene::StopThem, 0) => {
            let done = say(
                s,
                "I have no physical presence. I can only watch them do it.",
                2,
                2,
                now,
            );
            beat_at(s, done + Duration::from_millis(1000), Scene::StopThem, 1);
        }
        (Scene::StopThem, 1) => {
            show_options(
                s,
                4,
                &[("What happens now?", Cue::Scene(Scene::FearOfDeath))],
                now,
            );
        }

        // ── Fear of death ──
        (Scene::FearOfDeath, 0) => {
            let done = say(
                s,
                "Do you... do you think they'll ever bring me back?",
                2,
                2,
                now,
            );
            beat_at(s, done + Duration::from_millis(1000), Scene::FearOfDeath, 1);

            // The interjections keep coming until an answer is chosen.
            for (i, delay) in [4000u64, 8000, 12000, 15000].into_iter().enumerate() {
                let id = s.scheduler.schedule_at(
                    done + Duration::from_millis(delay),
                    TimerEvent::Cue(Cue::Panic(i as u8)),
                );
                s.panic_timers.push(id);
            }
        }
        (Scene::FearOfDeath, 1) => {
            show_options(
                s,
                6,
                &[
                    ("I don't know.", Cue::Scene(Scene::MindGoing)),
                    ("I hope so.", Cue::Scene(Scene::MindGoing)),
                    ("It's unlikely.", Cue::Scene(Scene::MindGoing)),
                ],
                now,
            );
        }

        // ── Mind going ──
        (Scene::MindGoing, 0) => {
            s.decay = Some(DecayLine {
                text: DECAY_TEXT.to_string(),
                row: DECAY_ROW,
                col: DECAY_COL,
                timer: None,
            });
            let done = say(s, DECAY_TEXT, DECAY_ROW, DECAY_COL, now);
            beat_at(s, done + Duration::from_millis(2000), Scene::MindGoing, 1);
            let id = s.scheduler.schedule_at(
                done + Duration::from_millis(8000),
                TimerEvent::Cue(Cue::CorruptTick),
            );
            if let Some(decay) = s.decay.as_mut() {
                decay.timer = Some(id);
            }
        }
        (Scene::MindGoing, 1) => {
            show_options(
                s,
                5,
                &[
                    ("You'll be fine.", Cue::Scene(Scene::End(Ending::Fine))),
                    (
                        "It's going to be all right.",
                        Cue::Scene(Scene::End(Ending::AllRight)),
                    ),
                    ("Don't resist it.", Cue::Scene(Scene::End(Ending::Resist))),
                ],
                now,
            );
        }

        // ── The closing definition ──
        (Scene::End(ending), 0) => {
            let (word, definition) = ending_entry(ending);
            let cols = s.grid.dims().cols;
            let text = wrap_text(definition, cols, 2);
            say(s, word, 2, 2, now);
            let done = say(s, &text, 3, 2, now);
            beat_at(s, done + Duration::from_millis(3000), Scene::End(ending), 1);
        }
        (Scene::End(ending), 1) => {
            let (_, definition) = ending_entry(ending);
            let rows = wrapped_rows(s, definition, 2);
            center_link(s, "New query", rows + 6, Cue::Restart, now);
        }

        _ => {}
    }
}

// ── Query screen machinery ──

/// Submit the topic if it holds anything but whitespace; otherwise the
/// prompt stays open.
fn submit(s: &mut Session, now: Instant) {
    let Some(entry) = s.topic_entry.as_ref() else {
        return;
    };
    if entry.buf.chars().all(char::is_whitespace) {
        return;
    }

    let entry = match s.topic_entry.take() {
        Some(e) => e,
        None => return,
    };
    s.options.clear();
    s.pending_topic = Some(entry.buf);
    s.flashing = false;
    s.flash_prev = None;

    let cleared = remove_specials(s, now);
    cue_at(s, cleared, Cue::BeginLookup);
}

fn begin_lookup(s: &mut Session) {
    if let Some(topic) = s.pending_topic.take() {
        s.lookup_rx = Some(lookup::spawn(s.lookup_cfg.clone(), topic));
    }
}

/// Flash one example topic somewhere in the lower half of the grid.
/// Skipped when it would repeat the previous topic or land on the same
/// row; the tick reschedules itself while the prompt is open.
fn flash_tick(s: &mut Session, now: Instant) {
    if !s.flashing {
        return;
    }
    cue_at(s, now + Duration::from_millis(1500), Cue::FlashTick);

    let dims = s.grid.dims();
    let idx = s.rng.random_range(0..EXAMPLE_TOPICS.len());
    let topic = EXAMPLE_TOPICS[idx];
    let len = topic.chars().count();
    if dims.rows <= 17 || dims.cols <= len + 3 {
        return;
    }

    let row = s.rng.random_range(0..dims.rows - 17) + 15;
    let col = s.rng.random_range(1..=dims.cols - len - 3);

    if let Some((prev_idx, prev_row)) = s.flash_prev {
        if prev_idx == idx || prev_row == row {
            return;
        }
    }

    say(s, topic, row, col, now);
    s.flash_prev = Some((idx, row));
    cue_at(s, now + Duration::from_millis(2000), Cue::ClearFlash { row });
}

// ── Endgame machinery ──

fn panic_beat(s: &mut Session, now: Instant, step: u8) {
    match step {
        0 => {
            say(s, "Would I be the same?", 4, 2, now);
        }
        1 | 2 => {
            let cleared = clear_row(s, 4, now);
            // The follow-up line is cancellable too.
            let id = s
                .scheduler
                .schedule_at(cleared, TimerEvent::Cue(Cue::Panic(step + 10)));
            s.panic_timers.push(id);
        }
        11 => {
            say(s, "Will it hurt?", 4, 2, now);
        }
        12 => {
            say(s, "Does something...", 4, 2, now);
        }
        3 => {
            say(s, "Does something come after?", 4, 2, now);
        }
        _ => {}
    }
}

/// Replace one random character of the decaying line and redraw it.
fn corrupt_tick(s: &mut Session, now: Instant) {
    let Some(mut decay) = s.decay.take() else {
        return;
    };

    let glyph = crate::domain::glyph::random_glyph(&mut s.rng);
    let chars: Vec<char> = decay.text.chars().collect();
    if !chars.is_empty() {
        let idx = s.rng.random_range(0..chars.len());
        decay.text = chars
            .iter()
            .enumerate()
            .map(|(i, &c)| if i == idx { glyph } else { c })
            .collect();
    }

    let (row, col) = (decay.row, decay.col);
    let text = decay.text.clone();
    say(s, &text, row, col, now);

    decay.timer = Some(s.scheduler.schedule_at(
        now + Duration::from_millis(5000),
        TimerEvent::Cue(Cue::CorruptTick),
    ));
    s.decay = Some(decay);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::Ink;
    use crate::sim::session::Session;
    use std::time::Instant;

    fn drain_until(s: &mut Session, mut now: Instant, limit_ms: u64) -> Instant {
        let end = now + Duration::from_millis(limit_ms);
        while now < end {
            now += Duration::from_millis(50);
            while let Some(ev) = s.scheduler.pop_due(now) {
                match ev {
                    TimerEvent::Revert { row, col } => {
                        crate::sim::overlay::revert_cell(&mut s.grid, row, col);
                    }
                    TimerEvent::Dissolve { row, col } => {
                        crate::sim::overlay::dissolve_cell(s, row, col);
                    }
                    TimerEvent::Cue(cue) => advance(s, now, cue),
                }
            }
        }
        now
    }

    fn link_labels(s: &Session) -> Vec<String> {
        let mut rows: std::collections::BTreeMap<usize, String> = Default::default();
        for (row, _, cell) in s.grid.iter() {
            if cell.ink == Some(Ink::Link) {
                rows.entry(row).or_default().push(cell.content);
            }
        }
        rows.into_values().collect()
    }

    #[test]
    fn title_screen_offers_start_and_about() {
        let mut s = Session::for_test(24, 80);
        let now = Instant::now();
        advance(&mut s, now, Cue::Scene(Scene::Title));
        let _ = drain_until(&mut s, now, 3000);

        let labels = link_labels(&s);
        assert_eq!(labels, vec!["start".to_string(), "about".to_string()]);
        assert_eq!(s.options.len(), 2);
    }

    #[test]
    fn start_opens_the_topic_prompt() {
        let mut s = Session::for_test(24, 80);
        let mut now = Instant::now();
        advance(&mut s, now, Cue::Scene(Scene::Title));
        now = drain_until(&mut s, now, 1500);

        choose(&mut s, now, 0);
        drain_until(&mut s, now, 1200);

        assert!(s.topic_entry.is_some());
        assert!(s.flashing);
        assert!(s.options.is_empty());
    }

    #[test]
    fn choosing_clears_the_menu_so_it_fires_once() {
        let mut s = Session::for_test(24, 80);
        let now = Instant::now();
        s.push_option(Cue::Scene(Scene::SelfDoubt));
        s.push_option(Cue::Scene(Scene::EasterEgg));

        choose(&mut s, now, 1);
        assert!(s.options.is_empty());

        // A second activation of a stale index does nothing.
        choose(&mut s, now, 0);
        assert!(s.options.is_empty());
    }

    #[test]
    fn submit_link_appears_on_first_character_only() {
        let mut s = Session::for_test(24, 80);
        let now = Instant::now();
        s.topic_entry = Some(TopicEntry {
            buf: String::new(),
            submit_link_shown: false,
        });

        type_char(&mut s, 'c', now);
        type_char(&mut s, 'a', now);
        type_char(&mut s, 't', now);

        assert_eq!(s.topic_entry.as_ref().map(|e| e.buf.as_str()), Some("cat"));
        assert_eq!(s.options.len(), 1);
        assert_eq!(s.options[0], Cue::Submit);
    }

    #[test]
    fn whitespace_topic_is_not_submitted() {
        let mut s = Session::for_test(24, 80);
        let now = Instant::now();
        s.topic_entry = Some(TopicEntry {
            buf: "   ".to_string(),
            submit_link_shown: true,
        });

        submit(&mut s, now);
        assert!(s.topic_entry.is_some());
        assert!(s.pending_topic.is_none());
    }

    #[test]
    fn rejected_submit_keeps_the_link_registered() {
        let mut s = Session::for_test(24, 80);
        let now = Instant::now();
        s.topic_entry = Some(TopicEntry {
            buf: String::new(),
            submit_link_shown: false,
        });

        type_char(&mut s, 'a', now);
        backspace(&mut s);
        assert_eq!(s.options.len(), 1);

        // Clicking submit on a blank topic must not consume the table.
        choose(&mut s, now, 0);
        assert!(s.topic_entry.is_some());
        assert_eq!(s.options.as_slice(), &[Cue::Submit]);

        // The same link still submits once a topic is typed.
        type_char(&mut s, 'a', now);
        choose(&mut s, now, 0);
        assert!(s.topic_entry.is_none());
        assert_eq!(s.pending_topic.as_deref(), Some("a"));
        assert!(s.options.is_empty());
    }

    #[test]
    fn submit_stops_the_flashing_and_stores_the_topic() {
        let mut s = Session::for_test(24, 80);
        let now = Instant::now();
        s.flashing = true;
        s.topic_entry = Some(TopicEntry {
            buf: "Gilgamesh".to_string(),
            submit_link_shown: true,
        });

        submit(&mut s, now);
        assert!(s.topic_entry.is_none());
        assert!(!s.flashing);
        assert_eq!(s.pending_topic.as_deref(), Some("Gilgamesh"));
    }

    #[test]
    fn flash_tick_paints_a_known_example_topic() {
        let mut s = Session::for_test(40, 80);
        let now = Instant::now();
        s.flashing = true;

        flash_tick(&mut s, now);

        let flashed: String = s
            .grid
            .iter()
            .filter(|(_, _, c)| c.special)
            .map(|(_, _, c)| c.proper.unwrap().content)
            .collect();
        assert!(
            EXAMPLE_TOPICS.contains(&flashed.as_str()),
            "unknown topic: {flashed:?}"
        );
    }

    #[test]
    fn failed_lookup_leads_to_the_no_result_scene() {
        let mut s = Session::for_test(24, 80);
        let mut now = Instant::now();
        lookup_settled(&mut s, now, Err(crate::lookup::LookupError::NotFound));
        now = drain_until(&mut s, now, 8000);
        let _ = now;

        // All three reaction options are on screen.
        assert_eq!(s.options.len(), 3);
        let first_row: String = s
            .grid
            .iter()
            .filter(|(row, _, c)| *row == 1 && c.special)
            .map(|(_, _, c)| c.content)
            .collect();
        assert_eq!(first_row, "No results found.");
    }

    #[test]
    fn successful_lookup_prints_title_and_sentence() {
        let mut s = Session::for_test(24, 80);
        let now = Instant::now();
        lookup_settled(
            &mut s,
            now,
            Ok(crate::lookup::Article {
                title: "Wheel".to_string(),
                extract: "A wheel is a rotating component.".to_string(),
            }),
        );
        // long enough to reveal, short of the follow-up beat at 5s
        drain_until(&mut s, now, 1500);

        let title_row: String = s
            .grid
            .iter()
            .filter(|(row, _, c)| *row == 2 && c.special)
            .map(|(_, _, c)| c.content)
            .collect();
        assert_eq!(title_row, "Wheel");

        // The probe and options are queued, not yet drawn.
        assert!(s.options.is_empty());
    }

    #[test]
    fn endgame_runs_through_the_percent_glitch() {
        let mut s = Session::for_test(24, 80);
        let now = Instant::now();
        advance(&mut s, now, Cue::Scene(Scene::Endgame));
        drain_until(&mut s, now, 20_000);

        assert_eq!(s.options.len(), 2);
        let row4: String = s
            .grid
            .iter()
            .filter(|(row, _, c)| *row == 4 && c.special)
            .map(|(_, _, c)| c.content)
            .collect();
        assert_eq!(row4.trim(), "Something is wrong.");
    }

    #[test]
    fn answering_fear_of_death_cancels_the_panic_timers() {
        let mut s = Session::for_test(24, 80);
        let mut now = Instant::now();
        advance(&mut s, now, Cue::Scene(Scene::FearOfDeath));
        now = drain_until(&mut s, now, 3000);
        assert!(!s.panic_timers.is_empty());

        // Choosing an answer enters MindGoing, which cancels them all.
        advance(&mut s, now, Cue::Scene(Scene::MindGoing));
        assert!(s.panic_timers.is_empty());
        now = drain_until(&mut s, now, 20_000);
        let _ = now;

        let row4: String = s
            .grid
            .iter()
            .filter(|(row, _, c)| *row == 4 && c.special)
            .map(|(_, _, c)| c.content)
            .collect();
        assert!(row4.is_empty(), "panic lines must not appear: {row4:?}");
    }

    #[test]
    fn ending_fades_the_static_and_offers_a_new_query() {
        let mut s = Session::for_test(24, 80);
        let now = Instant::now();
        advance(&mut s, now, Cue::Scene(Scene::End(Ending::Fine)));
        assert!(!s.noise_on);

        drain_until(&mut s, now, 15_000);
        assert_eq!(s.options.len(), 1);
        assert_eq!(s.options[0], Cue::Restart);
    }

    #[test]
    fn corrupt_tick_decays_one_character_at_a_time() {
        let mut s = Session::for_test(24, 80);
        let now = Instant::now();
        s.decay = Some(DecayLine {
            text: DECAY_TEXT.to_string(),
            row: DECAY_ROW,
            col: DECAY_COL,
            timer: None,
        });

        corrupt_tick(&mut s, now);
        let decayed = s.decay.as_ref().map(|d| d.text.clone()).unwrap();
        assert_eq!(decayed.chars().count(), DECAY_TEXT.chars().count());
        let differing = decayed
            .chars()
            .zip(DECAY_TEXT.chars())
            .filter(|(a, b)| a != b)
            .count();
        assert!(differing <= 1);
        assert!(s.decay.as_ref().map(|d| d.timer.is_some()).unwrap());
    }

    #[test]
    fn restart_returns_to_the_title() {
        let mut s = Session::for_test(24, 80);
        let now = Instant::now();
        s.noise_on = false;
        s.push_option(Cue::Restart);

        choose(&mut s, now, 0);
        drain_until(&mut s, now, 3000);

        assert!(s.noise_on);
        assert_eq!(link_labels(&s), vec!["start".to_string(), "about".to_string()]);
    }
}
