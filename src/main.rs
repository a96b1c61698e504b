/// Entry point and session loop.

mod config;
mod domain;
mod lookup;
mod sim;
mod story;
mod ui;

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use config::GameConfig;
use lookup::{LookupError, LookupReply};
use sim::event::TimerEvent;
use sim::session::Session;
use sim::{noise, overlay};
use story::{Cue, Scene};
use ui::input::InputState;
use ui::measure;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

const MIN_GRID_WIDTH: usize = 70;
const MIN_GRID_HEIGHT: usize = 15;

const TOO_SMALL: &str = "Terminal is too small for all the content to fit. If possible, \
    resize the terminal and restart. Continuing might cut some content off.";

fn main() {
    let config = GameConfig::load();

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = run(&mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }
}

fn run(renderer: &mut Renderer, config: &GameConfig) -> Result<(), Box<dyn std::error::Error>> {
    let dims = measure::terminal_dimensions()?;

    let mut session = Session::new(
        dims,
        config.timing,
        config.lookup.clone(),
        StdRng::from_os_rng(),
    );
    noise::populate(&mut session);

    if dims.cols < MIN_GRID_WIDTH || dims.rows < MIN_GRID_HEIGHT {
        session.banner = Some(TOO_SMALL);
    }

    story::advance(&mut session, Instant::now(), Cue::Scene(Scene::Title));

    session_loop(&mut session, renderer)
}

fn session_loop(
    s: &mut Session,
    renderer: &mut Renderer,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut input = InputState::new();
    let noise_tick = Duration::from_millis(s.timing.noise_tick_ms);
    let mut last_churn = Instant::now();

    loop {
        input.digits_are_text = s.topic_entry.is_some();
        input.drain_events();
        let now = Instant::now();

        if input.ctrl_c_pressed() {
            break;
        }
        // Esc quits from the title menu only; mid-story it is ignored.
        if input.escape && at_title(s) {
            break;
        }

        handle_input(s, &input, now);

        while let Some(event) = s.scheduler.pop_due(now) {
            match event {
                TimerEvent::Revert { row, col } => overlay::revert_cell(&mut s.grid, row, col),
                TimerEvent::Dissolve { row, col } => overlay::dissolve_cell(s, row, col),
                TimerEvent::Cue(cue) => story::advance(s, now, cue),
            }
        }

        if s.noise_on && now.duration_since(last_churn) >= noise_tick {
            noise::churn(s, now);
            last_churn = now;
        }

        if let Some(reply) = poll_lookup(s) {
            story::lookup_settled(s, now, reply);
        }

        renderer.render(s)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

fn at_title(s: &Session) -> bool {
    s.options.iter().any(|c| *c == Cue::Scene(Scene::Query))
}

fn handle_input(s: &mut Session, input: &InputState, now: Instant) {
    for &ch in &input.typed {
        story::type_char(s, ch, now);
    }
    if input.backspace {
        story::backspace(s);
    }
    if input.enter {
        story::advance(s, now, Cue::Submit);
    }

    for &idx in &input.hotkeys {
        story::choose(s, now, idx);
    }

    for &(x, y) in &input.clicks {
        let link = s
            .grid
            .get(y as usize, x as usize)
            .and_then(|cell| cell.link);
        if let Some(idx) = link {
            story::choose(s, now, idx as usize);
        }
    }
}

/// Non-blocking check on the lookup worker. A dead channel is reported
/// as a transport failure so the story still moves on.
fn poll_lookup(s: &mut Session) -> Option<LookupReply> {
    use std::sync::mpsc::TryRecvError;

    let rx = s.lookup_rx.as_ref()?;
    match rx.try_recv() {
        Ok(reply) => Some(reply),
        Err(TryRecvError::Empty) => None,
        Err(TryRecvError::Disconnected) => Some(Err(LookupError::Transport(
            "lookup worker disconnected".to_string(),
        ))),
    }
}
