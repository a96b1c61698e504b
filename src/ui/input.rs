/// Input state tracker.
///
/// Drains all pending terminal events once per frame and sorts them
/// into what the game reacts to: typed characters for the topic prompt,
/// Enter/Backspace, digit hotkeys for menus, left clicks for links, and
/// the exit chords. Release and repeat events are ignored; every action
/// here is edge-triggered.

use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind, poll,
};

#[derive(Default)]
pub struct InputState {
    /// Printable characters typed this frame, in order.
    pub typed: Vec<char>,
    /// Digit keys pressed this frame, as menu indices (key 1 → 0).
    pub hotkeys: Vec<usize>,
    /// Left-button presses this frame, as (col, row) terminal cells.
    pub clicks: Vec<(u16, u16)>,
    pub enter: bool,
    pub backspace: bool,
    pub escape: bool,
    ctrl_c: bool,
    /// Whether digits go to `hotkeys` or `typed`; set per frame by the
    /// caller depending on whether the prompt is open.
    pub digits_are_text: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState::default()
    }

    /// Drain all pending terminal events. Call once per frame.
    pub fn drain_events(&mut self) {
        self.typed.clear();
        self.hotkeys.clear();
        self.clicks.clear();
        self.enter = false;
        self.backspace = false;
        self.escape = false;
        self.ctrl_c = false;

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
                    {
                        self.ctrl_c = true;
                        continue;
                    }

                    match key.code {
                        KeyCode::Enter => self.enter = true,
                        KeyCode::Backspace => self.backspace = true,
                        KeyCode::Esc => self.escape = true,
                        KeyCode::Char(ch) => {
                            if let Some(idx) = menu_index(ch, self.digits_are_text) {
                                self.hotkeys.push(idx);
                            } else if !ch.is_control() {
                                self.typed.push(ch);
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Mouse(mouse)) => {
                    if mouse.kind == MouseEventKind::Down(MouseButton::Left) {
                        self.clicks.push((mouse.column, mouse.row));
                    }
                }
                _ => {}
            }
        }
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.ctrl_c
    }
}

/// Digits select menu options, except while the prompt is open and they
/// spell part of the topic.
fn menu_index(ch: char, digits_are_text: bool) -> Option<usize> {
    if digits_are_text {
        return None;
    }
    match ch.to_digit(10) {
        Some(d) if d >= 1 => Some((d - 1) as usize),
        _ => None,
    }
}
