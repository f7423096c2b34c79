use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Quit,
}

impl InputAction {
    const MOVES: [InputAction; 4] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }

    fn is_move(self) -> bool {
        self != InputAction::Quit
    }
}

/// What a physical key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    Action(InputAction),
    DebugToggle,
}

fn binding(key: PhysicalKey) -> Option<Binding> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    let action = match code {
        KeyCode::KeyW | KeyCode::ArrowUp => InputAction::MoveUp,
        KeyCode::KeyS | KeyCode::ArrowDown => InputAction::MoveDown,
        KeyCode::KeyA | KeyCode::ArrowLeft => InputAction::MoveLeft,
        KeyCode::KeyD | KeyCode::ArrowRight => InputAction::MoveRight,
        KeyCode::Escape => InputAction::Quit,
        KeyCode::F3 => return Some(Binding::DebugToggle),
        _ => return None,
    };
    Some(Binding::Action(action))
}

/// Input state handed to a screen for one fixed update.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    debug_toggle_pressed: bool,
    held: u8,
    last_move: Option<InputAction>,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// True only for the first update after F3 went down.
    pub fn debug_toggle_pressed(&self) -> bool {
        self.debug_toggle_pressed
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held & action.bit() != 0
    }

    /// The held movement action, preferring the most recently pressed one.
    pub fn held_move(&self) -> Option<InputAction> {
        self.last_move
            .filter(|action| self.is_down(*action))
            .or_else(|| {
                InputAction::MOVES
                    .into_iter()
                    .find(|action| self.is_down(*action))
            })
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.set_down(action, is_down);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_debug_toggle_pressed(mut self, pressed: bool) -> Self {
        self.debug_toggle_pressed = pressed;
        self
    }

    fn set_down(&mut self, action: InputAction, is_down: bool) {
        if is_down {
            if action.is_move() && !self.is_down(action) {
                self.last_move = Some(action);
            }
            self.held |= action.bit();
        } else {
            self.held &= !action.bit();
        }
    }
}

/// Folds keyboard events into the snapshot the next update sees.
#[derive(Debug, Default)]
pub(crate) struct InputCollector {
    state: InputSnapshot,
    debug_key_down: bool,
}

impl InputCollector {
    pub(crate) fn quit_requested(&self) -> bool {
        self.state.quit_requested
    }

    pub(crate) fn mark_quit_requested(&mut self) {
        self.state.quit_requested = true;
    }

    pub(crate) fn handle_keyboard_input(&mut self, event: &KeyEvent) {
        self.apply_key(event.physical_key, event.state == ElementState::Pressed);
    }

    /// Returns the current state and clears the one-shot debug toggle.
    pub(crate) fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = self.state;
        self.state.debug_toggle_pressed = false;
        snapshot
    }

    fn apply_key(&mut self, key: PhysicalKey, pressed: bool) {
        match binding(key) {
            Some(Binding::Action(action)) => {
                if action == InputAction::Quit && pressed {
                    self.mark_quit_requested();
                }
                self.state.set_down(action, pressed);
            }
            Some(Binding::DebugToggle) => {
                if pressed && !self.debug_key_down {
                    self.state.debug_toggle_pressed = true;
                }
                self.debug_key_down = pressed;
            }
            None => {}
        }
    }
}
