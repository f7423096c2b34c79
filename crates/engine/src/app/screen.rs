use std::time::{Duration, Instant};

use super::{BackgroundTick, InputSnapshot, Window};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenCommand {
    None,
    Quit,
}

/// What the loop runner drives: one active screen at a time.
///
/// Every method runs on the main thread. `update_in_background` receives the
/// ticks produced by the background worker after they have been handed over.
pub trait Screen {
    fn start(&mut self, window: &mut dyn Window);
    fn update(&mut self, fixed_dt: Duration, input: &InputSnapshot, now: Instant) -> ScreenCommand;
    fn update_in_background(&mut self, _tick: BackgroundTick) {}
    fn render(&mut self, window: &mut dyn Window);
    fn stop(&mut self, window: &mut dyn Window);
    fn debug_title(&self) -> Option<String> {
        None
    }
}
