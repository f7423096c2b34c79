mod background;
mod input;
mod loop_runner;
mod rendering;
mod screen;
mod timing;

pub use background::{BackgroundTick, BackgroundWorker};
pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_screen, AppError, LoopConfig};
pub use rendering::text;
pub use rendering::{Presenter, Rect, SoftwareWindow, TextureId, Window};
pub use screen::{Screen, ScreenCommand};
pub use timing::LoopMetricsSnapshot;
