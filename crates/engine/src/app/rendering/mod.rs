mod presenter;
mod rect;
mod software;
pub mod text;
mod window;

pub use presenter::Presenter;
pub use rect::Rect;
pub use software::SoftwareWindow;
pub use window::{TextureId, Window};
