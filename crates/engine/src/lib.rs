pub mod app;
pub mod content;
mod paths;
pub mod world;

pub use app::{
    run_screen, AppError, BackgroundTick, BackgroundWorker, InputAction, InputSnapshot,
    LoopConfig, Presenter, Rect, Screen, ScreenCommand, SoftwareWindow, TextureId, Window,
};
pub use content::{ImageError, ImageStore, MapRegistry, RegistryError};
pub use paths::{resolve_app_paths, AppPaths, StartupError, ROOT_ENV_VAR};
pub use world::{
    Character, Direction, Map, MapDef, MapDirection, MapId, MapNameBanner, MoveEvent, Sprite,
    Tileset, TilesetId, World, WorldConfig, WorldError, WorldObject,
};
