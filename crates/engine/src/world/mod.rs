mod banner;
mod character;
mod compositor;
mod config;
mod grid;
mod map;
pub mod scroll;
mod tile;
mod tileset;

pub use banner::MapNameBanner;
pub use character::{Character, Direction, MoveEvent, Sprite, WalkSettings, WorldObject};
pub use compositor::{World, WorldError};
pub use config::WorldConfig;
pub use grid::{Grid, GridError};
pub use map::{occupant_slot, Map, MapDef, MapDirection, MapError, MapId};
pub use tile::Tile;
pub use tileset::{AtlasLayout, TileAnimation, Tileset, TilesetId};
