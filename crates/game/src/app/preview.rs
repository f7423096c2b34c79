use std::time::{Duration, Instant};

use overworld_engine::{
    BackgroundTick, ImageStore, InputSnapshot, MapId, MapRegistry, Rect, Screen, ScreenCommand,
    Sprite, Window, WorldObject,
};
use tracing::info;

use super::overworld::move_direction;

const MOVE_COOLDOWN: Duration = Duration::from_millis(120);

/// Shows a single map with a marker that jumps tile by tile. No transitions,
/// no world; the map draws itself.
pub(crate) struct MapPreviewScreen {
    registry: MapRegistry,
    images: ImageStore,
    map: MapId,
    view_tiles: (u32, u32),
    tile: (i32, i32),
    cooldown: Duration,
}

impl MapPreviewScreen {
    pub(crate) fn new(
        mut registry: MapRegistry,
        images: ImageStore,
        map: MapId,
        marker_sheet: String,
        marker_frame: (u32, u32),
        view_tiles: (u32, u32),
    ) -> Self {
        let mut tile = (0, 0);
        if let Some(preview) = registry.map_mut(map) {
            tile = (preview.width() as i32 / 2, preview.height() as i32 / 2);
            let sprite = Sprite::new(
                marker_sheet,
                Rect::new(0, 0, marker_frame.0 as i32, marker_frame.1 as i32),
            );
            preview.place_occupant(WorldObject::new(sprite, 0), tile.0, tile.1);
        }
        Self {
            registry,
            images,
            map,
            view_tiles,
            tile,
            cooldown: Duration::ZERO,
        }
    }

    fn step_marker(&mut self, dx: i32, dy: i32) {
        let Some(map) = self.registry.map_mut(self.map) else {
            return;
        };
        let x = (self.tile.0 + dx).clamp(0, map.width() as i32 - 1);
        let y = (self.tile.1 + dy).clamp(0, map.height() as i32 - 1);
        if (x, y) == self.tile {
            return;
        }
        if let Some(marker) = map.remove_occupant() {
            map.place_occupant(marker, x, y);
        }
        self.tile = (x, y);
    }
}

impl Screen for MapPreviewScreen {
    fn start(&mut self, window: &mut dyn Window) {
        self.images.load_next_image(window);
        let name = self.registry.map(self.map).map_or("?", |map| map.name());
        info!(map = name, "preview_started");
    }

    fn update(&mut self, fixed_dt: Duration, input: &InputSnapshot, _now: Instant) -> ScreenCommand {
        if input.quit_requested() {
            return ScreenCommand::Quit;
        }
        self.cooldown = self.cooldown.saturating_sub(fixed_dt);
        if self.cooldown > Duration::ZERO {
            return ScreenCommand::None;
        }
        if let Some(direction) = input.held_move().and_then(move_direction) {
            let (dx, dy) = direction.delta();
            self.step_marker(dx, dy);
            self.cooldown = MOVE_COOLDOWN;
        }
        ScreenCommand::None
    }

    fn update_in_background(&mut self, _tick: BackgroundTick) {
        if let Some((map, tileset)) = self.registry.map_and_tileset_mut(self.map) {
            map.update(tileset);
        }
    }

    fn render(&mut self, window: &mut dyn Window) {
        self.images.load_next_image(window);
        if let Some((map, tileset)) = self.registry.map_and_tileset_mut(self.map) {
            map.draw(window, tileset, &self.images, self.view_tiles);
        }
    }

    fn stop(&mut self, _window: &mut dyn Window) {}

    fn debug_title(&self) -> Option<String> {
        let map = self.registry.map(self.map)?;
        Some(format!(
            "Preview | {} | tile ({}, {})",
            map.name(),
            self.tile.0,
            self.tile.1
        ))
    }
}
