use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::app::{Rect, TextureId, Window};
use crate::content::{ImageStore, MapRegistry};

use super::scroll::{plan_scroll, seam_rects, Neighbor};
use super::{
    occupant_slot, Character, Direction, MapDirection, MapId, MapNameBanner, MoveEvent, Sprite,
    WalkSettings, WorldConfig, WorldObject,
};

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("start map {key} is not loaded")]
    UnknownStartMap { key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScrollTexture {
    texture: TextureId,
    size: (u32, u32),
}

/// Scrolling view of the current map with the player kept centred.
///
/// Each frame the current map's layers are composed into a scroll texture
/// twice the viewport size. Near an edge the source is clamped and the strip
/// that would fall off the map is filled from the bordering map, so maps are
/// never stitched into one texture. Maps themselves live in the
/// [`MapRegistry`]; the world only remembers which one is current.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    current: MapId,
    player: Character,
    move_events: Receiver<MoveEvent>,
    scroll: Option<ScrollTexture>,
    discard_scroll: bool,
    banner: MapNameBanner,
}

impl World {
    pub fn new(config: WorldConfig, registry: &MapRegistry, now: Instant) -> Result<Self, WorldError> {
        let Some(map) = registry
            .map_id(&config.start_map)
            .and_then(|id| registry.map(id))
        else {
            return Err(WorldError::UnknownStartMap {
                key: config.start_map.clone(),
            });
        };

        let (sender, move_events) = mpsc::channel();
        let (frame_w, frame_h) = config.player_frame_size;
        let sprite = Sprite::new(
            config.player_sheet.clone(),
            Rect::new(0, 0, frame_w as i32, frame_h as i32),
        );
        let walk = WalkSettings {
            step: config.walk_step,
            speed_px: config.walk_speed_px,
        };
        let mut player = Character::new(
            WorldObject::new(sprite, config.player_layer),
            (map.tile_width(), map.tile_height()),
            walk,
            sender,
        );
        let (start_x, start_y) = config.start_tile;
        player.set_tile_position(
            start_x.clamp(0, map.width() as i32 - 1),
            start_y.clamp(0, map.height() as i32 - 1),
        );

        let mut world = Self {
            banner: MapNameBanner::new(config.banner_text_scale),
            config,
            current: map.id(),
            player,
            move_events,
            scroll: None,
            discard_scroll: false,
        };
        world.announce_map(map.name(), now);
        info!(
            map = map.key(),
            tile_x = world.player.tile_x(),
            tile_y = world.player.tile_y(),
            "world_started"
        );
        Ok(world)
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn current_map(&self) -> MapId {
        self.current
    }

    pub fn player(&self) -> &Character {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Character {
        &mut self.player
    }

    pub fn banner(&self) -> &MapNameBanner {
        &self.banner
    }

    pub fn try_move(&mut self, direction: Direction) -> bool {
        self.player.try_move(direction)
    }

    /// Advances the player and applies the movement events it produced.
    pub fn update(&mut self, dt: Duration, registry: &MapRegistry, now: Instant) {
        self.player.update(dt);
        while let Ok(event) = self.move_events.try_recv() {
            self.handle_move_event(event, registry, now);
        }
        self.banner.update(now);
    }

    /// Advances tile animations of the current map.
    pub fn background_tick(&mut self, registry: &mut MapRegistry) {
        if let Some((map, tileset)) = registry.map_and_tileset_mut(self.current) {
            map.update(tileset);
        }
    }

    pub fn handle_move_event(&mut self, event: MoveEvent, registry: &MapRegistry, now: Instant) {
        let MoveEvent::End {
            direction,
            tile_x,
            tile_y,
        } = event
        else {
            return;
        };
        let Some(map) = registry.map(self.current) else {
            return;
        };
        let (width, height) = (map.width() as i32, map.height() as i32);
        let crossing = match direction {
            Direction::Down if tile_y >= height => Some(MapDirection::South),
            Direction::Up if tile_y < 0 => Some(MapDirection::North),
            Direction::Right if tile_x >= width => Some(MapDirection::East),
            Direction::Left if tile_x < 0 => Some(MapDirection::West),
            _ => None,
        };
        let Some(border) = crossing else {
            return;
        };

        let Some(next) = map.bordering_map(border).and_then(|id| registry.map(id)) else {
            self.player
                .set_tile_position(tile_x.clamp(0, width - 1), tile_y.clamp(0, height - 1));
            debug!(
                map = map.key(),
                direction = border.as_str(),
                "map_edge_blocked"
            );
            return;
        };

        let (next_w, next_h) = (next.width() as i32, next.height() as i32);
        let (new_x, new_y) = match border {
            MapDirection::South => (tile_x, 0),
            MapDirection::North => (tile_x, next_h - 1),
            MapDirection::East => (0, tile_y),
            MapDirection::West => (next_w - 1, tile_y),
        };
        let next_id = next.id();
        self.change_map(next_id, registry, now);
        self.player
            .set_tile_position(new_x.clamp(0, next_w - 1), new_y.clamp(0, next_h - 1));
    }

    /// Makes `id` the current map. The scroll texture is rebuilt on the next
    /// render and the map-name banner is shown again.
    pub fn change_map(&mut self, id: MapId, registry: &MapRegistry, now: Instant) -> bool {
        let Some(next) = registry.map(id) else {
            return false;
        };
        let previous = registry.map(self.current).map(|map| map.key()).unwrap_or("?");
        info!(from = previous, to = next.key(), "map_changed");
        self.current = id;
        self.player.set_tile_size(next.tile_width(), next.tile_height());
        self.discard_scroll = true;
        self.announce_map(next.name(), now);
        true
    }

    /// Composes the visible part of the world into the current render target.
    /// Draws nothing until the current map can be generated.
    pub fn render(&mut self, window: &mut dyn Window, registry: &mut MapRegistry, images: &ImageStore) {
        let Some(map) = registry.map(self.current) else {
            return;
        };
        let tile = (map.tile_width() as i32, map.tile_height() as i32);
        let draw = self.config.draw_size(map.tile_width(), map.tile_height());
        let player_pos = self.player.position();
        let plan = plan_scroll(player_pos, draw, tile, (map.pixel_width(), map.pixel_height()));
        let seams: Vec<(MapId, MapDirection, i32)> = plan
            .seams()
            .filter_map(|(direction, overflow)| {
                map.bordering_map(direction)
                    .map(|neighbor| (neighbor, direction, overflow))
            })
            .collect();

        // Generation switches render targets, so every map is prepared before
        // composing starts.
        let mut strips = Vec::with_capacity(seams.len());
        for (neighbor_id, direction, overflow) in seams {
            let Some((neighbor, tileset)) = registry.map_and_tileset_mut(neighbor_id) else {
                continue;
            };
            if !neighbor.prepare(window, tileset, images) {
                continue;
            }
            let geometry = Neighbor {
                tile_size: (neighbor.tile_width() as i32, neighbor.tile_height() as i32),
                pixel_size: (neighbor.pixel_width(), neighbor.pixel_height()),
                draw_size: self
                    .config
                    .draw_size(neighbor.tile_width(), neighbor.tile_height()),
            };
            let (source, destination) = seam_rects(direction, overflow, player_pos, geometry, &plan);
            strips.push((neighbor.layer_textures().to_vec(), source, destination));
        }

        let Some((map, tileset)) = registry.map_and_tileset_mut(self.current) else {
            return;
        };
        if !map.prepare(window, tileset, images) {
            return;
        }
        let layers = map.layer_textures();

        let scroll = self.scroll_texture(window, draw);
        window.set_render_target(scroll);
        window.clear_render_target();
        for (textures, source, destination) in &strips {
            for &texture in textures {
                window.draw_texture(texture, Some(*source), Some(*destination));
            }
        }

        let sprite = self.player.sprite_mut();
        let (sprite_w, sprite_h) = (sprite.width(), sprite.height());
        sprite.set_raw_position(
            draw.0 - sprite_w / 2,
            draw.1 - sprite_h / 2 + self.config.character_tile_offset_y,
        );
        let slot = occupant_slot(self.player.layer(), layers.len());
        for (index, &texture) in layers.iter().enumerate() {
            window.draw_texture(texture, Some(plan.source), Some(plan.destination));
            if Some(index) == slot {
                self.player.sprite().draw(window, images);
            }
        }
        window.reset_render_target();

        window.draw_texture(
            scroll,
            Some(Rect::new(draw.0 / 2, draw.1 / 2, draw.0, draw.1)),
            None,
        );
        self.banner.draw(window);
    }

    /// Releases the scroll texture. Call before dropping the window.
    pub fn release(&mut self, window: &mut dyn Window) {
        if let Some(scroll) = self.scroll.take() {
            window.destroy_texture(scroll.texture);
        }
    }

    fn scroll_texture(&mut self, window: &mut dyn Window, draw: (i32, i32)) -> TextureId {
        let size = ((draw.0 * 2).max(1) as u32, (draw.1 * 2).max(1) as u32);
        let reusable = self
            .scroll
            .filter(|scroll| scroll.size == size && !self.discard_scroll);
        if let Some(scroll) = reusable {
            return scroll.texture;
        }
        self.release(window);
        let texture = window.create_texture(size.0, size.1);
        debug!(width = size.0, height = size.1, "scroll_texture_created");
        self.scroll = Some(ScrollTexture { texture, size });
        self.discard_scroll = false;
        texture
    }

    fn announce_map(&mut self, name: &str, now: Instant) {
        self.banner.dismiss();
        self.banner.set_text(name);
        self.banner.show();
        self.banner.dismiss_after(self.config.banner_duration, now);
    }
}
