use std::sync::mpsc::Sender;
use std::time::Duration;

use tracing::debug;

use crate::app::{Rect, Window};
use crate::content::ImageStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    fn sheet_row(self) -> i32 {
        match self {
            Self::Down => 0,
            Self::Left => 1,
            Self::Right => 2,
            Self::Up => 3,
        }
    }
}

/// Movement notifications emitted by a [`Character`]. The world only acts on
/// `End`; the others exist for listeners that animate or play sounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveEvent {
    Start {
        direction: Direction,
        tile_x: i32,
        tile_y: i32,
    },
    Progress {
        direction: Direction,
        percent: f32,
        x: i32,
        y: i32,
    },
    End {
        direction: Direction,
        tile_x: i32,
        tile_y: i32,
    },
}

/// A frame of a sprite sheet drawn at a raw screen position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    image: String,
    frame: Rect,
    raw_x: i32,
    raw_y: i32,
}

impl Sprite {
    pub fn new(image: impl Into<String>, frame: Rect) -> Self {
        Self {
            image: image.into(),
            frame,
            raw_x: 0,
            raw_y: 0,
        }
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
    }

    pub fn width(&self) -> i32 {
        self.frame.width
    }

    pub fn height(&self) -> i32 {
        self.frame.height
    }

    pub fn raw_position(&self) -> (i32, i32) {
        (self.raw_x, self.raw_y)
    }

    pub fn set_raw_position(&mut self, x: i32, y: i32) {
        self.raw_x = x;
        self.raw_y = y;
    }

    pub fn draw(&self, window: &mut dyn Window, images: &ImageStore) {
        let destination = Rect::new(self.raw_x, self.raw_y, self.frame.width, self.frame.height);
        self.draw_to(window, images, destination);
    }

    /// Skipped while the sheet image is still loading.
    pub fn draw_to(&self, window: &mut dyn Window, images: &ImageStore, destination: Rect) {
        let Some(texture) = images.image(&self.image) else {
            return;
        };
        window.draw_texture(texture, Some(self.frame), Some(destination));
    }
}

/// Anything placed on a map: a pixel position, the layer it sits on and a
/// sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldObject {
    pos_x: i32,
    pos_y: i32,
    layer: i32,
    sprite: Sprite,
}

impl WorldObject {
    pub fn new(sprite: Sprite, layer: i32) -> Self {
        Self {
            pos_x: 0,
            pos_y: 0,
            layer,
            sprite,
        }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.pos_x, self.pos_y)
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.pos_x = x;
        self.pos_y = y;
    }

    pub fn layer(&self) -> i32 {
        self.layer
    }

    pub fn set_layer(&mut self, layer: i32) {
        self.layer = layer;
    }

    pub fn sprite(&self) -> &Sprite {
        &self.sprite
    }

    pub fn sprite_mut(&mut self) -> &mut Sprite {
        &mut self.sprite
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkSettings {
    /// Time between pixel steps.
    pub step: Duration,
    /// Pixels advanced per step.
    pub speed_px: u32,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(16),
            speed_px: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Movement {
    direction: Direction,
    moved_px: u32,
    distance_px: u32,
    elapsed: Duration,
}

/// A [`WorldObject`] that walks tile by tile.
#[derive(Debug)]
pub struct Character {
    object: WorldObject,
    tile_x: i32,
    tile_y: i32,
    tile_width: u32,
    tile_height: u32,
    facing: Direction,
    movement: Option<Movement>,
    walk: WalkSettings,
    walk_frame: bool,
    events: Sender<MoveEvent>,
}

impl Character {
    pub fn new(
        object: WorldObject,
        tile_size: (u32, u32),
        walk: WalkSettings,
        events: Sender<MoveEvent>,
    ) -> Self {
        let mut character = Self {
            object,
            tile_x: 0,
            tile_y: 0,
            tile_width: tile_size.0.max(1),
            tile_height: tile_size.1.max(1),
            facing: Direction::Down,
            movement: None,
            walk,
            walk_frame: false,
            events,
        };
        character.sync_pixel_position();
        character.refresh_sprite_frame();
        character
    }

    pub fn object(&self) -> &WorldObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut WorldObject {
        &mut self.object
    }

    pub fn sprite(&self) -> &Sprite {
        self.object.sprite()
    }

    pub fn sprite_mut(&mut self) -> &mut Sprite {
        self.object.sprite_mut()
    }

    pub fn layer(&self) -> i32 {
        self.object.layer()
    }

    pub fn position(&self) -> (i32, i32) {
        self.object.position()
    }

    pub fn tile_x(&self) -> i32 {
        self.tile_x
    }

    pub fn tile_y(&self) -> i32 {
        self.tile_y
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn is_moving(&self) -> bool {
        self.movement.is_some()
    }

    pub fn set_tile_x(&mut self, tile_x: i32) {
        self.tile_x = tile_x;
        self.sync_pixel_position();
    }

    pub fn set_tile_y(&mut self, tile_y: i32) {
        self.tile_y = tile_y;
        self.sync_pixel_position();
    }

    pub fn set_tile_position(&mut self, tile_x: i32, tile_y: i32) {
        self.tile_x = tile_x;
        self.tile_y = tile_y;
        self.sync_pixel_position();
    }

    /// Maps may use different tile sizes; pixel position follows.
    pub fn set_tile_size(&mut self, tile_width: u32, tile_height: u32) {
        self.tile_width = tile_width.max(1);
        self.tile_height = tile_height.max(1);
        self.sync_pixel_position();
    }

    /// Starts a one-tile move. Returns `false` if a move is already running.
    pub fn try_move(&mut self, direction: Direction) -> bool {
        if self.movement.is_some() {
            return false;
        }
        self.facing = direction;
        let distance_px = match direction {
            Direction::Left | Direction::Right => self.tile_width,
            Direction::Up | Direction::Down => self.tile_height,
        };
        self.movement = Some(Movement {
            direction,
            moved_px: 0,
            distance_px,
            elapsed: Duration::ZERO,
        });
        self.emit(MoveEvent::Start {
            direction,
            tile_x: self.tile_x,
            tile_y: self.tile_y,
        });
        self.refresh_sprite_frame();
        true
    }

    /// Turns without moving.
    pub fn face(&mut self, direction: Direction) {
        if self.movement.is_none() {
            self.facing = direction;
            self.refresh_sprite_frame();
        }
    }

    pub fn update(&mut self, dt: Duration) {
        let Some(mut movement) = self.movement.take() else {
            return;
        };
        let step = self.walk.step.max(Duration::from_millis(1));
        let speed = self.walk.speed_px.max(1);
        movement.elapsed += dt;
        while movement.elapsed >= step && movement.moved_px < movement.distance_px {
            movement.elapsed -= step;
            movement.moved_px = (movement.moved_px + speed).min(movement.distance_px);
            self.walk_frame = !self.walk_frame;
            self.apply_move_offset(movement);
            let (x, y) = self.object.position();
            self.emit(MoveEvent::Progress {
                direction: movement.direction,
                percent: movement.moved_px as f32 * 100.0 / movement.distance_px.max(1) as f32,
                x,
                y,
            });
        }

        if movement.moved_px >= movement.distance_px {
            let (dx, dy) = movement.direction.delta();
            self.tile_x += dx;
            self.tile_y += dy;
            self.walk_frame = false;
            self.sync_pixel_position();
            self.emit(MoveEvent::End {
                direction: movement.direction,
                tile_x: self.tile_x,
                tile_y: self.tile_y,
            });
        } else {
            self.movement = Some(movement);
        }
        self.refresh_sprite_frame();
    }

    fn apply_move_offset(&mut self, movement: Movement) {
        let (dx, dy) = movement.direction.delta();
        let moved = movement.moved_px as i32;
        self.object.set_position(
            self.tile_x * self.tile_width as i32 + dx * moved,
            self.tile_y * self.tile_height as i32 + dy * moved,
        );
    }

    fn sync_pixel_position(&mut self) {
        self.object.set_position(
            self.tile_x * self.tile_width as i32,
            self.tile_y * self.tile_height as i32,
        );
    }

    fn refresh_sprite_frame(&mut self) {
        let frame = self.object.sprite().frame();
        let column = i32::from(self.walk_frame);
        let row = self.facing.sheet_row();
        self.object.sprite_mut().set_frame(Rect::new(
            column * frame.width,
            row * frame.height,
            frame.width,
            frame.height,
        ));
    }

    fn emit(&self, event: MoveEvent) {
        if self.events.send(event).is_err() {
            debug!(?event, "move_event_dropped_no_listener");
        }
    }
}
