use crate::app::{Rect, TextureId, Window};

/// One drawable cell type of a tileset.
///
/// The source region is fixed per frame; the destination rect is set by the
/// caller before each draw because one tile is reused for every grid cell that
/// references it. Animated tiles cycle through `frames` every `frame_ticks`
/// updates, and every cell using the tile sees the same frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    frames: Vec<Rect>,
    frame_ticks: u32,
    ticks: u32,
    current_frame: usize,
    destination: Rect,
}

impl Tile {
    pub fn new(source: Rect) -> Self {
        Self {
            frames: vec![source],
            frame_ticks: 0,
            ticks: 0,
            current_frame: 0,
            destination: Rect::default(),
        }
    }

    /// An empty frame list falls back to a single zero-sized frame.
    pub fn animated(frames: Vec<Rect>, frame_ticks: u32) -> Self {
        let frames = if frames.is_empty() {
            vec![Rect::default()]
        } else {
            frames
        };
        Self {
            frames,
            frame_ticks: frame_ticks.max(1),
            ticks: 0,
            current_frame: 0,
            destination: Rect::default(),
        }
    }

    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    pub fn source(&self) -> Rect {
        self.frames[self.current_frame]
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn destination(&self) -> Rect {
        self.destination
    }

    pub fn set_destination_rect(&mut self, destination: Rect) {
        self.destination = destination;
    }

    /// Advances the animation clock by one update. Returns `true` when the
    /// visible frame changed.
    pub fn update(&mut self) -> bool {
        if !self.is_animated() {
            return false;
        }
        self.ticks += 1;
        if self.ticks < self.frame_ticks {
            return false;
        }
        self.ticks = 0;
        self.current_frame = (self.current_frame + 1) % self.frames.len();
        true
    }

    pub fn draw(&self, window: &mut dyn Window, image: TextureId) {
        window.draw_texture(image, Some(self.source()), Some(self.destination));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_tile_never_changes_frame() {
        let mut tile = Tile::new(Rect::new(16, 0, 16, 16));
        for _ in 0..10 {
            assert!(!tile.update());
        }
        assert_eq!(tile.source(), Rect::new(16, 0, 16, 16));
    }

    #[test]
    fn animated_tile_cycles_frames_on_tick_boundary() {
        let frames = vec![Rect::new(0, 0, 8, 8), Rect::new(8, 0, 8, 8)];
        let mut tile = Tile::animated(frames, 3);
        assert!(!tile.update());
        assert!(!tile.update());
        assert!(tile.update());
        assert_eq!(tile.current_frame(), 1);
        assert_eq!(tile.source(), Rect::new(8, 0, 8, 8));
        tile.update();
        tile.update();
        assert!(tile.update());
        assert_eq!(tile.current_frame(), 0);
    }

    #[test]
    fn empty_animation_is_safe() {
        let mut tile = Tile::animated(Vec::new(), 0);
        assert!(!tile.is_animated());
        assert!(!tile.update());
        assert_eq!(tile.source(), Rect::default());
    }
}
