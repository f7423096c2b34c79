//! Viewport arithmetic for the scrolling compositor.
//!
//! Everything here is in pixels. The compositor draws into a scroll texture
//! twice the size of the viewport; the visible viewport sits at
//! `(draw_width / 2, draw_height / 2)` inside it. Sources are in map space,
//! destinations in scroll texture space.

use crate::app::Rect;

use super::MapDirection;

/// Where the viewport falls on one axis of the current map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisPlan {
    pub source: i32,
    pub destination: i32,
    /// Pixels past the near (`< 0`) or far edge that a neighbour must fill.
    pub overflow: Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    None,
    Before(i32),
    After(i32),
}

/// Centres `draw` pixels on `player` and clamps to `[0, extent - draw]`.
/// The clamped distance moves to the destination so the player stays centred
/// on screen.
pub fn plan_axis(player: i32, draw: i32, tile: i32, extent: i32) -> AxisPlan {
    let target = player - draw / 2 + tile / 2;
    let far_limit = extent - draw;
    if target < 0 {
        AxisPlan {
            source: 0,
            destination: draw / 2 - target,
            overflow: Overflow::Before(-target),
        }
    } else if target > far_limit {
        let overflow = target - far_limit;
        AxisPlan {
            source: far_limit,
            destination: draw / 2 - overflow,
            overflow: Overflow::After(overflow),
        }
    } else {
        AxisPlan {
            source: target,
            destination: draw / 2,
            overflow: Overflow::None,
        }
    }
}

/// Source and destination of the current map plus the seams to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPlan {
    pub source: Rect,
    pub destination: Rect,
    pub horizontal: Option<(MapDirection, i32)>,
    pub vertical: Option<(MapDirection, i32)>,
}

impl ScrollPlan {
    pub fn seams(&self) -> impl Iterator<Item = (MapDirection, i32)> {
        self.vertical.into_iter().chain(self.horizontal)
    }

    pub fn is_interior(&self) -> bool {
        self.horizontal.is_none() && self.vertical.is_none()
    }
}

pub fn plan_scroll(
    player: (i32, i32),
    draw_size: (i32, i32),
    tile_size: (i32, i32),
    map_size: (i32, i32),
) -> ScrollPlan {
    let x = plan_axis(player.0, draw_size.0, tile_size.0, map_size.0);
    let y = plan_axis(player.1, draw_size.1, tile_size.1, map_size.1);
    let horizontal = match x.overflow {
        Overflow::None => None,
        Overflow::Before(amount) => Some((MapDirection::West, amount)),
        Overflow::After(amount) => Some((MapDirection::East, amount)),
    };
    let vertical = match y.overflow {
        Overflow::None => None,
        Overflow::Before(amount) => Some((MapDirection::North, amount)),
        Overflow::After(amount) => Some((MapDirection::South, amount)),
    };
    ScrollPlan {
        source: Rect::new(x.source, y.source, draw_size.0, draw_size.1),
        destination: Rect::new(x.destination, y.destination, draw_size.0, draw_size.1),
        horizontal,
        vertical,
    }
}

/// The neighbour's side of a seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub tile_size: (i32, i32),
    pub pixel_size: (i32, i32),
    /// Viewport size measured in the neighbour's tiles.
    pub draw_size: (i32, i32),
}

/// Rects that draw the `overflow`-wide strip of a neighbour lying in
/// `direction`. The cross axis is centred on the player without clamping so
/// it lines up with the current map; anything outside the neighbour is
/// clipped by the draw.
pub fn seam_rects(
    direction: MapDirection,
    overflow: i32,
    player: (i32, i32),
    neighbor: Neighbor,
    main: &ScrollPlan,
) -> (Rect, Rect) {
    let (draw_w, draw_h) = neighbor.draw_size;
    let cross_x = player.0 - draw_w / 2 + neighbor.tile_size.0 / 2;
    let cross_y = player.1 - draw_h / 2 + neighbor.tile_size.1 / 2;
    let (main_w, main_h) = (main.destination.width, main.destination.height);
    match direction {
        MapDirection::North => (
            Rect::new(cross_x, neighbor.pixel_size.1 - overflow, draw_w, overflow),
            Rect::new(draw_w / 2, main_h / 2, draw_w, overflow),
        ),
        MapDirection::South => (
            Rect::new(cross_x, 0, draw_w, overflow),
            Rect::new(draw_w / 2, main.destination.y + main_h, draw_w, overflow),
        ),
        MapDirection::West => (
            Rect::new(neighbor.pixel_size.0 - overflow, cross_y, overflow, draw_h),
            Rect::new(main_w / 2, draw_h / 2, overflow, draw_h),
        ),
        MapDirection::East => (
            Rect::new(0, cross_y, overflow, draw_h),
            Rect::new(main.destination.x + main_w, draw_h / 2, overflow, draw_h),
        ),
    }
}
