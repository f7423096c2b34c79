use std::time::{Duration, Instant};

use overworld_engine::{
    BackgroundTick, Direction, ImageStore, InputAction, InputSnapshot, MapRegistry, Screen,
    ScreenCommand, Window, World,
};
use tracing::{debug, info};

/// The game proper: one world walking across the loaded maps.
pub(crate) struct OverworldScreen {
    registry: MapRegistry,
    images: ImageStore,
    world: World,
    show_debug: bool,
}

impl OverworldScreen {
    pub(crate) fn new(registry: MapRegistry, images: ImageStore, world: World) -> Self {
        Self {
            registry,
            images,
            world,
            show_debug: false,
        }
    }
}

pub(crate) fn move_direction(action: InputAction) -> Option<Direction> {
    match action {
        InputAction::MoveUp => Some(Direction::Up),
        InputAction::MoveDown => Some(Direction::Down),
        InputAction::MoveLeft => Some(Direction::Left),
        InputAction::MoveRight => Some(Direction::Right),
        InputAction::Quit => None,
    }
}

impl Screen for OverworldScreen {
    fn start(&mut self, window: &mut dyn Window) {
        self.images.load_next_image(window);
        info!(pending_images = self.images.pending_count(), "overworld_started");
    }

    fn update(&mut self, fixed_dt: Duration, input: &InputSnapshot, now: Instant) -> ScreenCommand {
        if input.quit_requested() {
            return ScreenCommand::Quit;
        }
        if input.debug_toggle_pressed() {
            self.show_debug = !self.show_debug;
            debug!(enabled = self.show_debug, "debug_overlay_toggled");
        }
        if !self.world.player().is_moving() {
            if let Some(direction) = input.held_move().and_then(move_direction) {
                self.world.try_move(direction);
            }
        }
        self.world.update(fixed_dt, &self.registry, now);
        ScreenCommand::None
    }

    fn update_in_background(&mut self, _tick: BackgroundTick) {
        self.world.background_tick(&mut self.registry);
    }

    fn render(&mut self, window: &mut dyn Window) {
        self.images.load_next_image(window);
        self.world.render(window, &mut self.registry, &self.images);
    }

    fn stop(&mut self, window: &mut dyn Window) {
        self.world.release(window);
    }

    fn debug_title(&self) -> Option<String> {
        if !self.show_debug {
            return None;
        }
        let map = self
            .registry
            .map(self.world.current_map())
            .map_or("?", |map| map.key());
        let player = self.world.player();
        let (x, y) = player.position();
        Some(format!(
            "Overworld | map {map} | tile ({}, {}) | px ({x}, {y})",
            player.tile_x(),
            player.tile_y()
        ))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use overworld_engine::world::AtlasLayout;
    use overworld_engine::{MapDef, MapDirection, SoftwareWindow, Tileset, WorldConfig};

    const STEP: Duration = Duration::from_millis(16);

    /// "town" (10x8) with "route" (10x6) to its north.
    pub(crate) fn registry() -> MapRegistry {
        let mut registry = MapRegistry::new();
        let layout = AtlasLayout {
            tile_width: 16,
            tile_height: 16,
            columns: 2,
            tile_count: 2,
            margin: 0,
            spacing: 0,
        };
        let tileset = registry
            .insert_tileset(Tileset::from_atlas("outdoor", "outdoor.png", layout, &[]))
            .expect("tileset");
        let def = |key: &str, name: &str, width: u32, height: u32| MapDef {
            key: key.to_string(),
            name: name.to_string(),
            width,
            height,
            layers: vec![vec![1; (width * height) as usize], vec![0; (width * height) as usize]],
        };
        let town = registry
            .insert_map(def("town", "Town", 10, 8), tileset)
            .expect("town");
        let route = registry
            .insert_map(def("route", "Route", 10, 6), tileset)
            .expect("route");
        registry.link(town, MapDirection::North, route);
        registry
    }

    pub(crate) fn images(window: &mut SoftwareWindow) -> ImageStore {
        let mut images = ImageStore::new("unused");
        let tiles = window.create_texture(32, 16);
        images.insert_loaded("outdoor.png", tiles);
        let sheet = window.create_texture(32, 96);
        images.insert_loaded("player.png", sheet);
        images
    }

    fn screen(window: &mut SoftwareWindow, start_tile: (i32, i32)) -> OverworldScreen {
        let registry = registry();
        let config = WorldConfig {
            start_map: "town".to_string(),
            start_tile,
            ..WorldConfig::default()
        };
        let world = World::new(config, &registry, Instant::now()).expect("world");
        OverworldScreen::new(registry, images(window), world)
    }

    fn run_until_idle(screen: &mut OverworldScreen, input: &InputSnapshot, now: Instant) {
        screen.update(STEP, input, now);
        for _ in 0..64 {
            if !screen.world.player().is_moving() {
                return;
            }
            screen.update(STEP, &InputSnapshot::empty(), now);
        }
        panic!("player never stopped moving");
    }

    #[test]
    fn quit_input_returns_quit_command() {
        let mut window = SoftwareWindow::new(240, 176);
        let mut screen = screen(&mut window, (4, 4));
        let input = InputSnapshot::empty().with_quit_requested(true);
        assert_eq!(screen.update(STEP, &input, Instant::now()), ScreenCommand::Quit);
    }

    #[test]
    fn held_key_walks_one_tile() {
        let mut window = SoftwareWindow::new(240, 176);
        let mut screen = screen(&mut window, (4, 4));
        let input = InputSnapshot::empty().with_action_down(InputAction::MoveRight, true);
        run_until_idle(&mut screen, &input, Instant::now());

        assert_eq!(screen.world.player().tile_x(), 5);
        assert_eq!(screen.world.player().tile_y(), 4);
    }

    #[test]
    fn walking_off_the_top_edge_enters_the_northern_map() {
        let mut window = SoftwareWindow::new(240, 176);
        let mut screen = screen(&mut window, (3, 0));
        let route = screen.registry.map_id("route").expect("route");
        let input = InputSnapshot::empty().with_action_down(InputAction::MoveUp, true);
        run_until_idle(&mut screen, &input, Instant::now());

        assert_eq!(screen.world.current_map(), route);
        assert_eq!(screen.world.player().tile_y(), 5);
        assert_eq!(screen.world.player().tile_x(), 3);
    }

    #[test]
    fn debug_toggle_controls_title() {
        let mut window = SoftwareWindow::new(240, 176);
        let mut screen = screen(&mut window, (2, 3));
        assert_eq!(screen.debug_title(), None);

        let toggle = InputSnapshot::empty().with_debug_toggle_pressed(true);
        screen.update(STEP, &toggle, Instant::now());
        let title = screen.debug_title().expect("title");
        assert!(title.contains("map town"));
        assert!(title.contains("tile (2, 3)"));

        screen.update(STEP, &toggle, Instant::now());
        assert_eq!(screen.debug_title(), None);
    }

    #[test]
    fn render_and_stop_run_headless() {
        let mut window = SoftwareWindow::new(240, 176);
        let mut screen = screen(&mut window, (4, 4));
        screen.start(&mut window);
        screen.update_in_background(BackgroundTick {
            sequence: 1,
            elapsed: Duration::from_millis(100),
        });
        screen.render(&mut window);
        assert!(screen
            .registry
            .map(screen.world.current_map())
            .expect("map")
            .is_generated());
        screen.stop(&mut window);
    }
}
