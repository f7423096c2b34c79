use std::str::FromStr;
use std::time::Instant;

use overworld_engine::{
    resolve_app_paths, AppError, ImageStore, LoopConfig, MapRegistry, Screen, World, WorldConfig,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::overworld::OverworldScreen;
use super::preview::MapPreviewScreen;

const START_MAP_ENV_VAR: &str = "OVERWORLD_START_MAP";
const PREVIEW_MAP_ENV_VAR: &str = "OVERWORLD_PREVIEW_MAP";
const RENDER_FPS_ENV_VAR: &str = "OVERWORLD_RENDER_FPS";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) screen: Box<dyn Screen>,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Overworld Startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), "asset_root_resolved");

    let registry = MapRegistry::load_dir(&paths.asset_dir)?;
    info!(maps = registry.maps().len(), "maps_loaded");

    let mut world_config = WorldConfig::default();
    if let Some(start_map) = env_string(START_MAP_ENV_VAR) {
        if registry.map_id(&start_map).is_some() {
            world_config.start_map = start_map;
        } else {
            warn!(
                var = START_MAP_ENV_VAR,
                value = %start_map,
                fallback = %world_config.start_map,
                "env_override_ignored"
            );
        }
    }

    let mut images = ImageStore::new(&paths.image_dir);
    for (key, size_hint) in registry.image_keys() {
        images.register(&key, size_hint);
    }
    let (frame_w, frame_h) = world_config.player_frame_size;
    images.register(&world_config.player_sheet, Some((frame_w * 2, frame_h * 4)));

    let mut config = LoopConfig::default();
    if let Some(fps) = env_parsed::<u32>(RENDER_FPS_ENV_VAR) {
        config.max_render_fps = Some(fps);
    }

    let screen: Box<dyn Screen> = match env_string(PREVIEW_MAP_ENV_VAR) {
        Some(key) => match registry.map_id(&key) {
            Some(map) => {
                info!(map = %key, "preview_mode");
                config.window_title = format!("Overworld - {key}");
                Box::new(MapPreviewScreen::new(
                    registry,
                    images,
                    map,
                    world_config.player_sheet.clone(),
                    world_config.player_frame_size,
                    (world_config.view_tiles_wide, world_config.view_tiles_high),
                ))
            }
            None => {
                warn!(var = PREVIEW_MAP_ENV_VAR, value = %key, "env_override_ignored");
                overworld(world_config, registry, images)?
            }
        },
        None => overworld(world_config, registry, images)?,
    };

    Ok(AppWiring { config, screen })
}

fn overworld(
    config: WorldConfig,
    registry: MapRegistry,
    images: ImageStore,
) -> Result<Box<dyn Screen>, AppError> {
    let world = World::new(config, &registry, Instant::now())?;
    Ok(Box::new(OverworldScreen::new(registry, images, world)))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn env_string(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parsed<T: FromStr>(var: &'static str) -> Option<T> {
    let raw = env_string(var)?;
    let parsed = parse_override(&raw);
    if parsed.is_none() {
        warn!(var, value = %raw, "env_override_ignored");
    }
    parsed
}

fn parse_override<T: FromStr>(raw: &str) -> Option<T> {
    raw.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_override_accepts_numbers_and_rejects_garbage() {
        assert_eq!(parse_override::<u32>("30"), Some(30));
        assert_eq!(parse_override::<u32>(" 144 "), Some(144));
        assert_eq!(parse_override::<u32>("fast"), None);
        assert_eq!(parse_override::<u32>("-1"), None);
    }
}
