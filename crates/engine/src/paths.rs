use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const ROOT_ENV_VAR: &str = "OVERWORLD_ROOT";

/// Where the game finds its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub root: PathBuf,
    /// Holds `maps/` and `tilesets/`.
    pub asset_dir: PathBuf,
    pub image_dir: PathBuf,
}

impl AppPaths {
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let asset_dir = root.join("assets");
        let image_dir = asset_dir.join("images");
        Self {
            root,
            asset_dir,
            image_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("OVERWORLD_ROOT is not valid unicode")]
    RootVarNotUnicode,
    #[error("failed to locate the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("OVERWORLD_ROOT={} has no Cargo.toml and assets/ directory", .0.display())]
    InvalidEnvRoot(PathBuf),
    #[error(
        "no directory above {} has Cargo.toml and assets/; set OVERWORLD_ROOT to the game directory",
        .0.display()
    )]
    RootNotFound(PathBuf),
}

/// Resolves the game directory from `OVERWORLD_ROOT`, falling back to the
/// nearest ancestor of the executable that looks like one.
pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let from_env = match env::var(ROOT_ENV_VAR) {
        Ok(value) => Some(PathBuf::from(value)),
        Err(env::VarError::NotPresent) => None,
        Err(env::VarError::NotUnicode(_)) => return Err(StartupError::RootVarNotUnicode),
    };
    let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
    let start = exe.parent().unwrap_or(Path::new("."));
    locate_root(from_env.as_deref(), start).map(AppPaths::for_root)
}

fn locate_root(from_env: Option<&Path>, start: &Path) -> Result<PathBuf, StartupError> {
    if let Some(path) = from_env {
        let path = canonical(path);
        return if is_game_dir(&path) {
            Ok(path)
        } else {
            Err(StartupError::InvalidEnvRoot(path))
        };
    }
    start
        .ancestors()
        .find(|dir| is_game_dir(dir))
        .map(canonical)
        .ok_or_else(|| StartupError::RootNotFound(canonical(start)))
}

fn is_game_dir(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join("assets").is_dir()
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn game_dir() -> TempDir {
        let temp = TempDir::new().expect("temp dir");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("write");
        fs::create_dir_all(temp.path().join("assets/maps")).expect("mkdir");
        temp
    }

    #[test]
    fn game_dir_needs_cargo_toml_and_assets() {
        let temp = TempDir::new().expect("temp dir");
        assert!(!is_game_dir(temp.path()));
        fs::create_dir(temp.path().join("assets")).expect("mkdir");
        assert!(!is_game_dir(temp.path()));
        fs::write(temp.path().join("Cargo.toml"), "").expect("write");
        assert!(is_game_dir(temp.path()));
    }

    #[test]
    fn walks_up_from_the_executable() {
        let game = game_dir();
        let bin = game.path().join("target/debug");
        fs::create_dir_all(&bin).expect("mkdir");

        let root = locate_root(None, &bin).expect("root");
        assert_eq!(root, canonical(game.path()));
    }

    #[test]
    fn env_root_wins_and_must_be_valid() {
        let game = game_dir();
        let elsewhere = TempDir::new().expect("temp dir");

        let root = locate_root(Some(game.path()), elsewhere.path()).expect("root");
        assert_eq!(root, canonical(game.path()));

        let err = locate_root(Some(elsewhere.path()), game.path()).expect_err("invalid");
        assert!(matches!(err, StartupError::InvalidEnvRoot(_)));
    }

    #[test]
    fn asset_dirs_hang_off_root() {
        let paths = AppPaths::for_root("/game");
        assert_eq!(paths.asset_dir, PathBuf::from("/game/assets"));
        assert_eq!(paths.image_dir, PathBuf::from("/game/assets/images"));
    }
}
