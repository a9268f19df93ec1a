use std::{
    env,
    path::{Path, PathBuf},
};

const ROOT_DIR_NAME: &str = ".tower-launcher";
const GAME_DIR_NAME: &str = "game";

pub fn default_root_dir() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(ROOT_DIR_NAME))
}

pub fn resolve_log_dir(root_dir: Option<&Path>) -> PathBuf {
    match root_dir {
        Some(root) => root.join("logs"),
        None => env::temp_dir().join(ROOT_DIR_NAME).join("logs"),
    }
}

/// Where the game is installed. An explicit override wins; packaged builds
/// ship the game next to their resources, dev builds keep it beside the
/// workspace.
pub fn resolve_game_dir(
    override_dir: Option<&Path>,
    resource_dir: Option<&Path>,
    packaged: bool,
    dev_root: &Path,
) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }

    if packaged {
        if let Some(resource_dir) = resource_dir {
            return resource_dir.join(GAME_DIR_NAME);
        }
        tracing::warn!("resource directory is unavailable; falling back to dev game directory");
    }

    dev_root.join(GAME_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_game_dir_prefers_override() {
        let resolved = resolve_game_dir(
            Some(Path::new("/opt/td")),
            Some(Path::new("/app/resources")),
            true,
            Path::new("/src"),
        );
        assert_eq!(resolved, PathBuf::from("/opt/td"));
    }

    #[test]
    fn resolve_game_dir_uses_resources_when_packaged() {
        let resolved =
            resolve_game_dir(None, Some(Path::new("/app/resources")), true, Path::new("/src"));
        assert_eq!(resolved, PathBuf::from("/app/resources/game"));
    }

    #[test]
    fn resolve_game_dir_uses_dev_root_otherwise() {
        let resolved =
            resolve_game_dir(None, Some(Path::new("/app/resources")), false, Path::new("/src"));
        assert_eq!(resolved, PathBuf::from("/src/game"));

        let resolved = resolve_game_dir(None, None, true, Path::new("/src"));
        assert_eq!(resolved, PathBuf::from("/src/game"));
    }

    #[test]
    fn resolve_log_dir_nests_under_root() {
        assert_eq!(
            resolve_log_dir(Some(Path::new("/home/u/.tower-launcher"))),
            PathBuf::from("/home/u/.tower-launcher/logs")
        );
    }
}
