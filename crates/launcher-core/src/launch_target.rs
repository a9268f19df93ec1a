use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Other
        }
    }
}

/// Path segments of the game executable below the installation directory.
pub fn executable_segments(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Windows => &["TowerDefense.exe"],
        Platform::MacOs => &["TowerDefense.app", "Contents", "MacOS", "TowerDefense"],
        Platform::Other => &["TowerDefense.x86_64"],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchTarget {
    pub path: PathBuf,
    pub working_directory: PathBuf,
}

impl LaunchTarget {
    pub fn resolve(platform: Platform, base_dir: &Path) -> Self {
        let path = executable_segments(platform)
            .iter()
            .fold(base_dir.to_path_buf(), |path, segment| path.join(segment));
        Self {
            path,
            working_directory: base_dir.to_path_buf(),
        }
    }
}
