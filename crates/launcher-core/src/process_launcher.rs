use std::{
    io,
    path::PathBuf,
    process::{Command, Stdio},
};

use crate::{
    error::LaunchError,
    launch_target::{LaunchTarget, Platform},
};

pub trait ProcessSpawner: Send + Sync + 'static {
    /// Starts `target` without keeping a handle to it.
    fn spawn_detached(&self, target: &LaunchTarget) -> io::Result<()>;
}

/// Spawns with no stdio and no arguments, outside the launcher's process
/// group, so the child outlives the launcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedSpawner;

impl ProcessSpawner for DetachedSpawner {
    fn spawn_detached(&self, target: &LaunchTarget) -> io::Result<()> {
        let mut command = Command::new(&target.path);
        command
            .current_dir(&target.working_directory)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        #[cfg(target_os = "windows")]
        {
            use std::os::windows::process::CommandExt;
            // DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP
            command.creation_flags(0x00000008 | 0x00000200);
        }

        // Dropping the handle neither waits for nor kills the child.
        command.spawn().map(drop)
    }
}

pub struct GameLauncher<P: ProcessSpawner = DetachedSpawner> {
    platform: Platform,
    base_dir: PathBuf,
    spawner: P,
}

impl<P: ProcessSpawner> GameLauncher<P> {
    pub fn new(platform: Platform, base_dir: PathBuf, spawner: P) -> Self {
        Self {
            platform,
            base_dir,
            spawner,
        }
    }

    pub fn target(&self) -> LaunchTarget {
        LaunchTarget::resolve(self.platform, &self.base_dir)
    }

    /// Checks the executable exists right now, then spawns it detached.
    pub fn launch(&self) -> Result<LaunchTarget, LaunchError> {
        let target = self.target();
        tracing::info!("launching game: {}", target.path.display());

        if !target.path.is_file() {
            tracing::error!("game executable not found: {}", target.path.display());
            return Err(LaunchError::ExecutableNotFound { path: target.path });
        }

        self.spawner
            .spawn_detached(&target)
            .map_err(|source| LaunchError::SpawnFailed {
                path: target.path.clone(),
                source,
            })?;
        Ok(target)
    }
}
