//! Virtual file system: an ordered list of mounted directories for reading
//! and a single write directory for saving.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::engine::context::EngineContext;
use crate::engine::error::EngineError;
use crate::engine::module::{parse_section, to_section, Module};

#[derive(Debug, Error)]
pub enum FsError {
    #[error("path '{0}' does not exist")]
    NotFound(PathBuf),
    #[error("'{0}' is not a directory; archives cannot be mounted")]
    NotADirectory(PathBuf),
    #[error("'{0}' escapes the write directory")]
    OutsideWriteDir(String),
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> FsError + '_ {
    move |source| FsError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mount {
    pub path: PathBuf,
    /// Virtual prefix the directory is visible under. Empty mounts at the root.
    #[serde(default)]
    pub mount_point: String,
}

#[derive(Debug, Clone)]
pub struct FileSystem {
    mounts: Vec<Mount>,
    write_dir: PathBuf,
}

impl Default for FileSystem {
    fn default() -> Self {
        Self {
            mounts: Vec::new(),
            write_dir: PathBuf::from("."),
        }
    }
}

impl FileSystem {
    pub fn new(write_dir: impl Into<PathBuf>) -> Self {
        Self {
            mounts: Vec::new(),
            write_dir: write_dir.into(),
        }
    }

    /// Mounts a directory. Later lookups search mounts in the order added.
    pub fn add_path(&mut self, path: impl Into<PathBuf>, mount_point: Option<&str>) -> Result<(), FsError> {
        let path = path.into();
        if !path.exists() {
            return Err(FsError::NotFound(path));
        }
        if !path.is_dir() {
            return Err(FsError::NotADirectory(path));
        }
        let mount_point = mount_point.map(normalize).unwrap_or_default();
        if self.mounts.iter().any(|m| m.path == path && m.mount_point == mount_point) {
            return Ok(());
        }
        info!("Mounted '{}' at '/{}'", path.display(), mount_point);
        self.mounts.push(Mount { path, mount_point });
        Ok(())
    }

    pub fn remove_path(&mut self, path: &Path) -> bool {
        let before = self.mounts.len();
        self.mounts.retain(|m| m.path != path);
        before != self.mounts.len()
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }

    /// Maps a virtual path to a real one. Absolute paths that exist are
    /// returned as they are; the write directory is searched last.
    pub fn resolve(&self, file: impl AsRef<Path>) -> Option<PathBuf> {
        let file = file.as_ref();
        if file.is_absolute() {
            return file.exists().then(|| file.to_path_buf());
        }

        let virtual_path = normalize(&file.to_string_lossy());
        if !stays_inside(&virtual_path) {
            return None;
        }
        for mount in &self.mounts {
            let relative = if mount.mount_point.is_empty() {
                Some(virtual_path.as_str())
            } else if virtual_path == mount.mount_point {
                Some("")
            } else {
                virtual_path
                    .strip_prefix(mount.mount_point.as_str())
                    .and_then(|rest| rest.strip_prefix('/'))
            };
            if let Some(relative) = relative {
                let candidate = mount.path.join(relative);
                if candidate.exists() {
                    return Some(candidate);
                }
            }
        }

        let candidate = self.write_dir.join(&virtual_path);
        candidate.exists().then_some(candidate)
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Vec<u8>, FsError> {
        let file = file.as_ref();
        let path = self
            .resolve(file)
            .ok_or_else(|| FsError::NotFound(file.to_path_buf()))?;
        fs::read(&path).map_err(io_error(&path))
    }

    /// Writes `data` under the write directory and returns the bytes written.
    pub fn save(&self, file: &str, data: &[u8]) -> Result<usize, FsError> {
        let relative = normalize(file);
        if relative.is_empty() || !stays_inside(&relative) {
            return Err(FsError::OutsideWriteDir(file.to_string()));
        }

        let path = self.write_dir.join(&relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        fs::write(&path, data).map_err(io_error(&path))?;
        Ok(data.len())
    }

    pub fn exists(&self, file: impl AsRef<Path>) -> bool {
        self.resolve(file).is_some()
    }

    pub fn is_directory(&self, file: impl AsRef<Path>) -> bool {
        self.resolve(file).is_some_and(|path| path.is_dir())
    }

    pub fn save_directory(&self) -> &Path {
        &self.write_dir
    }

    pub fn set_write_dir(&mut self, dir: impl Into<PathBuf>) -> Result<(), FsError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        self.write_dir = dir;
        Ok(())
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_string()
}

/// True when a normalized relative path has no `..` or root components.
fn stays_inside(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSystemConfig {
    pub write_dir: PathBuf,
    pub mounts: Vec<Mount>,
}

impl Default for FileSystemConfig {
    fn default() -> Self {
        Self {
            write_dir: PathBuf::from("Library"),
            mounts: vec![
                Mount {
                    path: PathBuf::from("."),
                    mount_point: String::new(),
                },
                Mount {
                    path: PathBuf::from("Assets"),
                    mount_point: "Assets".to_string(),
                },
            ],
        }
    }
}

#[derive(Default)]
pub struct ModuleFileSystem {
    config: FileSystemConfig,
}

impl ModuleFileSystem {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Module for ModuleFileSystem {
    fn name(&self) -> &str {
        "file_system"
    }

    fn init(&mut self, ctx: &mut EngineContext) -> Result<(), EngineError> {
        let mut fs = FileSystem::new(&self.config.write_dir);
        fs.set_write_dir(&self.config.write_dir)?;
        for mount in &self.config.mounts {
            let mount_point = (!mount.mount_point.is_empty()).then_some(mount.mount_point.as_str());
            if let Err(e) = fs.add_path(&mount.path, mount_point) {
                warn!("Skipping mount: {}", e);
            }
        }
        ctx.fs = fs;
        Ok(())
    }

    fn load_config(&mut self, _ctx: &mut EngineContext, section: &Value) -> Result<(), EngineError> {
        self.config = parse_section(self.name(), section)?;
        Ok(())
    }

    fn save_config(&self, ctx: &EngineContext) -> Result<Option<Value>, EngineError> {
        let mut mounts = ctx.fs.mounts().to_vec();
        // Keep configured mounts that were missing this run.
        for mount in &self.config.mounts {
            if !mounts.iter().any(|m| m.path == mount.path) {
                mounts.push(mount.clone());
            }
        }
        to_section(&FileSystemConfig {
            write_dir: ctx.fs.save_directory().to_path_buf(),
            mounts,
        })
    }
}
