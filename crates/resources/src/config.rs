//! Resource service configuration.

use std::path::PathBuf;

/// Logical name of the texture returned when a texture lookup fails.
pub const DEFAULT_TEXTURE: &str = "DEBUG_DEFAULT";

#[derive(Clone, Debug)]
pub struct ResourcesConfig {
    /// Resource root. With the `packaged` feature the archive `<root>.zip` is
    /// read instead of the directory.
    pub root: PathBuf,
    /// Fallback texture name for failed texture lookups.
    pub default_texture: String,
    /// Edge size of the generated checkerboard used when the default texture
    /// itself is not on disk.
    pub placeholder_size: u32,
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("../../resources"),
            default_texture: DEFAULT_TEXTURE.to_string(),
            placeholder_size: 64,
        }
    }
}

impl ResourcesConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Path actually opened for the configured build mode.
    pub fn effective_root(&self) -> PathBuf {
        if cfg!(feature = "packaged") {
            let mut archive = self.root.clone().into_os_string();
            archive.push(".zip");
            PathBuf::from(archive)
        } else {
            self.root.clone()
        }
    }
}
