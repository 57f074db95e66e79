//! Resource management: name index, path resolution and GPU asset caches.
//!
//! A [`Resources`] service scans its root once at construction, then loads
//! meshes, textures, cubemaps and shader programs on demand by logical name.
//! Every loaded asset is cached until [`Resources::reset`]; failures are
//! logged under the `resources` target and surface as `None` or a fallback.
//!
//! The service is meant to be owned by the render thread: handles are `Rc`,
//! so neither the service nor its handles can cross threads.

pub mod cache;
pub mod config;
pub mod gpu;
pub mod handles;
mod loader;
pub mod name_index;
pub mod resolver;
pub mod service;
pub mod source;

pub use cache::{Asset, AssetCache};
pub use config::{DEFAULT_TEXTURE, ResourcesConfig};
pub use gpu::{
    CubemapFaces, GpuBackend, HeadlessGpu, MeshBuffers, ProgramId, ShaderStage, TextureId,
};
pub use handles::{Mesh, Program, ShaderSource, Texture, TextureInfo, TextureShape};
pub use name_index::NameIndex;
pub use resolver::PathResolver;
pub use service::Resources;
pub use source::{ResourceRoot, read_external_file, read_external_string};

/// Log target of every diagnostic emitted by this crate.
pub(crate) const LOG_TARGET: &str = "resources";
