//! Asset codecs (meshes, textures).
//! OBJ geometry is parsed into CPU-side `MeshData`, images are decoded to RGBA8
//! `TextureData`. Neither touches the GPU; uploads happen in the resources crate.

pub mod mesh;
pub mod obj;
pub mod texture;
