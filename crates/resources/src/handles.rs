//! Cached asset types handed out to rendering code.

use std::cell::Cell;

use asset::texture::{TextureData, TextureFormat};
use corelib::{BoundingBox, Vec3};

use crate::{
    cache::Asset,
    gpu::{GpuBackend, MeshBuffers, ProgramId, TextureId},
};

/// Uploaded geometry with its object-space bounds.
#[derive(Debug)]
pub struct Mesh {
    pub buffers: MeshBuffers,
    pub bbox: BoundingBox,
    pub centroid: Vec3,
}

impl Asset for Mesh {
    const KIND: &'static str = "mesh";

    fn release<G: GpuBackend + ?Sized>(&self, gpu: &mut G) {
        gpu.destroy_mesh(self.buffers);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureShape {
    Tex2D,
    Cubemap,
}

/// Format metadata of an uploaded texture (base level).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub format: TextureFormat,
    pub levels: u32,
    pub shape: TextureShape,
    pub srgb: bool,
}

impl TextureInfo {
    pub(crate) fn describe(base: &TextureData, levels: usize, shape: TextureShape, srgb: bool) -> Self {
        Self {
            width: base.width,
            height: base.height,
            channels: base.channels,
            format: base.format,
            levels: levels as u32,
            shape,
            srgb,
        }
    }
}

#[derive(Debug)]
pub struct Texture {
    pub id: TextureId,
    pub info: TextureInfo,
}

impl Asset for Texture {
    const KIND: &'static str = "texture";

    fn release<G: GpuBackend + ?Sized>(&self, gpu: &mut G) {
        gpu.destroy_texture(self.id);
    }
}

/// Where a program stage's source text comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShaderSource {
    /// Logical shader name, resolved to `name.vert` / `name.frag`.
    Named(String),
    /// Source text registered directly.
    Inline(String),
}

/// Compiled shader program. The id lives in a `Cell` so that a reload can
/// swap it while every `Rc<Program>` held by callers stays valid.
#[derive(Debug)]
pub struct Program {
    id: Cell<ProgramId>,
    vertex: ShaderSource,
    fragment: ShaderSource,
}

impl Program {
    pub(crate) fn new(id: ProgramId, vertex: ShaderSource, fragment: ShaderSource) -> Self {
        Self {
            id: Cell::new(id),
            vertex,
            fragment,
        }
    }

    /// Current program id. May change across `Resources::reload`.
    pub fn id(&self) -> ProgramId {
        self.id.get()
    }

    pub fn vertex_source(&self) -> &ShaderSource {
        &self.vertex
    }

    pub fn fragment_source(&self) -> &ShaderSource {
        &self.fragment
    }

    /// Install a freshly compiled id and return the one it replaces.
    pub(crate) fn swap_id(&self, id: ProgramId) -> ProgramId {
        self.id.replace(id)
    }
}

impl Asset for Program {
    const KIND: &'static str = "program";

    fn release<G: GpuBackend + ?Sized>(&self, gpu: &mut G) {
        gpu.destroy_program(self.id());
    }
}
