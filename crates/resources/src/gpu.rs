//! GPU upload seam.
//!
//! The resources service never talks to a graphics API directly: every
//! upload, compilation and destruction goes through [`GpuBackend`]. A real
//! renderer implements it on top of its context; [`HeadlessGpu`] is the
//! bundled implementation used by the CLI and the tests.

use std::collections::HashSet;

use asset::{mesh::MeshData, texture::TextureData};
use corelib::{AssetError, AssetResult};

/// The six decoded faces of one cubemap level (+X, -X, +Y, -Y, +Z, -Z).
pub type CubemapFaces = [TextureData; 6];

/// Buffers backing an uploaded mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshBuffers {
    pub vertex_array: u32,
    pub element_buffer: u32,
    pub index_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Shader stage of a program source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn extension(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vert",
            ShaderStage::Fragment => "frag",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

/// Upload and destruction primitives the caches rely on.
/// `name` is the logical asset name, for diagnostics only.
pub trait GpuBackend {
    fn upload_mesh(&mut self, name: &str, mesh: &MeshData) -> AssetResult<MeshBuffers>;

    /// Upload a 2D texture; `levels[0]` is the base level.
    fn upload_texture(
        &mut self,
        name: &str,
        levels: &[TextureData],
        srgb: bool,
    ) -> AssetResult<TextureId>;

    /// Upload a cubemap; `levels[0]` holds the base level faces.
    fn upload_cubemap(
        &mut self,
        name: &str,
        levels: &[CubemapFaces],
        srgb: bool,
    ) -> AssetResult<TextureId>;

    fn compile_program(&mut self, name: &str, vertex: &str, fragment: &str)
    -> AssetResult<ProgramId>;

    fn destroy_mesh(&mut self, buffers: MeshBuffers);
    fn destroy_texture(&mut self, texture: TextureId);
    fn destroy_program(&mut self, program: ProgramId);
}

/// Backend without a device. Validates what it is given, hands out fresh ids
/// and tracks which objects are alive.
#[derive(Debug, Default)]
pub struct HeadlessGpu {
    next_id: u32,
    meshes: HashSet<u32>,
    textures: HashSet<u32>,
    programs: HashSet<u32>,
    uploads: usize,
}

impl HeadlessGpu {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.uploads += 1;
        self.next_id
    }

    /// Number of successful uploads and compilations since creation.
    pub fn upload_count(&self) -> usize {
        self.uploads
    }

    pub fn live_meshes(&self) -> usize {
        self.meshes.len()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    pub fn live_objects(&self) -> usize {
        self.live_meshes() + self.live_textures() + self.live_programs()
    }

    pub fn is_texture_alive(&self, texture: TextureId) -> bool {
        self.textures.contains(&texture.0)
    }

    pub fn is_program_alive(&self, program: ProgramId) -> bool {
        self.programs.contains(&program.0)
    }
}

fn check_levels<'a>(
    name: &str,
    levels: impl IntoIterator<Item = &'a TextureData>,
) -> AssetResult<()> {
    let mut any = false;
    for level in levels {
        any = true;
        if !level.is_valid() {
            return Err(AssetError::gpu(
                name,
                format!("invalid {}x{} level data", level.width, level.height),
            ));
        }
    }
    if !any {
        return Err(AssetError::gpu(name, "no texture levels"));
    }
    Ok(())
}

impl GpuBackend for HeadlessGpu {
    fn upload_mesh(&mut self, name: &str, mesh: &MeshData) -> AssetResult<MeshBuffers> {
        if !mesh.is_valid() {
            return Err(AssetError::gpu(name, "empty geometry"));
        }
        let index_count = u32::try_from(mesh.indices.len())
            .map_err(|_| AssetError::gpu(name, "too many indices"))?;
        let vertex_array = self.allocate();
        self.meshes.insert(vertex_array);
        Ok(MeshBuffers {
            vertex_array,
            element_buffer: vertex_array,
            index_count,
        })
    }

    fn upload_texture(
        &mut self,
        name: &str,
        levels: &[TextureData],
        _srgb: bool,
    ) -> AssetResult<TextureId> {
        check_levels(name, levels)?;
        let id = self.allocate();
        self.textures.insert(id);
        Ok(TextureId(id))
    }

    fn upload_cubemap(
        &mut self,
        name: &str,
        levels: &[CubemapFaces],
        _srgb: bool,
    ) -> AssetResult<TextureId> {
        check_levels(name, levels.iter().flatten())?;
        for faces in levels {
            let size = (faces[0].width, faces[0].height);
            if size.0 != size.1 || faces.iter().any(|f| (f.width, f.height) != size) {
                return Err(AssetError::gpu(name, "cubemap faces must be square and same-sized"));
            }
        }
        let id = self.allocate();
        self.textures.insert(id);
        Ok(TextureId(id))
    }

    fn compile_program(
        &mut self,
        name: &str,
        vertex: &str,
        fragment: &str,
    ) -> AssetResult<ProgramId> {
        for (stage, source) in [(ShaderStage::Vertex, vertex), (ShaderStage::Fragment, fragment)] {
            if source.trim().is_empty() {
                return Err(AssetError::gpu(
                    name,
                    format!("empty {} shader source", stage.label()),
                ));
            }
        }
        let id = self.allocate();
        self.programs.insert(id);
        Ok(ProgramId(id))
    }

    fn destroy_mesh(&mut self, buffers: MeshBuffers) {
        if !self.meshes.remove(&buffers.vertex_array) {
            log::warn!("Destroying unknown mesh {:?}", buffers);
        }
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        if !self.textures.remove(&texture.0) {
            log::warn!("Destroying unknown texture {:?}", texture);
        }
    }

    fn destroy_program(&mut self, program: ProgramId) {
        if !self.programs.remove(&program.0) {
            log::warn!("Destroying unknown program {:?}", program);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_fresh_and_tracked() {
        let mut gpu = HeadlessGpu::new();
        let tex = TextureData::checkerboard(4);
        let a = gpu.upload_texture("a", std::slice::from_ref(&tex), true).unwrap();
        let b = gpu.upload_texture("b", std::slice::from_ref(&tex), false).unwrap();
        assert_ne!(a, b);
        assert_eq!(gpu.live_textures(), 2);

        gpu.destroy_texture(a);
        assert!(!gpu.is_texture_alive(a));
        assert!(gpu.is_texture_alive(b));
        assert_eq!(gpu.upload_count(), 2);
    }

    #[test]
    fn rejects_empty_inputs() {
        let mut gpu = HeadlessGpu::new();
        assert!(gpu.upload_mesh("m", &MeshData::default()).is_err());
        assert!(gpu.upload_texture("t", &[], false).is_err());
        assert!(gpu.compile_program("p", "void main() {}", "  ").is_err());
        assert_eq!(gpu.live_objects(), 0);
    }

    #[test]
    fn cubemap_faces_must_match() {
        let mut gpu = HeadlessGpu::new();
        let face = TextureData::checkerboard(8);
        let mut faces: CubemapFaces = std::array::from_fn(|_| face.clone());
        assert!(gpu.upload_cubemap("sky", std::slice::from_ref(&faces), true).is_ok());

        faces[3] = TextureData::checkerboard(4);
        assert!(gpu.upload_cubemap("sky", &[faces], true).is_err());
    }
}
