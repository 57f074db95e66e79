//! Cache-miss path: resolve, read, decode, upload.

use std::path::Path;

use asset::{mesh::MeshData, obj, texture::TextureData};
use corelib::{AssetError, AssetResult};

use crate::{
    gpu::{CubemapFaces, GpuBackend, ShaderStage},
    handles::{Mesh, Program, ShaderSource, Texture, TextureInfo, TextureShape},
    name_index::NameIndex,
    resolver::{CubemapPaths, PathResolver},
    source::ResourceRoot,
};

/// Read-only half of a load: resolution and decoding, no GPU access.
#[derive(Clone, Copy)]
pub(crate) struct Reader<'a> {
    root: &'a ResourceRoot,
    resolver: PathResolver<'a>,
}

/// Borrowed view of everything a load needs, built from disjoint fields of
/// the service so the caches stay mutably borrowable alongside it.
pub(crate) struct Loader<'a, G: ?Sized> {
    reader: Reader<'a>,
    gpu: &'a mut G,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(root: &'a ResourceRoot, index: &'a NameIndex) -> Self {
        Self {
            root,
            resolver: PathResolver::new(index),
        }
    }

    /// Raw bytes of an indexed file, by exact bare file name.
    pub(crate) fn raw(&self, file_name: &str) -> AssetResult<Vec<u8>> {
        let path = self
            .resolver
            .resolve_file(file_name)
            .ok_or_else(|| AssetError::NotFound(file_name.to_string()))?;
        self.root.read(path)
    }

    /// Text asset: exact name, then `name.txt`.
    pub(crate) fn text(&self, name: &str) -> AssetResult<String> {
        let path = self
            .resolver
            .resolve_text(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;
        let bytes = self.root.read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub(crate) fn shader(&self, name: &str, stage: ShaderStage) -> AssetResult<String> {
        let source = self.text(&format!("{}.{}", name, stage.extension()))?;
        if source.trim().is_empty() {
            return Err(AssetError::decode(
                name,
                format!("empty {} shader", stage.label()),
            ));
        }
        Ok(source)
    }

    pub(crate) fn source_text(
        &self,
        source: &ShaderSource,
        stage: ShaderStage,
    ) -> AssetResult<String> {
        match source {
            ShaderSource::Named(name) => self.shader(name, stage),
            ShaderSource::Inline(text) => Ok(text.clone()),
        }
    }

    pub(crate) fn decode_image(&self, path: &Path) -> AssetResult<TextureData> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = self.root.read(path)?;
        TextureData::decode(&bytes, &file_name)
            .map_err(|e| AssetError::decode(file_name, format!("{:#}", e)))
    }

    pub(crate) fn decode_faces(
        &self,
        name: &str,
        paths: &CubemapPaths,
    ) -> AssetResult<CubemapFaces> {
        let faces = paths
            .iter()
            .map(|p| self.decode_image(p))
            .collect::<AssetResult<Vec<_>>>()?;
        let faces: CubemapFaces = faces
            .try_into()
            .map_err(|_| AssetError::decode(name, "cubemap needs six faces"))?;
        Ok(faces)
    }
}

impl<'a, G: GpuBackend + ?Sized> Loader<'a, G> {
    pub(crate) fn new(root: &'a ResourceRoot, index: &'a NameIndex, gpu: &'a mut G) -> Self {
        Self {
            reader: Reader::new(root, index),
            gpu,
        }
    }

    pub(crate) fn mesh(&mut self, name: &str) -> AssetResult<Mesh> {
        let text = self
            .reader
            .text(&format!("{}.obj", name))
            .map_err(|err| match err {
                AssetError::NotFound(_) => AssetError::NotFound(name.to_string()),
                other => other,
            })?;
        let mut data = obj::load_obj_from_str(&text)
            .map_err(|e| AssetError::decode(name, format!("{:#}", e)))?;
        if !data.compute_tangents() {
            log::debug!("No tangent frames computed for mesh {}", name);
        }
        self.upload_mesh(name, &data)
    }

    pub(crate) fn upload_mesh(&mut self, name: &str, data: &MeshData) -> AssetResult<Mesh> {
        let buffers = self.gpu.upload_mesh(name, data)?;
        Ok(Mesh {
            buffers,
            bbox: data.bounding_box(),
            centroid: data.centroid(),
        })
    }

    /// Single image first, then a `_0`, `_1`, ... mipmap chain.
    pub(crate) fn texture(&mut self, name: &str, srgb: bool) -> AssetResult<Texture> {
        let paths = match self.reader.resolver.resolve_image(name) {
            Some(path) => vec![path.to_path_buf()],
            None => self.reader.resolver.resolve_mipmap_chain(name),
        };
        if paths.is_empty() {
            return Err(AssetError::NotFound(name.to_string()));
        }
        let levels = paths
            .iter()
            .map(|p| self.reader.decode_image(p))
            .collect::<AssetResult<Vec<_>>>()?;
        self.upload_texture(name, &levels, srgb)
    }

    pub(crate) fn upload_texture(
        &mut self,
        name: &str,
        levels: &[TextureData],
        srgb: bool,
    ) -> AssetResult<Texture> {
        let base = levels
            .first()
            .ok_or_else(|| AssetError::decode(name, "no texture levels"))?;
        let id = self.gpu.upload_texture(name, levels, srgb)?;
        Ok(Texture {
            id,
            info: TextureInfo::describe(base, levels.len(), TextureShape::Tex2D, srgb),
        })
    }

    /// Six faces first, then a chain of complete `_0`, `_1`, ... cubemaps.
    pub(crate) fn cubemap(&mut self, name: &str, srgb: bool) -> AssetResult<Texture> {
        let chain = match self.reader.resolver.resolve_cubemap(name) {
            Some(faces) => vec![faces],
            None => self.reader.resolver.resolve_cubemap_chain(name),
        };
        if chain.is_empty() {
            return Err(AssetError::NotFound(name.to_string()));
        }
        let levels = chain
            .iter()
            .map(|faces| self.reader.decode_faces(name, faces))
            .collect::<AssetResult<Vec<_>>>()?;
        self.upload_cubemap(name, &levels, srgb)
    }

    pub(crate) fn upload_cubemap(
        &mut self,
        name: &str,
        levels: &[CubemapFaces],
        srgb: bool,
    ) -> AssetResult<Texture> {
        let base = levels
            .first()
            .ok_or_else(|| AssetError::decode(name, "no cubemap levels"))?;
        let id = self.gpu.upload_cubemap(name, levels, srgb)?;
        Ok(Texture {
            id,
            info: TextureInfo::describe(&base[0], levels.len(), TextureShape::Cubemap, srgb),
        })
    }

    pub(crate) fn program(
        &mut self,
        name: &str,
        vertex: ShaderSource,
        fragment: ShaderSource,
    ) -> AssetResult<Program> {
        let vertex_text = self.reader.source_text(&vertex, ShaderStage::Vertex)?;
        let fragment_text = self.reader.source_text(&fragment, ShaderStage::Fragment)?;
        let id = self.gpu.compile_program(name, &vertex_text, &fragment_text)?;
        Ok(Program::new(id, vertex, fragment))
    }

    /// Recompile `program` from its sources and swap the new id in. On
    /// failure the current id is kept.
    pub(crate) fn recompile(&mut self, name: &str, program: &Program) -> AssetResult<()> {
        let vertex_text = self.reader.source_text(program.vertex_source(), ShaderStage::Vertex)?;
        let fragment_text = self
            .reader
            .source_text(program.fragment_source(), ShaderStage::Fragment)?;
        let id = self.gpu.compile_program(name, &vertex_text, &fragment_text)?;
        let old = program.swap_id(id);
        self.gpu.destroy_program(old);
        Ok(())
    }
}
