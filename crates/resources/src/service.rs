//! The resources service: index + caches + GPU backend behind one owner.

use std::rc::Rc;

use asset::{mesh::MeshData, texture::TextureData};
use corelib::AssetResult;

use crate::{
    LOG_TARGET,
    cache::AssetCache,
    config::ResourcesConfig,
    gpu::{CubemapFaces, GpuBackend, ShaderStage},
    handles::{Mesh, Program, ShaderSource, Texture},
    loader::{Loader, Reader},
    name_index::NameIndex,
    resolver::PathResolver,
    source::ResourceRoot,
};

/// Owns the name index, the mesh/texture/program caches and the GPU backend.
///
/// Constructed once (scanning the root) and then passed by reference to the
/// rendering code. Every getter either returns a cached handle or performs
/// the whole load synchronously. Errors are logged and surface as `None`,
/// an empty string, or (for textures) the default texture.
///
/// Dropping the service does not release GPU objects; call [`Resources::reset`]
/// first if the backend outlives it.
pub struct Resources<G: GpuBackend> {
    config: ResourcesConfig,
    root: ResourceRoot,
    index: NameIndex,
    gpu: G,
    meshes: AssetCache<Mesh>,
    textures: AssetCache<Texture>,
    programs: AssetCache<Program>,
}

fn report<T>(kind: &str, name: &str, result: AssetResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log::error!(target: LOG_TARGET, "Unable to load {} named \"{}\": {}", kind, name, err);
            None
        }
    }
}

impl<G: GpuBackend> Resources<G> {
    /// Scan the configured root (directory, or `<root>.zip` with `packaged`).
    pub fn new(config: ResourcesConfig, gpu: G) -> Self {
        let root = ResourceRoot::for_build(config.effective_root());
        Self::with_root(config, root, gpu)
    }

    pub fn with_root(config: ResourcesConfig, root: ResourceRoot, gpu: G) -> Self {
        let index = root.scan();
        Self {
            config,
            root,
            index,
            gpu,
            meshes: AssetCache::new(),
            textures: AssetCache::new(),
            programs: AssetCache::new(),
        }
    }

    pub fn config(&self) -> &ResourcesConfig {
        &self.config
    }

    pub fn root(&self) -> &ResourceRoot {
        &self.root
    }

    pub fn index(&self) -> &NameIndex {
        &self.index
    }

    pub fn resolver(&self) -> PathResolver<'_> {
        PathResolver::new(&self.index)
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    /// Rebuild the name index from the root. Cached assets are kept.
    pub fn rescan(&mut self) {
        self.index = self.root.scan();
    }

    // ----- meshes -----

    /// Mesh from `name.obj`. `None` if missing or malformed.
    pub fn get_mesh(&mut self, name: &str) -> Option<Rc<Mesh>> {
        let mut loader = Loader::new(&self.root, &self.index, &mut self.gpu);
        let result = self
            .meshes
            .get_or_try_insert_with(name, || loader.mesh(name));
        report("mesh", name, result)
    }

    /// Upload in-memory geometry under `name`.
    ///
    /// Unlike textures and programs, this always uploads: an existing mesh
    /// with the same name is released and replaced by the new one.
    pub fn register_mesh(&mut self, name: &str, data: &MeshData) -> Option<Rc<Mesh>> {
        let mut loader = Loader::new(&self.root, &self.index, &mut self.gpu);
        let mesh = report("mesh", name, loader.upload_mesh(name, data))?;
        Some(self.meshes.replace(name, mesh, &mut self.gpu))
    }

    // ----- textures -----

    /// 2D texture from `name.<ext>` or a `name_0`, `name_1`, ... mip chain.
    /// Any failure falls back to the default texture, which itself falls back
    /// to a generated checkerboard when it is not on disk.
    pub fn get_texture(&mut self, name: &str, srgb: bool) -> Option<Rc<Texture>> {
        let mut loader = Loader::new(&self.root, &self.index, &mut self.gpu);
        let err = match self
            .textures
            .get_or_try_insert_with(name, || loader.texture(name, srgb))
        {
            Ok(texture) => return Some(texture),
            Err(err) => err,
        };

        if name == self.config.default_texture {
            log::warn!(
                target: LOG_TARGET,
                "Default texture unavailable ({}), generating a placeholder.",
                err
            );
            let placeholder = TextureData::checkerboard(self.config.placeholder_size);
            return self.register_texture(name, std::slice::from_ref(&placeholder), srgb);
        }

        if err.is_not_found() {
            log::debug!(target: LOG_TARGET, "Unable to find texture named \"{}\".", name);
        } else {
            log::error!(target: LOG_TARGET, "Unable to load texture named \"{}\": {}", name, err);
        }
        let fallback = self.config.default_texture.clone();
        self.get_texture(&fallback, srgb)
    }

    /// Cubemap from six `name_px` ... `name_nz` images, or a chain of
    /// complete `name_0_*`, `name_1_*`, ... levels. No fallback.
    pub fn get_cubemap(&mut self, name: &str, srgb: bool) -> Option<Rc<Texture>> {
        let mut loader = Loader::new(&self.root, &self.index, &mut self.gpu);
        let result = self
            .textures
            .get_or_try_insert_with(name, || loader.cubemap(name, srgb));
        report("cubemap", name, result)
    }

    /// Upload decoded mip levels under `name`. No-op returning the cached
    /// texture if `name` is already present.
    pub fn register_texture(
        &mut self,
        name: &str,
        levels: &[TextureData],
        srgb: bool,
    ) -> Option<Rc<Texture>> {
        let mut loader = Loader::new(&self.root, &self.index, &mut self.gpu);
        let result = self
            .textures
            .get_or_try_insert_with(name, || loader.upload_texture(name, levels, srgb));
        report("texture", name, result)
    }

    /// Cubemap variant of [`Resources::register_texture`], same semantics.
    pub fn register_cubemap(
        &mut self,
        name: &str,
        levels: &[CubemapFaces],
        srgb: bool,
    ) -> Option<Rc<Texture>> {
        let mut loader = Loader::new(&self.root, &self.index, &mut self.gpu);
        let result = self
            .textures
            .get_or_try_insert_with(name, || loader.upload_cubemap(name, levels, srgb));
        report("cubemap", name, result)
    }

    // ----- programs -----

    /// Program compiled from `name.vert` and `name.frag`.
    pub fn get_program(&mut self, name: &str) -> Option<Rc<Program>> {
        self.get_program_with(name, name, name)
    }

    /// Program cached as `name`, compiled from `vertex.vert` and `fragment.frag`.
    pub fn get_program_with(
        &mut self,
        name: &str,
        vertex: &str,
        fragment: &str,
    ) -> Option<Rc<Program>> {
        let mut loader = Loader::new(&self.root, &self.index, &mut self.gpu);
        let result = self.programs.get_or_try_insert_with(name, || {
            loader.program(
                name,
                ShaderSource::Named(vertex.to_string()),
                ShaderSource::Named(fragment.to_string()),
            )
        });
        report("program", name, result)
    }

    /// Program compiled from in-memory sources. No-op if `name` exists.
    pub fn register_program(
        &mut self,
        name: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Option<Rc<Program>> {
        let mut loader = Loader::new(&self.root, &self.index, &mut self.gpu);
        let result = self.programs.get_or_try_insert_with(name, || {
            loader.program(
                name,
                ShaderSource::Inline(vertex_source.to_string()),
                ShaderSource::Inline(fragment_source.to_string()),
            )
        });
        report("program", name, result)
    }

    /// Recompile every cached program in place. Handles stay valid; their
    /// ids may change. Programs that fail to rebuild keep their current id.
    pub fn reload(&mut self) {
        let mut loader = Loader::new(&self.root, &self.index, &mut self.gpu);
        let mut failed = 0;
        for (name, program) in self.programs.iter() {
            if let Err(err) = loader.recompile(name, program) {
                failed += 1;
                log::warn!(target: LOG_TARGET, "Keeping previous build of program \"{}\": {}", name, err);
            }
        }
        log::info!(
            target: LOG_TARGET,
            "Shader programs reloaded ({} of {} failed).",
            failed,
            self.programs.len()
        );
    }

    // ----- text -----

    /// Text asset by file name, trying `name` then `name.txt`. Empty string
    /// (and an error log) if neither exists.
    pub fn get_string(&self, name: &str) -> String {
        let reader = Reader::new(&self.root, &self.index);
        match reader.text(name) {
            Ok(text) => text,
            Err(err) if err.is_not_found() => {
                log::error!(target: LOG_TARGET, "Unable to find text file named \"{}\".", name);
                String::new()
            }
            Err(err) => {
                log::error!(target: LOG_TARGET, "{}", err);
                String::new()
            }
        }
    }

    /// Source of one shader stage (`name.vert` / `name.frag`); empty if missing.
    pub fn get_shader(&self, name: &str, stage: ShaderStage) -> String {
        let reader = Reader::new(&self.root, &self.index);
        reader.shader(name, stage).unwrap_or_else(|err| {
            log::error!(
                target: LOG_TARGET,
                "Unable to find {} shader named \"{}\": {}",
                stage.label(),
                name,
                err
            );
            String::new()
        })
    }

    /// Raw bytes of an indexed file, by exact file name.
    pub fn get_raw_data(&self, file_name: &str) -> Option<Vec<u8>> {
        let reader = Reader::new(&self.root, &self.index);
        report("file", file_name, reader.raw(file_name))
    }

    // ----- lifecycle -----

    /// Release every cached mesh, texture and program. The index is kept.
    pub fn reset(&mut self) {
        let meshes = self.meshes.clear(&mut self.gpu);
        let textures = self.textures.clear(&mut self.gpu);
        let programs = self.programs.clear(&mut self.gpu);
        log::info!(
            target: LOG_TARGET,
            "Released {} meshes, {} textures, {} programs.",
            meshes,
            textures,
            programs
        );
    }

    pub fn meshes(&self) -> &AssetCache<Mesh> {
        &self.meshes
    }

    pub fn textures(&self) -> &AssetCache<Texture> {
        &self.textures
    }

    pub fn programs(&self) -> &AssetCache<Program> {
        &self.programs
    }

    pub fn mesh_names(&self) -> Vec<String> {
        self.meshes.names()
    }

    pub fn texture_names(&self) -> Vec<String> {
        self.textures.names()
    }

    pub fn program_names(&self) -> Vec<String> {
        self.programs.names()
    }
}
