//! Logical name → indexed path resolution.
//!
//! Naming conventions are fixed: image extensions are probed in
//! [`IMAGE_EXTENSIONS`] order, cubemap faces use the [`CUBEMAP_FACES`]
//! suffixes and mip levels the `_0`, `_1`, ... suffixes.

use std::path::{Path, PathBuf};

use crate::name_index::NameIndex;

/// Image extensions in preference order.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "bmp", "tga", "exr"];

/// Cubemap face suffixes, in upload order (+X, -X, +Y, -Y, +Z, -Z).
pub const CUBEMAP_FACES: [&str; 6] = ["_px", "_nx", "_py", "_ny", "_pz", "_nz"];

/// Paths of the six faces of one cubemap level.
pub type CubemapPaths = [PathBuf; 6];

#[derive(Clone, Copy, Debug)]
pub struct PathResolver<'a> {
    index: &'a NameIndex,
}

impl<'a> PathResolver<'a> {
    pub fn new(index: &'a NameIndex) -> Self {
        Self { index }
    }

    /// Exact bare file name lookup.
    pub fn resolve_file(&self, file_name: &str) -> Option<&'a Path> {
        self.index.get(file_name)
    }

    /// First `name.ext` present in the index, trying `extensions` in order.
    pub fn resolve_path(&self, name: &str, extensions: &[&str]) -> Option<&'a Path> {
        extensions
            .iter()
            .find_map(|ext| self.index.get(&format!("{}.{}", name, ext)))
    }

    pub fn resolve_image(&self, name: &str) -> Option<&'a Path> {
        self.resolve_path(name, &IMAGE_EXTENSIONS)
    }

    /// All six faces or nothing: a partial cubemap is never returned.
    pub fn resolve_cubemap(&self, name: &str) -> Option<CubemapPaths> {
        let mut faces: [PathBuf; 6] = Default::default();
        for (slot, suffix) in faces.iter_mut().zip(CUBEMAP_FACES) {
            *slot = self.resolve_image(&format!("{}{}", name, suffix))?.to_path_buf();
        }
        Some(faces)
    }

    /// Contiguous `name_0`, `name_1`, ... images, stopping at the first gap.
    pub fn resolve_mipmap_chain(&self, name: &str) -> Vec<PathBuf> {
        (0..)
            .map_while(|level| self.resolve_image(&format!("{}_{}", name, level)))
            .map(Path::to_path_buf)
            .collect()
    }

    /// Contiguous complete cubemaps `name_0_*`, `name_1_*`, ...
    pub fn resolve_cubemap_chain(&self, name: &str) -> Vec<CubemapPaths> {
        (0..)
            .map_while(|level| self.resolve_cubemap(&format!("{}_{}", name, level)))
            .collect()
    }

    /// Exact file name first, then `name.txt`.
    pub fn resolve_text(&self, name: &str) -> Option<&'a Path> {
        self.resolve_file(name)
            .or_else(|| self.index.get(&format!("{}.txt", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(names: &[&str]) -> NameIndex {
        let mut index = NameIndex::new();
        for name in names {
            index.insert(name, format!("root/{}", name));
        }
        index
    }

    #[test]
    fn image_extensions_follow_preference_order() {
        let index = index(&["wood.tga", "wood.jpg", "sky.exr"]);
        let resolver = PathResolver::new(&index);
        assert_eq!(resolver.resolve_image("wood"), Some(Path::new("root/wood.jpg")));
        assert_eq!(resolver.resolve_image("sky"), Some(Path::new("root/sky.exr")));
        assert_eq!(resolver.resolve_image("none"), None);
    }

    #[test]
    fn cubemap_requires_all_six_faces() {
        let all = ["sky_px.png", "sky_nx.png", "sky_py.png", "sky_ny.png", "sky_pz.png", "sky_nz.jpg"];
        let full = index(&all);
        let faces = PathResolver::new(&full).resolve_cubemap("sky").expect("complete cubemap");
        assert_eq!(faces[0], PathBuf::from("root/sky_px.png"));
        assert_eq!(faces[5], PathBuf::from("root/sky_nz.jpg"));

        for missing in 0..6 {
            let partial: Vec<&str> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != missing)
                .map(|(_, n)| *n)
                .collect();
            let partial = index(&partial);
            assert!(PathResolver::new(&partial).resolve_cubemap("sky").is_none());
        }
    }

    #[test]
    fn mipmap_chain_stops_at_first_gap() {
        let index = index(&["tex_0.png", "tex_1.png", "tex_3.png"]);
        let chain = PathResolver::new(&index).resolve_mipmap_chain("tex");
        assert_eq!(
            chain,
            vec![PathBuf::from("root/tex_0.png"), PathBuf::from("root/tex_1.png")]
        );
    }

    #[test]
    fn mipmap_chain_is_empty_without_level_zero() {
        let index = index(&["tex_1.png", "tex_2.png"]);
        assert!(PathResolver::new(&index).resolve_mipmap_chain("tex").is_empty());
    }

    #[test]
    fn cubemap_chain_collects_complete_levels() {
        let mut names = Vec::new();
        for level in 0..2 {
            for face in CUBEMAP_FACES {
                names.push(format!("env_{}{}.png", level, face));
            }
        }
        // Level 2 is incomplete.
        names.push("env_2_px.png".to_string());
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let index = index(&refs);
        assert_eq!(PathResolver::new(&index).resolve_cubemap_chain("env").len(), 2);
    }

    #[test]
    fn text_lookup_tries_txt_suffix() {
        let index = index(&["readme.txt", "config"]);
        let resolver = PathResolver::new(&index);
        assert_eq!(resolver.resolve_text("readme"), Some(Path::new("root/readme.txt")));
        assert_eq!(resolver.resolve_text("config"), Some(Path::new("root/config")));
        assert_eq!(resolver.resolve_text("absent"), None);
    }
}
