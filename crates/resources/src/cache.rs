//! Name-keyed asset cache shared by meshes, textures and programs.

use std::{collections::HashMap, rc::Rc};

use corelib::AssetResult;

use crate::gpu::GpuBackend;

/// A cached GPU-resident asset.
pub trait Asset {
    /// Short kind label used in diagnostics.
    const KIND: &'static str;

    /// Release the GPU objects owned by this asset.
    fn release<G: GpuBackend + ?Sized>(&self, gpu: &mut G);
}

/// Logical name → shared handle. Entries are created by a successful load or
/// registration and only released by [`AssetCache::clear`] (or replaced by
/// [`AssetCache::replace`]); dropping the last `Rc` never frees GPU memory.
/// Failed loads leave no trace, so a later request retries the full load.
pub struct AssetCache<A> {
    entries: HashMap<String, Rc<A>>,
}

impl<A> Default for AssetCache<A> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<A: Asset> AssetCache<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Rc<A>> {
        self.entries.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Return the cached entry, or run `load` and cache its result.
    /// `load` is not called on a hit; a failed `load` caches nothing.
    pub fn get_or_try_insert_with<F>(&mut self, name: &str, load: F) -> AssetResult<Rc<A>>
    where
        F: FnOnce() -> AssetResult<A>,
    {
        if let Some(hit) = self.entries.get(name) {
            return Ok(Rc::clone(hit));
        }
        let asset = Rc::new(load()?);
        log::debug!("Cached {} '{}'", A::KIND, name);
        self.entries.insert(name.to_string(), Rc::clone(&asset));
        Ok(asset)
    }

    /// Store `asset` under `name` unconditionally, releasing whatever was
    /// cached there before.
    pub fn replace<G: GpuBackend + ?Sized>(&mut self, name: &str, asset: A, gpu: &mut G) -> Rc<A> {
        let asset = Rc::new(asset);
        if let Some(previous) = self.entries.insert(name.to_string(), Rc::clone(&asset)) {
            log::debug!("Replacing {} '{}'", A::KIND, name);
            previous.release(gpu);
        }
        asset
    }

    /// Release every entry and empty the cache. Returns how many were released.
    pub fn clear<G: GpuBackend + ?Sized>(&mut self, gpu: &mut G) -> usize {
        let count = self.entries.len();
        for (_, asset) in self.entries.drain() {
            asset.release(gpu);
        }
        count
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<A>)> {
        self.entries.iter().map(|(name, asset)| (name.as_str(), asset))
    }

    /// Cached names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use corelib::AssetError;

    use super::*;
    use crate::gpu::{HeadlessGpu, TextureId};

    struct Probe(TextureId);

    impl Asset for Probe {
        const KIND: &'static str = "probe";

        fn release<G: GpuBackend + ?Sized>(&self, gpu: &mut G) {
            gpu.destroy_texture(self.0);
        }
    }

    fn upload(gpu: &mut HeadlessGpu) -> AssetResult<Probe> {
        let tex = asset::texture::TextureData::checkerboard(2);
        gpu.upload_texture("probe", &[tex], false).map(Probe)
    }

    #[test]
    fn repeated_get_returns_identical_handle_without_reloading() {
        let mut gpu = HeadlessGpu::new();
        let mut cache = AssetCache::<Probe>::new();
        let loads = Cell::new(0);

        let first = cache
            .get_or_try_insert_with("rock", || {
                loads.set(loads.get() + 1);
                upload(&mut gpu)
            })
            .unwrap();
        let second = cache
            .get_or_try_insert_with("rock", || {
                loads.set(loads.get() + 1);
                upload(&mut gpu)
            })
            .unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(loads.get(), 1);
        assert_eq!(gpu.upload_count(), 1);
    }

    #[test]
    fn failures_are_not_cached() {
        let mut cache = AssetCache::<Probe>::new();
        let err = cache
            .get_or_try_insert_with("ghost", || Err(AssetError::NotFound("ghost".into())))
            .err()
            .unwrap();
        assert!(err.is_not_found());
        assert!(!cache.contains("ghost"));
        assert!(cache.is_empty());
    }

    #[test]
    fn replace_releases_previous_entry() {
        let mut gpu = HeadlessGpu::new();
        let mut cache = AssetCache::<Probe>::new();
        let old = cache.replace("a", upload(&mut gpu).unwrap(), &mut gpu);
        let new = cache.replace("a", upload(&mut gpu).unwrap(), &mut gpu);

        assert!(!Rc::ptr_eq(&old, &new));
        assert!(!gpu.is_texture_alive(old.0));
        assert!(gpu.is_texture_alive(new.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_releases_everything_and_is_safe_when_empty() {
        let mut gpu = HeadlessGpu::new();
        let mut cache = AssetCache::<Probe>::new();
        assert_eq!(cache.clear(&mut gpu), 0);

        for name in ["b", "a"] {
            cache
                .get_or_try_insert_with(name, || upload(&mut gpu))
                .unwrap();
        }
        assert_eq!(cache.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(cache.clear(&mut gpu), 2);
        assert!(cache.is_empty());
        assert_eq!(gpu.live_objects(), 0);
    }
}
