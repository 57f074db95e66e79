//! Resource roots: a directory tree or (with `packaged`) a zip archive.
//! Both are scanned into a [`NameIndex`] and serve raw reads of indexed paths.

use std::{
    fs,
    path::{Path, PathBuf},
};

use corelib::{AssetError, AssetResult};

use crate::{LOG_TARGET, name_index::NameIndex};

#[derive(Clone, Debug)]
pub enum ResourceRoot {
    Directory(PathBuf),
    #[cfg(feature = "packaged")]
    Archive(PathBuf),
}

impl ResourceRoot {
    /// Root matching the build mode: archive when `packaged` is enabled.
    #[cfg(feature = "packaged")]
    pub fn for_build(path: impl Into<PathBuf>) -> Self {
        Self::Archive(path.into())
    }

    /// Root matching the build mode: archive when `packaged` is enabled.
    #[cfg(not(feature = "packaged"))]
    pub fn for_build(path: impl Into<PathBuf>) -> Self {
        Self::Directory(path.into())
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Directory(p) => p,
            #[cfg(feature = "packaged")]
            Self::Archive(p) => p,
        }
    }

    /// Enumerate every file under the root. Never fails: unreadable roots and
    /// entries are logged and leave the index partial or empty.
    pub fn scan(&self) -> NameIndex {
        let mut index = NameIndex::new();
        match self {
            Self::Directory(dir) => {
                log::info!(target: LOG_TARGET, "Loading resources from disk ({}).", dir.display());
                scan_directory(dir, &mut index);
            }
            #[cfg(feature = "packaged")]
            Self::Archive(archive) => {
                log::info!(target: LOG_TARGET, "Loading resources from archive ({}).", archive.display());
                if let Err(err) = archive::scan(archive, &mut index) {
                    log::error!(target: LOG_TARGET, "{}", err);
                }
            }
        }
        log::info!(
            target: LOG_TARGET,
            "Indexed {} files ({} name conflicts).",
            index.len(),
            index.conflicts().len()
        );
        index
    }

    /// Read the whole content of an indexed path.
    pub fn read(&self, path: &Path) -> AssetResult<Vec<u8>> {
        match self {
            Self::Directory(_) => fs::read(path).map_err(|source| AssetError::Io {
                path: path.to_path_buf(),
                source,
            }),
            #[cfg(feature = "packaged")]
            Self::Archive(archive) => archive::read(archive, path),
        }
    }
}

/// Recursive walk. Entries are visited in name order so the winner of a name
/// conflict does not depend on the platform's directory order.
fn scan_directory(dir: &Path, index: &mut NameIndex) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            log::error!(
                target: LOG_TARGET,
                "Unable to open resources directory at path {}: {}",
                dir.display(),
                err
            );
            return;
        }
    };

    let mut entries: Vec<_> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::error!(target: LOG_TARGET, "Error getting file in directory {}: {}", dir.display(), err);
                None
            }
        })
        .collect();
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        match entry.file_type() {
            Ok(kind) if kind.is_dir() => {
                if !name.is_empty() {
                    scan_directory(&path, index);
                }
            }
            Ok(_) => {
                index.insert(&name, path);
            }
            Err(err) => {
                log::error!(target: LOG_TARGET, "Unable to stat {}: {}", path.display(), err);
            }
        }
    }
}

#[cfg(feature = "packaged")]
mod archive {
    use std::{fs::File, io::Read, path::Path};

    use corelib::{AssetError, AssetResult};
    use zip::ZipArchive;

    use crate::name_index::NameIndex;

    fn open(archive: &Path) -> AssetResult<ZipArchive<File>> {
        let open_error = |reason: String| AssetError::ArchiveOpen {
            path: archive.to_path_buf(),
            reason,
        };
        let file = File::open(archive).map_err(|e| open_error(e.to_string()))?;
        ZipArchive::new(file).map_err(|e| open_error(e.to_string()))
    }

    pub(super) fn scan(archive: &Path, index: &mut NameIndex) -> AssetResult<()> {
        let mut zip = open(archive)?;
        for i in 0..zip.len() {
            let entry = match zip.by_index_raw(i) {
                Ok(entry) => entry,
                Err(err) => {
                    log::error!(target: crate::LOG_TARGET, "Error reading entry {} infos: {}", i, err);
                    continue;
                }
            };
            if entry.is_dir() {
                continue;
            }
            let full = entry.name().to_string();
            let bare = full.rsplit(['/', '\\']).next().unwrap_or_default();
            index.insert(bare, full.clone());
        }
        Ok(())
    }

    /// Re-opens the archive for every read; the handle is never kept open.
    pub(super) fn read(archive: &Path, entry: &Path) -> AssetResult<Vec<u8>> {
        let mut zip = open(archive)?;
        let name = entry.to_string_lossy();
        let io_error = |source: std::io::Error| AssetError::Io {
            path: entry.to_path_buf(),
            source,
        };
        let mut file = zip
            .by_name(&name)
            .map_err(|e| io_error(std::io::Error::new(std::io::ErrorKind::NotFound, e)))?;
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes).map_err(io_error)?;
        Ok(bytes)
    }
}

/// Read a file outside the resource root (settings, user files) in binary mode.
/// Logs and returns `None` if the file cannot be read.
pub fn read_external_file(path: impl AsRef<Path>) -> Option<Vec<u8>> {
    let path = path.as_ref();
    match fs::read(path) {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            log::error!(target: LOG_TARGET, "Unable to load file at path {}: {}", path.display(), err);
            None
        }
    }
}

/// Text variant of [`read_external_file`]; empty string on failure.
pub fn read_external_string(path: impl AsRef<Path>) -> String {
    read_external_file(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn directory_scan_is_recursive_and_skips_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "meshes/rock.obj", "v 0 0 0");
        touch(dir.path(), "textures/deep/rock.png", "");
        touch(dir.path(), "textures/.hidden", "");

        let index = ResourceRoot::Directory(dir.path().to_path_buf()).scan();
        assert_eq!(index.names(), vec!["rock.obj", "rock.png"]);
        assert_eq!(
            index.get("rock.png"),
            Some(dir.path().join("textures/deep/rock.png").as_path())
        );
    }

    #[test]
    fn duplicate_names_keep_first_encountered_path() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/foo.png", "first");
        touch(dir.path(), "b/foo.png", "second");

        let index = ResourceRoot::Directory(dir.path().to_path_buf()).scan();
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("foo.png"), Some(dir.path().join("a/foo.png").as_path()));
        assert_eq!(index.conflicts().len(), 1);
    }

    #[test]
    fn missing_root_yields_empty_index() {
        let dir = tempfile::tempdir().unwrap();
        let index = ResourceRoot::Directory(dir.path().join("nope")).scan();
        assert!(index.is_empty());
    }

    #[test]
    fn reads_indexed_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "notes/readme.txt", "hello");
        let root = ResourceRoot::Directory(dir.path().to_path_buf());
        let index = root.scan();
        let bytes = root.read(index.get("readme.txt").unwrap()).unwrap();
        assert_eq!(bytes, b"hello");
        assert!(matches!(
            root.read(&dir.path().join("gone.txt")),
            Err(AssetError::Io { .. })
        ));
    }

    #[test]
    fn external_reads_report_failure_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "settings.ini", "vsync=1");
        assert_eq!(read_external_string(dir.path().join("settings.ini")), "vsync=1");
        assert!(read_external_file(dir.path().join("missing.ini")).is_none());
        assert_eq!(read_external_string(dir.path().join("missing.ini")), "");
    }

    #[cfg(feature = "packaged")]
    mod packaged {
        use std::io::Write;

        use zip::{ZipWriter, write::SimpleFileOptions};

        use super::*;

        fn build_archive(path: &Path, files: &[(&str, &str)]) {
            let mut zip = ZipWriter::new(fs::File::create(path).unwrap());
            zip.add_directory("textures/", SimpleFileOptions::default())
                .unwrap();
            for (name, contents) in files {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(contents.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }

        #[test]
        fn archive_entries_are_indexed_by_bare_name() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("resources.zip");
            build_archive(
                &path,
                &[
                    ("textures/stone.png", "x"),
                    ("other/stone.png", "y"),
                    ("readme.txt", "hello"),
                    ("textures/.hidden", ""),
                ],
            );

            let root = ResourceRoot::Archive(path);
            let index = root.scan();
            assert_eq!(index.names(), vec!["readme.txt", "stone.png"]);
            assert_eq!(index.get("stone.png"), Some(Path::new("textures/stone.png")));
            assert_eq!(index.conflicts().len(), 1);
            assert_eq!(root.read(index.get("readme.txt").unwrap()).unwrap(), b"hello");
        }

        #[test]
        fn unreadable_archive_yields_empty_index() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("broken.zip");
            fs::write(&path, "definitely not a zip").unwrap();
            assert!(ResourceRoot::Archive(path).scan().is_empty());
        }
    }
}
