//! Definition file discovery under the configured roots.

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// A definition file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub len: u64,
    pub mtime: SystemTime,
}

/// Every regular file under `root` ending in `extension`, sorted by path.
///
/// Hidden files are included, ignore files are not honoured and symlinks
/// are not followed. A missing root yields no files.
pub fn discover(root: &Path, extension: &str) -> Vec<DiscoveredFile> {
    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .follow_links(false);

    let mut files: Vec<DiscoveredFile> = builder
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(root = %root.display(), error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .filter(|entry| has_extension(entry.path(), extension))
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            Some(DiscoveredFile {
                path: normalize(entry.path()),
                len: metadata.len(),
                mtime: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            })
        })
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.len() > extension.len() && n.ends_with(extension))
}

/// Drop `.` components so `./models/a.msql` and `models/a.msql` compare equal.
pub fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discovers_matching_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("sub/.hidden")).unwrap();
        fs::write(dir.path().join("b.msql"), "<model/>").unwrap();
        fs::write(dir.path().join("sub/a.msql"), "<model/>").unwrap();
        fs::write(dir.path().join("sub/.hidden/c.msql"), "<model/>").unwrap();
        fs::write(dir.path().join("sub/readme.txt"), "x").unwrap();
        fs::write(dir.path().join(".gitignore"), "*.msql").unwrap();

        let files = discover(dir.path(), ".msql");
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            [
                PathBuf::from("b.msql"),
                PathBuf::from("sub/.hidden/c.msql"),
                PathBuf::from("sub/a.msql"),
            ]
        );
        assert_eq!(files[0].len, 8);
    }

    #[test]
    fn test_missing_root_is_empty() {
        assert!(discover(Path::new("/definitely/not/here"), ".msql").is_empty());
    }

    #[test]
    fn test_extension_and_normalize() {
        assert!(has_extension(Path::new("a/b.msql"), ".msql"));
        assert!(!has_extension(Path::new("a/.msql"), ".msql"));
        assert!(!has_extension(Path::new("a/b.xml"), ".msql"));
        assert_eq!(normalize(Path::new("./a/./b.msql")), PathBuf::from("a/b.msql"));
    }
}
