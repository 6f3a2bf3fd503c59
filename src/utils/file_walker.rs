//! Markdown file discovery.
use super::exclude::{GitignoreCache, PathExcluder};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursively discover markdown files under `root`, sorted by path.
///
/// Excluded directories are pruned before descent. Unreadable entries are
/// logged and skipped. Symlinked directories are not followed; symlinks to
/// regular files are collected.
#[must_use]
pub fn find_markdown_files(root: &Path, excluder: &PathExcluder) -> Vec<PathBuf> {
    let mut cache = GitignoreCache::new();
    let mut out = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !excluder.should_exclude(e.path(), root, &mut cache));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let at = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                tracing::warn!("Skipping unreadable entry {at}: {e}");
                continue;
            }
        };
        let ft = entry.file_type();
        let is_file = ft.is_file() || (ft.is_symlink() && entry.path().is_file());
        if is_file && is_markdown(entry.path()) {
            out.push(entry.into_path());
        }
    }
    out.sort();
    out
}

/// Case-insensitive `.md` extension check.
#[must_use]
pub fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(OsStr::to_str).is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::exclude::DiscoveryOptions;
    use std::fs;
    use tempfile::tempdir;

    fn touch(p: &Path) {
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(p, "# t\n").unwrap();
    }

    #[test]
    fn test_collects_sorted_markdown_only() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.md"));
        touch(&root.join("a.MD"));
        touch(&root.join("notes.txt"));
        touch(&root.join("sub/c.md"));

        let files = find_markdown_files(root, &PathExcluder::default());
        let names: Vec<_> =
            files.iter().map(|p| p.strip_prefix(root).unwrap().to_path_buf()).collect();
        assert_eq!(
            names,
            vec![PathBuf::from("a.MD"), PathBuf::from("b.md"), PathBuf::from("sub/c.md")]
        );
        assert!(files.iter().all(|p| p.starts_with(root)));
    }

    #[test]
    fn test_excluded_directories_are_pruned() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("node_modules/pkg/README.md"));
        touch(&root.join("docs/index.md"));

        let files = find_markdown_files(root, &PathExcluder::default());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("docs/index.md"));

        let all = find_markdown_files(
            root,
            &PathExcluder::new(&DiscoveryOptions {
                use_default_excludes: false,
                ..DiscoveryOptions::default()
            }),
        );
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_directory_named_like_markdown_is_not_collected() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("folder.md")).unwrap();
        touch(&root.join("folder.md/inner.md"));
        let files = find_markdown_files(root, &PathExcluder::default());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("folder.md/inner.md"));
    }

    #[test]
    fn test_is_markdown_extension() {
        assert!(is_markdown(Path::new("x.md")));
        assert!(is_markdown(Path::new("X.Md")));
        assert!(!is_markdown(Path::new("x.markdown")));
        assert!(!is_markdown(Path::new("md")));
    }

    #[test]
    fn test_bad_gitignore_does_not_stop_discovery() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("a.md"));
        touch(&root.join("drafts/b.md"));
        fs::write(root.join(".gitignore"), b"drafts/\n\xff\n").unwrap();
        fs::create_dir_all(root.join("drafts/.gitignore")).unwrap();

        let files = find_markdown_files(root, &PathExcluder::default());
        assert_eq!(files.len(), 2);
        assert!(files[1].ends_with("drafts/b.md"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("locked/inner.md"));
        touch(&root.join("open/a.md"));
        touch(&root.join("z.md"));
        let locked = root.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // permissions are not enforced (running as root)
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let files = find_markdown_files(root, &PathExcluder::default());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let names: Vec<_> =
            files.iter().map(|p| p.strip_prefix(root).unwrap().to_path_buf()).collect();
        assert_eq!(names, vec![PathBuf::from("open/a.md"), PathBuf::from("z.md")]);
    }
}
