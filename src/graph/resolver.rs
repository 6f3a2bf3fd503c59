use std::path::{Component, Path, PathBuf};

/// Maps an internal link target written in `source_file` to a file identity.
///
/// Implemented by [`PathResolver`] and by any
/// `Fn(&Path, &str, &Path) -> PathBuf`, which lets tests substitute fakes.
pub trait LinkResolver {
    fn resolve(&self, source_file: &Path, raw_target: &str, base_dir: &Path) -> PathBuf;
}

impl<F> LinkResolver for F
where
    F: Fn(&Path, &str, &Path) -> PathBuf,
{
    fn resolve(&self, source_file: &Path, raw_target: &str, base_dir: &Path) -> PathBuf {
        self(source_file, raw_target, base_dir)
    }
}

/// Pure path arithmetic: never touches the filesystem.
///
/// - `/x/y.md` is relative to `base_dir`.
/// - anything else is relative to the directory holding `source_file`.
///
/// The result is lexically normalized (`.` removed, `..` folded).
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver;

impl LinkResolver for PathResolver {
    fn resolve(&self, source_file: &Path, raw_target: &str, base_dir: &Path) -> PathBuf {
        let joined = if raw_target.starts_with('/') {
            base_dir.join(raw_target.trim_start_matches('/'))
        } else {
            source_file.parent().unwrap_or_else(|| Path::new("")).join(raw_target)
        };
        normalize_path(&joined)
    }
}

/// Lexically normalize a path. `..` at the root is dropped; leading `..` of
/// a relative path is kept.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                Some(Component::ParentDir | Component::CurDir) | None => out.push(comp),
            },
            other => out.push(other),
        }
    }
    out.iter().map(|c| c.as_os_str()).collect()
}
