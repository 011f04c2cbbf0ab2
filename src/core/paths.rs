//! Path resolution for the configured watch root.

use std::env;
use std::path::{Component, Path, PathBuf};

/// Resolve a path to an absolute, normalized form.
///
/// Existing paths go through `fs::canonicalize`, which also resolves
/// symlinks. Nonexistent paths (the watch root may be created after startup)
/// are made absolute against the CWD and normalized syntactically.
pub fn resolve_absolute_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    if let Ok(canonical) = std::fs::canonicalize(&absolute) {
        return canonical;
    }

    normalize_syntactic(&absolute)
}

/// Collapse `.` and `..` components without touching the filesystem.
fn normalize_syntactic(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::Prefix(..) | Component::RootDir | Component::Normal(_) => {
                components.push(component);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if let Some(Component::Normal(_)) = components.last() {
                    components.pop();
                }
            }
        }
    }
    components.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_existing_path_canonically() {
        let cwd = env::current_dir().unwrap();
        let resolved = resolve_absolute_path(Path::new("."));
        assert_eq!(resolved, std::fs::canonicalize(&cwd).unwrap());
    }

    #[test]
    fn normalizes_nonexistent_path_syntactically() {
        #[cfg(unix)]
        let root = Path::new("/");
        #[cfg(windows)]
        let root = Path::new("C:");

        let input = root.join("no-such-dir").join("a").join("..").join("frames");
        let expected = root.join("no-such-dir").join("frames");

        assert!(std::fs::canonicalize(&input).is_err());
        assert_eq!(resolve_absolute_path(&input), expected);
    }

    #[test]
    fn parent_component_at_root_is_dropped() {
        #[cfg(unix)]
        {
            let resolved = normalize_syntactic(Path::new("/../frames"));
            assert_eq!(resolved, Path::new("/frames"));
        }
    }
}
