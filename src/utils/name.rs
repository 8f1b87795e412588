//! Resource name conventions.
//!
//! A resource name is a `/`-separated path relative to a watched root, e.g.
//! `a/Simple.src`. Names never start with `/` and never contain `..`.

use std::path::{Component, Path};

/// Convert a file path under `root` into a resource name.
///
/// Returns `None` if `path` is not inside `root` or is the root itself.
pub fn resource_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy()),
            Component::CurDir => {}
            _ => return None,
        }
    }

    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}

/// Check whether a resource name is safe to map onto a directory.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('/')
        && !name.contains('\\')
        && name.split('/').all(|seg| !seg.is_empty() && seg != "." && seg != "..")
}

/// Strip the extension of the last segment: `a/Simple.src` -> `a/Simple`.
pub fn strip_extension(name: &str) -> &str {
    let file_start = name.rfind('/').map_or(0, |i| i + 1);
    match name[file_start..].rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..file_start + dot],
    }
}

/// Replace the extension: `retarget("a/Simple.src", "out")` -> `a/Simple.out`.
pub fn retarget(name: &str, extension: &str) -> String {
    format!("{}.{}", strip_extension(name), extension)
}

/// Check whether `name` ends with `.{extension}`.
pub fn has_extension(name: &str, extension: &str) -> bool {
    name.strip_suffix(extension)
        .is_some_and(|stem| stem.ends_with('.') && stem.len() > 1)
}

/// Map a dotted qualified name onto a resource name:
/// `qualified_to_resource("a.Simple", "class")` -> `a/Simple.class`.
pub fn qualified_to_resource(qualified: &str, extension: &str) -> String {
    format!("{}.{}", qualified.replace('.', "/"), extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_resource_name_nested() {
        let root = PathBuf::from("/work/src");
        let path = root.join("a").join("Simple.src");
        assert_eq!(resource_name(&root, &path).as_deref(), Some("a/Simple.src"));
    }

    #[test]
    fn test_resource_name_outside_root() {
        let root = PathBuf::from("/work/src");
        assert_eq!(resource_name(&root, Path::new("/work/other/a.src")), None);
        assert_eq!(resource_name(&root, &root), None);
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("a/Simple.src"), "a/Simple");
        assert_eq!(strip_extension("a.b/Simple"), "a.b/Simple");
        assert_eq!(strip_extension("a/.hidden"), "a/.hidden");
        assert_eq!(strip_extension("Archive.tar.gz"), "Archive.tar");
    }

    #[test]
    fn test_retarget() {
        assert_eq!(retarget("a/Extended.java", "class"), "a/Extended.class");
        assert_eq!(retarget("Readme", "txt"), "Readme.txt");
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension("a/Simple.java", "java"));
        assert!(!has_extension("a/Simple.javax", "java"));
        assert!(!has_extension("a/Simplejava", "java"));
        assert!(!has_extension(".java", "java"));
    }

    #[test]
    fn test_qualified_to_resource() {
        assert_eq!(qualified_to_resource("a.Simple", "class"), "a/Simple.class");
        assert_eq!(qualified_to_resource("Top", "class"), "Top.class");
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("a/Simple.class"));
        assert!(!is_valid_name("/etc/passwd"));
        assert!(!is_valid_name("a/../../x"));
        assert!(!is_valid_name("a//b"));
        assert!(!is_valid_name(""));
    }
}
