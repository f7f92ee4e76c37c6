//! Lexical relative-path computation.
//!
//! The canonicaliser needs "path of A relative to B" for two absolute paths
//! without consulting the filesystem; std has no such helper.

use std::path::Path;

/// Returns `path` expressed relative to `base`, purely lexically.
///
/// Both paths must be absolute. Identical paths yield `"."`.
pub fn relative_to(path: &Path, base: &Path) -> String {
    let mut path_components = path.components().peekable();
    let mut base_components = base.components().peekable();

    while let (Some(a), Some(b)) = (path_components.peek(), base_components.peek()) {
        if a != b {
            break;
        }
        path_components.next();
        base_components.next();
    }

    let mut parts: Vec<String> = base_components.map(|_| String::from("..")).collect();
    parts.extend(path_components.map(|c| c.as_os_str().to_string_lossy().into_owned()));

    if parts.is_empty() {
        String::from(".")
    } else {
        parts.join("/")
    }
}
