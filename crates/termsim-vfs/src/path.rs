//! Path helpers. All VFS keys are normalized absolute paths.

use std::borrow::Cow;

/// Check whether a path is already in normal form (starts with `/`, no `//`,
/// no trailing `/` unless root).
fn is_normalized(path: &str) -> bool {
    if !path.starts_with('/') {
        return false;
    }
    if path.len() > 1 && path.ends_with('/') {
        return false;
    }
    !path.contains("//")
}

/// Normalize a path: ensure leading `/`, collapse `//`, strip trailing `/`
/// (except for root). Returns the input unchanged (zero-alloc) when already
/// in normal form.
pub fn normalize(path: &str) -> Cow<'_, str> {
    if is_normalized(path) {
        return Cow::Borrowed(path);
    }
    let mut result = String::with_capacity(path.len() + 1);
    result.push('/');
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if result.len() > 1 {
            result.push('/');
        }
        result.push_str(segment);
    }
    Cow::Owned(result)
}

/// Return the parent of a normalized path.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

/// Final segment of a normalized path (empty for root).
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Join a directory and a single child name.
pub fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Resolve a possibly-relative path against the current working directory.
///
/// `.` segments are dropped and `..` pops a segment, never above `/`.
pub fn resolve_path(cwd: &str, input: &str) -> String {
    let raw = if input.starts_with('/') {
        input.to_string()
    } else {
        join(cwd, input)
    };

    let mut parts: Vec<&str> = Vec::new();
    for component in raw.split('/') {
        match component {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_strips() {
        assert_eq!(normalize("//home//alumno/"), "/home/alumno");
        assert_eq!(normalize("home"), "/home");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
    }

    #[test]
    fn normalize_borrows_when_clean() {
        assert!(matches!(normalize("/home/alumno"), Cow::Borrowed(_)));
    }

    #[test]
    fn parent_of_paths() {
        assert_eq!(parent("/home/alumno"), "/home");
        assert_eq!(parent("/home"), "/");
        assert_eq!(parent("/"), "/");
    }

    #[test]
    fn file_name_of_paths() {
        assert_eq!(file_name("/home/alumno/notas.txt"), "notas.txt");
        assert_eq!(file_name("/"), "");
    }

    #[test]
    fn join_at_root() {
        assert_eq!(join("/", "etc"), "/etc");
        assert_eq!(join("/etc", "hosts"), "/etc/hosts");
    }

    #[test]
    fn resolve_absolute() {
        assert_eq!(resolve_path("/home", "/etc/ssh"), "/etc/ssh");
    }

    #[test]
    fn resolve_relative() {
        assert_eq!(resolve_path("/home/alumno", ".ssh/id_rsa"), "/home/alumno/.ssh/id_rsa");
    }

    #[test]
    fn resolve_dotdot_clamps_at_root() {
        assert_eq!(resolve_path("/home/alumno", "../teacher"), "/home/teacher");
        assert_eq!(resolve_path("/home", "../../.."), "/");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_is_idempotent(path in "[/a-z0-9_.]{1,50}") {
                let once = normalize(&path);
                let twice = normalize(&once);
                prop_assert_eq!(&once, &twice, "normalize must be idempotent");
            }

            #[test]
            fn normalize_never_has_double_slashes(path in "[/a-z0-9_.]{0,50}") {
                let normed = normalize(&path);
                prop_assert!(!normed.contains("//"), "normalized path must not contain //: {}", normed);
                prop_assert!(normed.starts_with('/'));
                if normed != "/" {
                    prop_assert!(!normed.ends_with('/'));
                }
            }

            #[test]
            fn resolved_paths_are_normalized(cwd in "(/[a-z]{1,5}){0,4}", input in "[a-z./]{0,20}") {
                let cwd = if cwd.is_empty() { "/".to_string() } else { cwd };
                let resolved = resolve_path(&cwd, &input);
                prop_assert_eq!(normalize(&resolved), resolved.as_str());
            }
        }
    }
}
