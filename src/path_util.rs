//! Path normalization and archive-extension classification.
//!
//! Internal paths are plain POSIX strings relative to the mount root, with
//! `"."` standing for the root itself (no leading slash, no trailing slash).

const ARCHIVE_EXTS: &[&str] = &[
    "sarc", "pack", "bactorpack", "bmodelsh", "beventpack", "stera", "stats", "blarc", "genvb",
    "bfarc", "ssarc", "spack", "sbactorpack", "sbmodelsh", "sbeventpack", "sstera", "sstats",
    "sblarc", "sgenvb", "sbfarc",
];

/// The synthesized child every archive directory exposes in its root,
/// yielding the archive's own undecoded bytes.
pub const RAW_ARCHIVE_NAME: &str = ".__RAW_ARCHIVE__";

/// True iff the suffix after the final `.` of the last path segment is a
/// recognized archive extension. No extension, or an unrecognized one,
/// returns false.
pub fn is_archive_name(path: &str) -> bool {
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    match last_segment.rsplit_once('.') {
        Some((_, ext)) => ARCHIVE_EXTS.contains(&ext),
        None => false,
    }
}

/// Strips the leading `/` the mount host hands us, yielding the internal
/// representation (`"."` for the root).
pub fn to_internal(partial: &str) -> String {
    let stripped = partial.strip_prefix('/').unwrap_or(partial);
    if stripped.is_empty() {
        ".".to_string()
    } else {
        stripped.to_string()
    }
}

/// Splits `path` into (parent, file name). The root's parent is itself (`"."`).
pub fn split_parent(path: &str) -> (&str, &str) {
    if path == "." {
        return (".", ".");
    }
    match path.rsplit_once('/') {
        Some((parent, name)) => (if parent.is_empty() { "." } else { parent }, name),
        None => (".", path),
    }
}

/// Path of `path` relative to `base`. Both are internal paths; `base` must be
/// a prefix of `path` (or equal to it).
pub fn relative_to(path: &str, base: &str) -> String {
    if base == "." {
        return path.to_string();
    }
    if path == base {
        return ".".to_string();
    }
    path.strip_prefix(base)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(|rest| rest.to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Joins a base path with a relative child, both internal paths.
pub fn join(base: &str, child: &str) -> String {
    if base == "." {
        child.to_string()
    } else if child == "." {
        base.to_string()
    } else {
        format!("{base}/{child}")
    }
}

/// Splits an archive-internal relative name on its first `/`, as used by
/// archive listing: everything up to (not including) the first slash is the
/// synthesized immediate child; anything past it is nested.
pub fn first_segment(name: &str) -> (&str, Option<&str>) {
    match name.split_once('/') {
        Some((first, rest)) => (first, Some(rest)),
        None => (name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_names_recognized_case_sensitively() {
        assert!(is_archive_name("pack.sarc"));
        assert!(is_archive_name("foo/bar.ssarc"));
        assert!(!is_archive_name("pack.SARC"));
        assert!(!is_archive_name("noext"));
        assert!(!is_archive_name("plain.txt"));
    }

    #[test]
    fn internal_path_strips_leading_slash() {
        assert_eq!(to_internal("/"), ".");
        assert_eq!(to_internal("/a/b.txt"), "a/b.txt");
    }

    #[test]
    fn split_parent_handles_root_and_nested() {
        assert_eq!(split_parent("."), (".", "."));
        assert_eq!(split_parent("a.txt"), (".", "a.txt"));
        assert_eq!(split_parent("pack.sarc/foo.bin"), ("pack.sarc", "foo.bin"));
    }

    #[test]
    fn relative_to_strips_base_prefix() {
        assert_eq!(relative_to("a/b.txt", "."), "a/b.txt");
        assert_eq!(relative_to("pack.sarc/foo.bin", "pack.sarc"), "foo.bin");
        assert_eq!(relative_to("pack.sarc", "pack.sarc"), ".");
    }
}
