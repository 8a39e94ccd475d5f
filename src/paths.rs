//! Forward-slash path handling for archive entry names.
//!
//! Entry names inside archives are always treated as POSIX paths, no matter
//! which platform the library runs on. Cleaning never touches the
//! filesystem.

/// Lexically clean a forward-slash path: collapse `//` and `.` segments and
/// resolve `..` against preceding components. Follows POSIX `path.Clean`
/// semantics: an empty input becomes `.`, a rooted path stays rooted and
/// cannot climb above `/`.
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Join two path fragments with a slash and clean the result.
pub fn clean_join(base: &str, path: &str) -> String {
    if base.is_empty() {
        return clean(path);
    }
    clean(&format!("{base}/{path}"))
}

/// Clean an entry name and strip the leading slash, yielding the
/// archive-relative form reported to handlers.
pub fn clean_entry_name(name: &str) -> String {
    let cleaned = clean(name);
    cleaned.strip_prefix('/').unwrap_or(&cleaned).to_string()
}

/// Drop everything from the final dot onward. A name with no dot is
/// returned unchanged; a name that *is* a bare extension (`.gz`) strips
/// to the empty string.
pub fn strip_final_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(index) => &name[..index],
        None => name,
    }
}

/// Whether the last path component is the `-` placeholder some build tools
/// emit for folders. Such entries are never surfaced.
pub fn is_placeholder_folder(name: &str) -> bool {
    name.rsplit('/').next() == Some("-")
}

/// Whether the name uses the trailing-slash folder convention.
pub fn is_folder(name: &str) -> bool {
    name.ends_with('/')
}
