//! Fixed denylists for generated, vendored, and binary content
//!
//! Applied unconditionally before any truncation tier: these entries carry
//! little architectural signal and would otherwise crowd out source files.

use glob::Pattern;
use once_cell::sync::Lazy;

/// File extensions excluded from rendered trees (compiled artifacts,
/// binaries, media, archives, lockfiles)
pub(crate) const IGNORED_EXTENSIONS: &[&str] = &[
    // compiled / generated
    "pyc", "pyo", "class", "o", "obj", "so", "dll", "dylib", "a", "lib", "exe", "wasm", "map",
    // media
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "tiff", "webp", "svg", "mp3", "wav", "ogg", "mp4",
    "avi", "mov", "mkv", "webm",
    // fonts
    "woff", "woff2", "ttf", "otf", "eot",
    // archives and bundles
    "zip", "tar", "gz", "bz2", "xz", "7z", "rar", "jar", "war",
    // misc artifacts
    "pdf", "lock", "bin",
];

/// Directory names (or glob patterns) excluded from rendered trees
pub(crate) const IGNORED_DIRECTORIES: &[&str] = &[
    "node_modules",
    "bower_components",
    "dist",
    "build",
    "out",
    "target",
    "vendor",
    "third_party",
    "venv",
    ".venv",
    "__pycache__",
    ".git",
    ".hg",
    ".svn",
    ".idea",
    ".vscode",
    ".next",
    ".nuxt",
    ".cache",
    ".tox",
    ".gradle",
    ".pytest_cache",
    ".mypy_cache",
    "coverage",
    "Pods",
    "*.egg-info",
];

static DIRECTORY_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    IGNORED_DIRECTORIES
        .iter()
        .filter(|entry| entry.contains(['*', '?', '[']))
        .filter_map(|entry| Pattern::new(entry).ok())
        .collect()
});

/// Whether a file name matches the extension denylist
pub(crate) fn is_ignored_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    match lower.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => IGNORED_EXTENSIONS.contains(&ext),
        _ => false,
    }
}

/// Whether a directory name matches the directory denylist
pub(crate) fn is_ignored_directory(name: &str) -> bool {
    IGNORED_DIRECTORIES.contains(&name)
        || DIRECTORY_PATTERNS.iter().any(|p| p.matches(name))
}
