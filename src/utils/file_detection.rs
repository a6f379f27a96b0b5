//! Cheap binary-file heuristics used before and after reading content.

/// Extensions (and a few whole file names) that are never read as text.
///
/// Entries are lower-case; lookups lower-case the file name first.
const BINARY_EXTENSIONS: &[&str] = &[
    // images
    ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".tiff", ".ico", ".webp",
    // documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt", ".ods", ".odp",
    // archives and disk images
    ".zip", ".tar", ".gz", ".rar", ".7z", ".bz2", ".iso", ".dmg",
    // executables and libraries
    ".exe", ".dll", ".so", ".dylib", ".app", ".bin", ".msi",
    // audio and video
    ".mp3", ".wav", ".ogg", ".flac", ".aac", ".mp4", ".avi", ".mov", ".webm", ".mkv", ".wmv",
    // bytecode
    ".class", ".jar", ".pyc", ".pyd",
    // lockfiles
    ".lock", ".lockb",
    // fonts
    ".woff", ".woff2", ".ttf", ".otf", ".eot",
    // databases
    ".sqlite", ".db", ".mdb",
    // whole names
    ".ds_store", "thumbs.db",
];

/// Returns true if the file name's extension marks it as binary.
///
/// The extension is the last dot segment. Names without one (or dot-files such
/// as `.DS_Store`) are looked up whole.
pub fn is_likely_binary_by_extension(file_name: &str) -> bool {
    if file_name.is_empty() {
        return false;
    }
    let lower = file_name.to_lowercase();
    match lower.rfind('.') {
        Some(idx) if idx >= 1 && idx < lower.len() - 1 => BINARY_EXTENSIONS.contains(&&lower[idx..]),
        _ => BINARY_EXTENSIONS.contains(&lower.as_str()),
    }
}

/// NUL bytes do not occur in text files we care about.
pub fn contains_null_byte(bytes: &[u8]) -> bool {
    bytes.contains(&0)
}
