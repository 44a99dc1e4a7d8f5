//! Text/binary classification by file extension.
//!
//! Binary files are never tokenized and always count as zero tokens.
//! Classification is purely extension-based; unknown extensions and files
//! without an extension are treated as text.

use std::path::Path;

/// Extensions that are always skipped: images, documents, archives,
/// executables, media and fonts.
pub const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg", "webp", "tiff", //
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", //
    "zip", "rar", "7z", "tar", "gz", "bz2", "xz", //
    "exe", "dll", "so", "dylib", "bin", "o", "a", "class", "wasm", //
    "mp3", "mp4", "avi", "mov", "wmv", "wav", "flac", "ogg", //
    "woff", "woff2", "ttf", "eot", "otf",
];

/// Extensions known to hold text.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "vue", "svelte", //
    "py", "rb", "php", "go", "rs", "java", "kt", "scala", "dart", //
    "c", "cpp", "h", "hpp", "cs", "swift", //
    "html", "htm", "css", "scss", "sass", "less", //
    "json", "xml", "yaml", "yml", "toml", //
    "md", "mdx", "txt", "rst", "tex", //
    "sql", "sh", "bash", "zsh", "fish", //
    "dockerfile", "gitignore", "gitattributes", //
    "env", "config", "ini",
];

/// Classification of a file for token counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    /// Extension is on the text allow-list.
    Text,
    /// Extension is unknown or missing; counted as text.
    Unknown,
    /// Extension is on the binary deny-list.
    Binary,
}

impl FileClass {
    /// Whether files of this class are tokenized.
    pub fn is_countable(self) -> bool {
        !matches!(self, FileClass::Binary)
    }
}

/// Lowercased extension of `path`, if any.
///
/// Dotfiles such as `.gitignore` use the name after the dot, matching how
/// the allow-list spells them.
pub fn extension_of(path: &Path) -> Option<String> {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        return Some(ext.to_lowercase());
    }

    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix('.'))
        .filter(|rest| !rest.is_empty() && !rest.contains('.'))
        .map(str::to_lowercase)
}

/// Classify a file by its extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use ttree::filter::{classify, FileClass};
///
/// assert_eq!(classify(Path::new("src/main.rs")), FileClass::Text);
/// assert_eq!(classify(Path::new("logo.PNG")), FileClass::Binary);
/// assert_eq!(classify(Path::new("Makefile")), FileClass::Unknown);
/// ```
pub fn classify(path: &Path) -> FileClass {
    match extension_of(path) {
        Some(ext) if BINARY_EXTENSIONS.contains(&ext.as_str()) => FileClass::Binary,
        Some(ext) if TEXT_EXTENSIONS.contains(&ext.as_str()) => FileClass::Text,
        _ => FileClass::Unknown,
    }
}

/// Whether a file should be tokenized.
pub fn is_text_file(path: &Path) -> bool {
    classify(path).is_countable()
}
