use std::path::{Path, PathBuf};

/// Upper-cases the first character, e.g. a Windows drive letter.
pub fn uppercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn uppercase_first_path(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(uppercase_first(s)),
        None => path.to_path_buf(),
    }
}

/// Directory of the running binary, or the current directory if that is unknown.
pub fn app_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_bbdown_path() -> PathBuf {
    app_dir()
        .join("tools")
        .join(format!("BBDown{}", std::env::consts::EXE_SUFFIX))
}

pub fn default_download_dir() -> PathBuf {
    uppercase_first_path(&app_dir().join("download"))
}
