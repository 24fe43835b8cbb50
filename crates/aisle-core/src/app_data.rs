//! Where Aisle keeps its own data (config and the pre-built indices).
//!
//! Indices are built elsewhere and dropped into `indices/`; we only read them.

use std::path::PathBuf;

/// Subdirectory of the app data dir holding the FAQ and product indices.
pub const INDICES_DIR_NAME: &str = "indices";

/// Returns the directory where Aisle stores config and indices.
/// On macOS: `~/Library/Application Support/Aisle/`.
/// Creates the directory if it doesn't exist; returns `None` if we can't determine the path.
pub fn app_data_dir() -> Option<PathBuf> {
    let dir = directories::ProjectDirs::from("app", "Aisle", "Aisle")?.data_local_dir().to_path_buf();
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Default location of the index files when the config doesn't name one.
pub fn default_indices_dir() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(INDICES_DIR_NAME))
}
