//! Canonical file paths for the data directory.
//!
//! Paths default to `data/` under the project root (see
//! [`project_root`]); set `SHOOTING_MAP_DATA_DIR` to relocate it.

use std::path::{Path, PathBuf};

/// Environment variable overriding [`data_dir`].
pub const DATA_DIR_ENV: &str = "SHOOTING_MAP_DATA_DIR";

/// File name of the incident snapshot.
pub const SNAPSHOT_FILE: &str = "shootings.csv";

/// Returns the workspace root directory.
///
/// This is the workspace the binary was built from when that checkout
/// still exists on this machine (`cargo run`, tests). A binary copied
/// elsewhere uses the current directory instead, so its cache lands in
/// `./data`.
#[must_use]
pub fn project_root() -> PathBuf {
    build_root()
        .filter(|root| root.join("Cargo.toml").is_file())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn build_root() -> Option<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map(Path::to_path_buf)
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map_or_else(|| project_root().join("data"), PathBuf::from)
}

/// Returns the path of the incident snapshot.
#[must_use]
pub fn snapshot_path() -> PathBuf {
    data_dir().join(SNAPSHOT_FILE)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_lives_in_data_dir() {
        assert_eq!(snapshot_path().parent(), Some(data_dir().as_path()));
        assert!(snapshot_path().ends_with(SNAPSHOT_FILE));
    }

    #[test]
    fn project_root_is_the_checkout_when_present() {
        let root = project_root();
        assert!(root.join("Cargo.toml").is_file());
        assert_eq!(Some(root), build_root());
    }

    #[test]
    fn ensure_dir_creates_nested_directories() {
        let dir = std::env::temp_dir()
            .join(format!("shooting_map_paths_{}", std::process::id()))
            .join("a/b");
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
        ensure_dir(&dir).unwrap();
        std::fs::remove_dir_all(dir.parent().unwrap().parent().unwrap()).ok();
    }
}
