//! Platform-specific paths for saved graphs and configuration.
//!
//! - **User config**: `~/.config/lumen/` (Linux), `~/Library/Application Support/lumen/` (macOS), `%APPDATA%\lumen\` (Windows)
//! - **Saved graphs**: the `graphs/` subdirectory of the user config directory
//!
//! ```rust,no_run
//! use lumen_config::paths;
//!
//! if let Some(path) = paths::find_graph("stage") {
//!     println!("Found graph at: {:?}", path);
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Application name used for directory paths.
pub const APP_NAME: &str = "lumen";

/// Subdirectory name for saved graphs.
const GRAPHS_SUBDIR: &str = "graphs";

/// Engine configuration file name inside the user config directory.
pub const CONFIG_FILE: &str = "lumen.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_NAME)
}

/// Returns the directory saved graph snapshots live in.
pub fn user_graphs_dir() -> PathBuf {
    user_config_dir().join(GRAPHS_SUBDIR)
}

/// Returns the default engine configuration file path.
pub fn default_config_file() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

/// Find a saved graph by name or path.
///
/// `name` may be a path to an existing file, or a graph name (with or
/// without `.json`) looked up in [`user_graphs_dir`].
pub fn find_graph(name: &str) -> Option<PathBuf> {
    find_graph_in(name, &user_graphs_dir())
}

fn find_graph_in(name: &str, dir: &Path) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if name.ends_with(".json") {
        name.to_string()
    } else {
        format!("{name}.json")
    };
    let candidate = dir.join(filename);
    candidate.is_file().then_some(candidate)
}

/// Ensure the saved graphs directory exists.
pub fn ensure_user_graphs_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_graphs_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// Lists saved graph files, sorted by path.
///
/// Returns an empty vector if the directory doesn't exist or can't be read.
pub fn list_user_graphs() -> Vec<PathBuf> {
    list_graphs_in_dir(&user_graphs_dir())
}

fn list_graphs_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut graphs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    graphs.sort();
    graphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn dirs_contain_app_name() {
        assert!(user_config_dir().to_string_lossy().contains(APP_NAME));
        assert!(user_graphs_dir().ends_with(GRAPHS_SUBDIR));
        assert!(default_config_file().ends_with(CONFIG_FILE));
    }

    #[test]
    fn find_graph_by_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("stage.json");
        fs::write(&path, "{}").unwrap();
        assert_eq!(find_graph(path.to_str().unwrap()), Some(path));
    }

    #[test]
    fn find_graph_adds_extension() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("stage.json"), "{}").unwrap();
        let found = find_graph_in("stage", temp_dir.path()).unwrap();
        assert!(found.ends_with("stage.json"));
        assert!(find_graph_in("stage.json", temp_dir.path()).is_some());
        assert!(find_graph_in("other", temp_dir.path()).is_none());
    }

    #[test]
    fn list_only_json() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.json"), "").unwrap();
        fs::write(temp_dir.path().join("a.json"), "").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "").unwrap();
        let graphs = list_graphs_in_dir(temp_dir.path());
        assert_eq!(graphs.len(), 2);
        assert!(graphs[0].ends_with("a.json"));
    }

    #[test]
    fn list_missing_dir_is_empty() {
        assert!(list_graphs_in_dir(Path::new("/nonexistent/lumen/graphs/12345")).is_empty());
    }
}
