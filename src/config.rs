use std::path::PathBuf;

pub const APP_DIR_NAME: &str = "todo-planner";
pub const DATA_DIR_ENV: &str = "TODO_PLANNER_DATA_DIR";

/// Platform data directory (e.g. `~/.local/share/todo-planner`), or the
/// working directory when the platform reports none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// An explicit directory (flag or `TODO_PLANNER_DATA_DIR`) wins over the default.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(default_data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_directory_wins() {
        let dir = PathBuf::from("/tmp/planner-data");
        assert_eq!(resolve_data_dir(Some(dir.clone())), dir);
    }

    #[test]
    fn empty_or_missing_directory_uses_default() {
        assert_eq!(resolve_data_dir(None), default_data_dir());
        assert_eq!(resolve_data_dir(Some(PathBuf::new())), default_data_dir());
        assert!(default_data_dir().ends_with(APP_DIR_NAME));
    }
}
