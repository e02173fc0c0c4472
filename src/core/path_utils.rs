/*
 * Locates the per-user directories the switcher keeps its own files in:
 * settings and log files. Ledgers are not stored here; they live next to the
 * project they describe (see `project_context`).
 */
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const LOG_SUBFOLDER_NAME: &str = "logs";

fn ensure_dir(path: &Path) -> Option<PathBuf> {
    if !path.exists() {
        if let Err(e) = fs::create_dir_all(path) {
            log::error!("PathUtils: Failed to create directory {path:?}: {e}");
            return None;
        }
        log::debug!("PathUtils: Created directory: {path:?}");
    }
    Some(path.to_path_buf())
}

/*
 * Retrieves the application's local (non-roaming) configuration directory,
 * creating it if necessary. Returns `None` when the platform offers no such
 * directory or it cannot be created.
 */
pub fn get_base_app_config_local_dir(app_name: &str) -> Option<PathBuf> {
    log::trace!("PathUtils: Resolving config local dir for '{app_name}'");
    ProjectDirs::from("", "", app_name).and_then(|dirs| ensure_dir(dirs.config_local_dir()))
}

/// `<config local dir>/logs`, created on demand.
pub fn get_log_dir(app_name: &str) -> Option<PathBuf> {
    let base = get_base_app_config_local_dir(app_name)?;
    ensure_dir(&base.join(LOG_SUBFOLDER_NAME))
}
