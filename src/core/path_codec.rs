/*
 * Converts between absolute paths and paths expressed relative to the
 * directory of a ledger file. Ledgers store relative paths so that a project
 * folder can be moved or checked out elsewhere without invalidating them.
 *
 * Stored paths may use either `/` or `\` as separator; both are accepted when
 * resolving. Paths that cannot be expressed relatively (another drive or root)
 * are stored and returned unchanged in absolute form.
 */
use std::path::{Component, MAIN_SEPARATOR, Path, PathBuf};

/*
 * Resolves the directory that relative paths are measured from. A base file
 * without a directory component falls back to the current working directory,
 * and a relative directory is anchored there as well.
 */
fn base_directory(base_file_path: &Path) -> PathBuf {
    let parent = base_file_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf);

    let cwd = || std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match parent {
        Some(dir) if dir.is_absolute() => normalize_lexically(&dir),
        Some(dir) => normalize_lexically(&cwd().join(dir)),
        None => {
            log::trace!(
                "PathCodec: {base_file_path:?} has no directory component, using working directory."
            );
            cwd()
        }
    }
}

// Prefix (drive) on Windows, root dir elsewhere.
fn shares_root(a: &Path, b: &Path) -> bool {
    a.components().next() == b.components().next()
}

/*
 * Removes `.` components and folds `..` into the preceding component without
 * touching the file system. A `..` that would climb above the root is dropped.
 */
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/*
 * Rewrites foreign separators into the native one. Ledgers written on Windows
 * carry backslashes, which are ordinary file name characters elsewhere.
 */
fn with_native_separators(stored_path: &str) -> PathBuf {
    if MAIN_SEPARATOR == '/' {
        PathBuf::from(stored_path.replace('\\', "/"))
    } else {
        PathBuf::from(stored_path.replace('/', "\\"))
    }
}

/*
 * Expresses `absolute_path` relative to the directory containing
 * `base_file_path`. Relative inputs and paths on another root are returned
 * as-is so that `to_absolute` can restore them unchanged.
 */
pub fn to_relative(absolute_path: &Path, base_file_path: &Path) -> PathBuf {
    if !absolute_path.is_absolute() {
        return absolute_path.to_path_buf();
    }
    let base_dir = base_directory(base_file_path);
    if !shares_root(absolute_path, &base_dir) {
        log::debug!(
            "PathCodec: {absolute_path:?} is on a different root than {base_dir:?}, keeping it absolute."
        );
        return absolute_path.to_path_buf();
    }

    let relative = pathdiff::diff_paths(absolute_path, &base_dir)
        .unwrap_or_else(|| absolute_path.to_path_buf());
    if relative.as_os_str().is_empty() {
        // The path is the base directory itself.
        PathBuf::from(".")
    } else {
        relative
    }
}

/*
 * Resolves a stored path against the directory of `base_file_path` and
 * normalises the result. Absolute stored paths are only normalised. The
 * stored text is taken verbatim; spaces are legal in file names.
 */
pub fn to_absolute(stored_path: &str, base_file_path: &Path) -> PathBuf {
    let stored = with_native_separators(stored_path);
    if stored.is_absolute() {
        return normalize_lexically(&stored);
    }
    normalize_lexically(&base_directory(base_file_path).join(stored))
}
