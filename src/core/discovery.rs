/*
 * Finds ledger files below a directory, typically a solution folder, so a host
 * can offer to switch every project back at once. Ledger files are matched by
 * suffix only; the owning project file is not required to exist.
 */
use super::project_context::{CURRENT_LEDGER_SUFFIX, PREVIOUS_LEDGER_SUFFIX};
use super::transformation::Generation;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredLedger {
    pub ledger_path: PathBuf,
    pub generation: Generation,
    /// File name of the owning project without extension.
    pub project_stem: String,
}

/*
 * The previous suffix ends with the current suffix, so it has to be tested
 * first or `App.previous.nugetreferenceswitcher` would read as the current
 * ledger of a project called `App.previous`.
 */
fn classify_ledger_file(file_name: &str) -> Option<(Generation, &str)> {
    if let Some(stem) = file_name.strip_suffix(PREVIOUS_LEDGER_SUFFIX) {
        return (!stem.is_empty()).then_some((Generation::Previous, stem));
    }
    file_name
        .strip_suffix(CURRENT_LEDGER_SUFFIX)
        .filter(|stem| !stem.is_empty())
        .map(|stem| (Generation::Current, stem))
}

/// Sorted by path. Unreadable subdirectories are logged and skipped.
pub fn find_ledgers(root: &Path) -> walkdir::Result<Vec<DiscoveredLedger>> {
    log::trace!("LedgerDiscovery: Scanning {root:?} for ledgers");
    let mut found = Vec::new();

    for entry_result in WalkDir::new(root).follow_links(false) {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                log::warn!("LedgerDiscovery: Skipping unreadable entry: {e}");
                continue;
            }
            Err(e) => return Err(e),
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy();
        if let Some((generation, stem)) = classify_ledger_file(&file_name) {
            found.push(DiscoveredLedger {
                ledger_path: entry.path().to_path_buf(),
                generation,
                project_stem: stem.to_string(),
            });
        }
    }

    found.sort_by(|a, b| a.ledger_path.cmp(&b.ledger_path));
    log::debug!(
        "LedgerDiscovery: Found {} ledgers under {root:?}.",
        found.len()
    );
    Ok(found)
}
