/*
 * Domain object representing one build project on disk. It centralizes the
 * ledger file naming (`Name.nugetreferenceswitcher` next to `Name.csproj`,
 * plus the `.previous` variant) so that callers use semantic resolvers
 * instead of hand-built paths. The same value is handed to the reference
 * host to identify the project whose references are being switched.
 */
use super::transformation::Generation;
use std::path::{Path, PathBuf};

pub const CURRENT_LEDGER_SUFFIX: &str = ".nugetreferenceswitcher";
pub const PREVIOUS_LEDGER_SUFFIX: &str = ".previous.nugetreferenceswitcher";

/*
 * Opaque handle to a project file. It wraps the project file path and a
 * display name, and exposes the ledger paths derived from them.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    file_path: PathBuf,
    name: String,
}

impl ProjectContext {
    /// Uses the file stem of `file_path` as display name.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        let name = file_stem_of(&file_path);
        ProjectContext { file_path, name }
    }

    pub fn with_name(file_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        ProjectContext {
            file_path: file_path.into(),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn resolve_current_ledger(&self) -> PathBuf {
        self.resolve_ledger_with_suffix(CURRENT_LEDGER_SUFFIX)
    }

    pub fn resolve_previous_ledger(&self) -> PathBuf {
        self.resolve_ledger_with_suffix(PREVIOUS_LEDGER_SUFFIX)
    }

    pub fn resolve_ledger(&self, generation: Generation) -> PathBuf {
        match generation {
            Generation::Current => self.resolve_current_ledger(),
            Generation::Previous => self.resolve_previous_ledger(),
        }
    }

    fn resolve_ledger_with_suffix(&self, suffix: &str) -> PathBuf {
        let stem = file_stem_of(&self.file_path);
        let file_name = format!("{stem}{suffix}");
        match self.file_path.parent() {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }
}

fn file_stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
