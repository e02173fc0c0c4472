/*
 * The atomic unit of a ledger: one project reference that was replaced by a
 * binary reference, together with what is needed to undo the replacement.
 * Records are built in memory while a switch runs, persisted one per line by
 * the ledger store, and never mutated once written.
 */
use super::ledger_store::LedgerError;
use std::path::{Path, PathBuf};

const FORBIDDEN_CHARACTERS: [char; 3] = ['\t', '\n', '\r'];

/*
 * One project-to-binary substitution. Both paths are absolute in memory; the
 * ledger store converts them to relative form only while serialising.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationRecord {
    pub project_name: String,
    pub project_path: PathBuf,
    pub binary_path: PathBuf,
    pub removed: bool,
}

impl TransformationRecord {
    /*
     * Creates a record with `removed` unset.
     *
     * Args:
     *   project_name: Display name of the project reference being replaced.
     *   project_path: Absolute path of the replaced project file.
     *   binary_path: Absolute path of the binary that replaces it.
     *
     * Returns:
     *   The record, or `LedgerError::EmptyPath` / `LedgerError::InvalidCharacter`
     *   when a field could not be stored in a ledger.
     */
    pub fn new(
        project_name: impl Into<String>,
        project_path: impl Into<PathBuf>,
        binary_path: impl Into<PathBuf>,
    ) -> Result<Self, LedgerError> {
        let project_path = project_path.into();
        let binary_path = binary_path.into();
        if project_path.as_os_str().is_empty() {
            return Err(LedgerError::EmptyPath {
                field: "project_path",
            });
        }
        if binary_path.as_os_str().is_empty() {
            return Err(LedgerError::EmptyPath {
                field: "binary_path",
            });
        }
        let record = TransformationRecord {
            project_name: project_name.into(),
            project_path,
            binary_path,
            removed: false,
        };
        record.validate()?;
        Ok(record)
    }

    /*
     * Checks that every text field can be written as a single ledger field.
     * Tabs separate fields and line breaks separate records, so a value that
     * contains either would be split apart on the next load.
     *
     * Returns:
     *   `Ok(())` if the record is storable, or `LedgerError::InvalidCharacter`
     *   naming the first offending field.
     */
    pub fn validate(&self) -> Result<(), LedgerError> {
        let fields = [
            ("project_name", self.project_name.clone()),
            (
                "project_path",
                self.project_path.to_string_lossy().into_owned(),
            ),
            ("binary_path", self.binary_path.to_string_lossy().into_owned()),
        ];
        for (field, value) in fields {
            if value.contains(FORBIDDEN_CHARACTERS) {
                return Err(LedgerError::InvalidCharacter { field, value });
            }
        }
        Ok(())
    }

    /// Records the outcome of removing the original project reference.
    pub fn with_removed(mut self, removed: bool) -> Self {
        self.removed = removed;
        self
    }

    pub fn project_path(&self) -> &Path {
        &self.project_path
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

/*
 * Selects one of the two retained ledger snapshots for a project. `Current`
 * is written by the latest switch; `Previous` is the one before it.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Generation {
    Current,
    Previous,
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Generation::Current => write!(f, "current"),
            Generation::Previous => write!(f, "previous"),
        }
    }
}
