/*
 * This module persists ledgers: ordered lists of `TransformationRecord`s kept
 * next to the owning project file. The format is line oriented, one record per
 * line with four tab-separated fields:
 *
 *   <projectName>\t<relativeProjectPath>\t<relativeBinaryPath>\t<True|False>
 *
 * Paths are stored relative to the ledger file (see `path_codec`). Parsing is
 * tolerant towards partial lines, which are skipped and reported, but strict
 * about the boolean field, whose corruption fails the whole load.
 *
 * It includes a trait for ledger operations (`LedgerStoreOperations`) to
 * facilitate testing and dependency injection, and a concrete implementation
 * (`CoreLedgerStore`) working against the real file system.
 */
use super::path_codec;
use super::transformation::TransformationRecord;
use atomicwrites::{AllowOverwrite, AtomicFile};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const FIELD_SEPARATOR: char = '\t';
const FIELDS_PER_RECORD: usize = 4;

#[derive(Debug)]
pub enum LedgerError {
    Io(io::Error),
    MalformedEntry {
        path: PathBuf,
        line: usize,
        value: String,
    },
    EmptyPath {
        field: &'static str,
    },
    InvalidCharacter {
        field: &'static str,
        value: String,
    },
}

impl From<io::Error> for LedgerError {
    fn from(err: io::Error) -> Self {
        LedgerError::Io(err)
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::Io(e) => write!(f, "Ledger I/O error: {e}"),
            LedgerError::MalformedEntry { path, line, value } => write!(
                f,
                "Malformed ledger entry in {path:?} at line {line}: '{value}' is not a boolean"
            ),
            LedgerError::EmptyPath { field } => {
                write!(f, "Transformation record field '{field}' must not be empty")
            }
            LedgerError::InvalidCharacter { field, value } => write!(
                f,
                "Transformation record field '{field}' contains a tab or line break: {value:?}"
            ),
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Why a ledger line was left out of the loaded ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    FieldCount(usize),
    EmptyPath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based.
    pub line_number: usize,
    pub reason: SkipReason,
}

/*
 * Result of parsing a ledger: the accepted records in file order, plus the
 * lines that were skipped so callers can surface diagnostics.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLedger {
    pub records: Vec<TransformationRecord>,
    pub skipped: Vec<SkippedLine>,
}

/*
 * Parses a boolean the way the ledger format has always written it. The
 * canonical forms are `True` and `False`; casing and surrounding whitespace
 * are tolerated.
 */
fn parse_bool_literal(value: &str) -> Option<bool> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn render_bool_literal(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/*
 * Parses ledger text. `ledger_path` is the location the text was read from;
 * relative paths are resolved against its directory and it is quoted in
 * errors.
 */
pub fn parse_ledger(contents: &str, ledger_path: &Path) -> Result<ParsedLedger> {
    let mut parsed = ParsedLedger::default();

    for (index, line) in contents.lines().enumerate() {
        let line_number = index + 1;
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if fields.len() != FIELDS_PER_RECORD {
            parsed.skipped.push(SkippedLine {
                line_number,
                reason: SkipReason::FieldCount(fields.len()),
            });
            continue;
        }

        let removed =
            parse_bool_literal(fields[3]).ok_or_else(|| LedgerError::MalformedEntry {
                path: ledger_path.to_path_buf(),
                line: line_number,
                value: fields[3].to_string(),
            })?;

        if fields[1].is_empty() || fields[2].is_empty() {
            parsed.skipped.push(SkippedLine {
                line_number,
                reason: SkipReason::EmptyPath,
            });
            continue;
        }

        let record = TransformationRecord::new(
            fields[0],
            path_codec::to_absolute(fields[1], ledger_path),
            path_codec::to_absolute(fields[2], ledger_path),
        )?
        .with_removed(removed);
        parsed.records.push(record);
    }

    Ok(parsed)
}

/*
 * Renders records in the ledger line format, relative to `ledger_path`.
 * Fails with `InvalidCharacter` rather than writing a record that would not
 * read back as the same single line.
 */
pub fn render_ledger(records: &[TransformationRecord], ledger_path: &Path) -> Result<String> {
    let mut out = String::new();
    for record in records {
        record.validate()?;
        let project = path_codec::to_relative(&record.project_path, ledger_path);
        let binary = path_codec::to_relative(&record.binary_path, ledger_path);
        out.push_str(&record.project_name);
        out.push(FIELD_SEPARATOR);
        out.push_str(&project.to_string_lossy());
        out.push(FIELD_SEPARATOR);
        out.push_str(&binary.to_string_lossy());
        out.push(FIELD_SEPARATOR);
        out.push_str(render_bool_literal(record.removed));
        out.push('\n');
    }
    Ok(out)
}

pub trait LedgerStoreOperations: Send + Sync {
    /*
     * Loads the ledger at `path`.
     *
     * Args:
     *   path: The ledger file. Relative paths inside it are resolved against
     *     its directory.
     *
     * Returns:
     *   The records in file order. A missing file yields an empty list.
     *   Partial lines are skipped and logged. A corrupt boolean field fails
     *   the whole load with `LedgerError::MalformedEntry`; any other I/O
     *   failure is `LedgerError::Io`.
     */
    fn load(&self, path: &Path) -> Result<Vec<TransformationRecord>>;

    /// Like `load`, but returns the skipped lines instead of logging them.
    fn load_with_diagnostics(&self, path: &Path) -> Result<ParsedLedger>;

    /*
     * Replaces the ledger at `path` with `records`. Readers see either the
     * old or the new content, never a mix.
     *
     * Args:
     *   path: The ledger file to write. Its directory must exist.
     *   records: Records in switch order; their paths are stored relative
     *     to `path`.
     *
     * Returns:
     *   `LedgerError::InvalidCharacter` if a record cannot be stored as one
     *   line (nothing is written), or `LedgerError::Io` on write failure.
     */
    fn save(&self, path: &Path, records: &[TransformationRecord]) -> Result<()>;

    /*
     * Promotes `current_path` to `previous_path`, discarding the old
     * previous generation. A no-op when there is no current ledger.
     *
     * Args:
     *   current_path: Ledger of the latest switch.
     *   previous_path: Destination; replaced if it already exists.
     *
     * Returns:
     *   `Ok(())` on success or when there was nothing to rotate.
     *   File-system errors other than "not found" are propagated.
     */
    fn rotate(&self, current_path: &Path, previous_path: &Path) -> Result<()>;
}

pub struct CoreLedgerStore {}

impl CoreLedgerStore {
    pub fn new() -> Self {
        CoreLedgerStore {}
    }
}

impl Default for CoreLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStoreOperations for CoreLedgerStore {
    fn load(&self, path: &Path) -> Result<Vec<TransformationRecord>> {
        let parsed = self.load_with_diagnostics(path)?;
        for skipped in &parsed.skipped {
            log::warn!(
                "CoreLedgerStore: Skipped line {} in {path:?}: {:?}",
                skipped.line_number,
                skipped.reason
            );
        }
        Ok(parsed.records)
    }

    fn load_with_diagnostics(&self, path: &Path) -> Result<ParsedLedger> {
        log::trace!("CoreLedgerStore: Loading ledger {path:?}");
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("CoreLedgerStore: Ledger {path:?} does not exist, treating as empty.");
                return Ok(ParsedLedger::default());
            }
            Err(e) => {
                log::error!("CoreLedgerStore: Failed to read ledger {path:?}: {e}");
                return Err(LedgerError::Io(e));
            }
        };
        let parsed = parse_ledger(&contents, path)?;
        log::debug!(
            "CoreLedgerStore: Loaded {} records from {path:?} ({} lines skipped).",
            parsed.records.len(),
            parsed.skipped.len()
        );
        Ok(parsed)
    }

    fn save(&self, path: &Path, records: &[TransformationRecord]) -> Result<()> {
        log::trace!(
            "CoreLedgerStore: Saving {} records to {path:?}",
            records.len()
        );
        let contents = render_ledger(records, path)?;

        let write_result = AtomicFile::new(path, AllowOverwrite)
            .write(|f| f.write_all(contents.as_bytes()))
            .map_err(|e| match e {
                atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => e,
            });

        if let Err(e) = write_result {
            log::error!("CoreLedgerStore: Failed to save ledger {path:?}: {e}");
            return Err(LedgerError::Io(e));
        }

        log::debug!(
            "CoreLedgerStore: Saved {} records to {path:?}.",
            records.len()
        );
        Ok(())
    }

    /*
     * The old previous generation is deleted only after the current ledger
     * is known to exist. A crash between the delete and the rename loses the
     * previous generation but never the current one.
     */
    fn rotate(&self, current_path: &Path, previous_path: &Path) -> Result<()> {
        if !current_path.try_exists()? {
            log::trace!("CoreLedgerStore: No ledger at {current_path:?}, nothing to rotate.");
            return Ok(());
        }

        match fs::remove_file(previous_path) {
            Ok(()) => {
                log::debug!("CoreLedgerStore: Deleted previous ledger {previous_path:?}.")
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(LedgerError::Io(e)),
        }
        fs::rename(current_path, previous_path)?;
        log::debug!("CoreLedgerStore: Rotated {current_path:?} to {previous_path:?}.");
        Ok(())
    }
}

#[cfg(test)]
mod ledger_store_tests {
    use super::*;
    use tempfile::TempDir;

    fn record(dir: &Path, name: &str, removed: bool) -> TransformationRecord {
        TransformationRecord::new(
            name,
            dir.join(name).join(format!("{name}.csproj")),
            dir.join(name).join("bin").join(format!("{name}.dll")),
        )
        .expect("valid record")
        .with_removed(removed)
    }

    fn ledger_path(dir: &Path) -> PathBuf {
        dir.join("App").join("App.nugetreferenceswitcher")
    }

    #[test]
    fn test_load_missing_file_is_empty() -> Result<()> {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let store = CoreLedgerStore::new();

        let records = store.load(&ledger_path(temp_dir.path()))?;
        assert!(records.is_empty());
        Ok(())
    }

    #[test]
    fn test_save_and_load_round_trip() -> Result<()> {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("App")).expect("Failed to create project dir");
        let path = ledger_path(root);
        let store = CoreLedgerStore::new();

        let original = vec![
            record(root, "Lib", true),
            record(root, "Core", false),
            record(root, "Util", true),
        ];
        store.save(&path, &original)?;

        let loaded = store.load(&path)?;
        assert_eq!(loaded, original);
        Ok(())
    }

    #[test]
    fn test_saved_file_uses_relative_paths_and_literals() -> Result<()> {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("App")).expect("Failed to create project dir");
        let path = ledger_path(root);
        let store = CoreLedgerStore::new();

        store.save(&path, &[record(root, "Lib", true)])?;

        let contents = fs::read_to_string(&path)?;
        let fields: Vec<&str> = contents.trim_end().split('\t').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], "Lib");
        assert_eq!(
            PathBuf::from(fields[1]),
            PathBuf::from("..").join("Lib").join("Lib.csproj")
        );
        assert_eq!(fields[3], "True");

        let entries: Vec<_> = fs::read_dir(root.join("App"))?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("App.nugetreferenceswitcher")]);
        Ok(())
    }

    #[test]
    fn test_save_overwrites_existing_ledger() -> Result<()> {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("App")).expect("Failed to create project dir");
        let path = ledger_path(root);
        let store = CoreLedgerStore::new();

        store.save(&path, &[record(root, "Lib", true), record(root, "Core", true)])?;
        let replacement = vec![record(root, "Util", false)];
        store.save(&path, &replacement)?;

        assert_eq!(store.load(&path)?, replacement);
        Ok(())
    }

    #[test]
    fn test_record_with_separator_character_is_not_saved() -> Result<()> {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("App")).expect("Failed to create project dir");
        let path = ledger_path(root);
        let store = CoreLedgerStore::new();
        let existing = vec![record(root, "Lib", true)];
        store.save(&path, &existing)?;

        let mut tabbed = record(root, "Core", true);
        tabbed.project_name = "My\tCore".to_string();
        let mut broken = record(root, "Util", true);
        broken.binary_path = root.join("Util").join("bin\nUtil.dll");

        for bad in [tabbed, broken] {
            let result = store.save(&path, &[record(root, "Other", false), bad]);
            assert!(
                matches!(result, Err(LedgerError::InvalidCharacter { .. })),
                "Expected InvalidCharacter, got {result:?}"
            );
        }
        assert_eq!(store.load(&path)?, existing);
        Ok(())
    }

    #[test]
    fn test_spaces_in_paths_survive_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let root = temp_dir.path();
        fs::create_dir_all(root.join("App")).expect("Failed to create project dir");
        let path = ledger_path(root);
        let store = CoreLedgerStore::new();

        let spaced = TransformationRecord::new(
            " My Lib ",
            root.join("My Lib").join("Lib.csproj "),
            root.join("My Lib").join("bin").join(" Lib.dll"),
        )?
        .with_removed(true);
        store.save(&path, std::slice::from_ref(&spaced))?;

        assert_eq!(store.load(&path)?, vec![spaced]);
        Ok(())
    }

    #[test]
    fn test_partial_lines_are_skipped_in_order() -> Result<()> {
        let path = PathBuf::from("/work/App/App.nugetreferenceswitcher");
        let contents = "A\t../A/A.csproj\t../A/A.dll\tTrue\n\
                        garbage line\n\
                        B\t../B/B.csproj\n\
                        \n\
                        C\t../C/C.csproj\t../C/C.dll\tFalse\textra\n\
                        D\t../D/D.csproj\t../D/D.dll\tfalse\n";

        let parsed = parse_ledger(contents, &path)?;

        let names: Vec<&str> = parsed
            .records
            .iter()
            .map(|r| r.project_name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "D"]);
        assert!(parsed.records[0].removed);
        assert!(!parsed.records[1].removed);
        assert_eq!(
            parsed.skipped,
            vec![
                SkippedLine {
                    line_number: 2,
                    reason: SkipReason::FieldCount(1)
                },
                SkippedLine {
                    line_number: 3,
                    reason: SkipReason::FieldCount(2)
                },
                SkippedLine {
                    line_number: 4,
                    reason: SkipReason::FieldCount(1)
                },
                SkippedLine {
                    line_number: 5,
                    reason: SkipReason::FieldCount(5)
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_malformed_boolean_fails_the_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let path = temp_dir.path().join("App.nugetreferenceswitcher");
        fs::write(
            &path,
            "A\tA.csproj\tA.dll\tTrue\nB\tB.csproj\tB.dll\tmaybe\n",
        )
        .expect("Failed to write ledger");
        let store = CoreLedgerStore::new();

        match store.load(&path) {
            Err(LedgerError::MalformedEntry { line, value, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(value, "maybe");
            }
            other => panic!("Expected MalformedEntry, got {other:?}"),
        }
    }

    #[test]
    fn test_crlf_line_endings_are_accepted() -> Result<()> {
        let path = PathBuf::from("/work/App/App.nugetreferenceswitcher");
        let parsed = parse_ledger("A\tA.csproj\tA.dll\tTrue\r\n", &path)?;
        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.records[0].removed);
        Ok(())
    }

    #[test]
    fn test_rotate_then_save_keeps_previous_generation() -> Result<()> {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let root = temp_dir.path();
        let current = root.join("App.nugetreferenceswitcher");
        let previous = root.join("App.previous.nugetreferenceswitcher");
        let store = CoreLedgerStore::new();

        let first = vec![record(root, "Lib", true)];
        let second = vec![record(root, "Core", true)];
        let third = vec![record(root, "Util", false)];

        store.save(&current, &first)?;
        store.rotate(&current, &previous)?;
        store.save(&current, &second)?;
        assert_eq!(store.load(&previous)?, first);
        assert_eq!(store.load(&current)?, second);

        store.rotate(&current, &previous)?;
        store.save(&current, &third)?;
        assert_eq!(store.load(&previous)?, second);
        assert_eq!(store.load(&current)?, third);
        Ok(())
    }

    #[test]
    fn test_rotate_without_current_is_noop() -> Result<()> {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let root = temp_dir.path();
        let current = root.join("App.nugetreferenceswitcher");
        let previous = root.join("App.previous.nugetreferenceswitcher");
        let store = CoreLedgerStore::new();
        let kept = vec![record(root, "Lib", true)];
        store.save(&previous, &kept)?;

        store.rotate(&current, &previous)?;

        assert!(!current.exists());
        assert_eq!(store.load(&previous)?, kept);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_location_is_an_error_not_an_empty_ledger() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let not_a_dir = temp_dir.path().join("App");
        fs::write(&not_a_dir, "plain file").expect("Failed to write blocking file");
        let current = not_a_dir.join("App.nugetreferenceswitcher");
        let previous = not_a_dir.join("App.previous.nugetreferenceswitcher");
        let store = CoreLedgerStore::new();

        assert!(matches!(store.load(&current), Err(LedgerError::Io(_))));
        assert!(matches!(
            store.load_with_diagnostics(&current),
            Err(LedgerError::Io(_))
        ));
        assert!(matches!(
            store.rotate(&current, &previous),
            Err(LedgerError::Io(_))
        ));
    }

    #[test]
    fn test_save_into_missing_directory_is_io_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir for test");
        let path = temp_dir
            .path()
            .join("does_not_exist")
            .join("App.nugetreferenceswitcher");
        let store = CoreLedgerStore::new();

        let result = store.save(&path, &[record(temp_dir.path(), "Lib", true)]);
        assert!(matches!(result, Err(LedgerError::Io(_))));
    }
}
