/*
 * The narrow capability through which the core mutates a live project model.
 * Enumerating, adding and removing references belongs to the hosting IDE;
 * the core only decides what to ask for and records the outcome. Hosts
 * implement `ReferenceHostOperations`; tests implement it with in-memory
 * mocks.
 */
use super::project_context::ProjectContext;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum HostError {
    ProjectUnavailable(String),
    Enumeration(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::ProjectUnavailable(name) => {
                write!(f, "Project is not available in the host: {name}")
            }
            HostError::Enumeration(msg) => write!(f, "Failed to enumerate references: {msg}"),
        }
    }
}

impl std::error::Error for HostError {}

pub type Result<T> = std::result::Result<T, HostError>;

/*
 * A reference as the host reports it. `owner_project_name` is set for project
 * references and names the referenced project.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceHandle {
    pub name: String,
    pub resolved_path: PathBuf,
    pub owner_project_name: Option<String>,
}

impl ReferenceHandle {
    pub fn file(name: impl Into<String>, resolved_path: impl Into<PathBuf>) -> Self {
        ReferenceHandle {
            name: name.into(),
            resolved_path: resolved_path.into(),
            owner_project_name: None,
        }
    }

    pub fn project(
        name: impl Into<String>,
        resolved_path: impl Into<PathBuf>,
        owner_project_name: impl Into<String>,
    ) -> Self {
        ReferenceHandle {
            name: name.into(),
            resolved_path: resolved_path.into(),
            owner_project_name: Some(owner_project_name.into()),
        }
    }

    pub fn is_project_reference(&self) -> bool {
        self.owner_project_name.is_some()
    }
}

pub trait ReferenceHostOperations: Send + Sync {
    /*
     * Enumerates the references of a live project.
     *
     * Args:
     *   project: The project whose references are listed.
     *
     * Returns:
     *   Every reference with its resolved path; project references carry
     *   `owner_project_name`. `HostError` when the project is not loaded or
     *   cannot be enumerated.
     */
    fn list_references(&self, project: &ProjectContext) -> Result<Vec<ReferenceHandle>>;

    /// Returns `true` when the reference is gone afterwards, including when it was already absent.
    fn remove_reference(&self, project: &ProjectContext, reference: &ReferenceHandle) -> bool;

    /*
     * Args:
     *   project: The project to modify.
     *   target_project_path: Absolute path of the project file to reference.
     *
     * Returns:
     *   `true` if the project reference was added.
     */
    fn add_project_reference(&self, project: &ProjectContext, target_project_path: &Path) -> bool;

    /*
     * Adds a file reference. Returns `true` without side effects when a
     * reference with exactly this path is already present.
     */
    fn add_file_reference(&self, project: &ProjectContext, assembly_path: &Path) -> bool;

    /// Fire and forget; callers do not wait for the save to complete.
    fn save_project(&self, project: &ProjectContext);
}
