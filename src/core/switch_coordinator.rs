/*
 * Orchestrates switching a project's references between project references
 * and binary references. The coordinator decides what to ask the reference
 * host for, records the outcome in a ledger, and persists that ledger as the
 * project's current generation.
 *
 * Individual add/remove failures never abort a batch. They are collected in
 * the returned `SwitchReport` and the ledger accumulated so far is still
 * written. Only ledger I/O and host enumeration errors are propagated.
 *
 * Callers must not run two switches for the same project concurrently; the
 * coordinator does not lock the ledger files.
 */
use super::classifier::{self, ClassifiedReferences};
use super::ledger_store::{LedgerError, LedgerStoreOperations};
use super::path_codec;
use super::project_context::ProjectContext;
use super::reference_host::{HostError, ReferenceHandle, ReferenceHostOperations};
use super::transformation::{Generation, TransformationRecord};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
pub enum SwitchError {
    Ledger(LedgerError),
    Host(HostError),
}

impl From<LedgerError> for SwitchError {
    fn from(err: LedgerError) -> Self {
        SwitchError::Ledger(err)
    }
}

impl From<HostError> for SwitchError {
    fn from(err: HostError) -> Self {
        SwitchError::Host(err)
    }
}

impl std::fmt::Display for SwitchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwitchError::Ledger(e) => write!(f, "Ledger error: {e}"),
            SwitchError::Host(e) => write!(f, "Reference host error: {e}"),
        }
    }
}

impl std::error::Error for SwitchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SwitchError::Ledger(e) => Some(e),
            SwitchError::Host(e) => Some(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, SwitchError>;

/*
 * One project reference selected for replacement. The binary that replaces
 * it is chosen by the caller; the coordinator never derives it.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySwitchRequest {
    pub reference: ReferenceHandle,
    pub project_path: PathBuf,
    pub binary_path: PathBuf,
}

impl BinarySwitchRequest {
    fn project_name(&self) -> &str {
        self.reference
            .owner_project_name
            .as_deref()
            .unwrap_or(&self.reference.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchStep {
    RemoveProjectReference,
    AddFileReference,
    RemoveFileReference,
    AddProjectReference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchFailure {
    pub project_name: String,
    pub step: SwitchStep,
    pub path: PathBuf,
}

/*
 * Summary of a batch. `records` holds the ledger written by a switch to
 * binaries, or the ledger that was replayed by a switch back to projects.
 * `failed` counts references with at least one failed step.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchReport {
    pub records: Vec<TransformationRecord>,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<SwitchFailure>,
}

impl SwitchReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }

    fn tally(&mut self, failures_before: usize) {
        if self.failures.len() > failures_before {
            self.failed += 1;
        } else {
            self.succeeded += 1;
        }
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    path_codec::normalize_lexically(a) == path_codec::normalize_lexically(b)
}

pub struct SwitchCoordinator {
    host: Arc<dyn ReferenceHostOperations>,
    ledger_store: Arc<dyn LedgerStoreOperations>,
}

impl SwitchCoordinator {
    pub fn new(
        host: Arc<dyn ReferenceHostOperations>,
        ledger_store: Arc<dyn LedgerStoreOperations>,
    ) -> Self {
        SwitchCoordinator { host, ledger_store }
    }

    /*
     * Lists the project's references through the host and splits them into
     * ordinary and packaged ones.
     *
     * Returns:
     *   The partition, or `SwitchError::Host` when enumeration fails.
     */
    pub fn classify_references(&self, project: &ProjectContext) -> Result<ClassifiedReferences> {
        let references = self.host.list_references(project)?;
        let classified = classifier::classify(references);
        log::debug!(
            "SwitchCoordinator: Project '{}' has {} ordinary and {} packaged references.",
            project.name(),
            classified.ordinary.len(),
            classified.packaged.len()
        );
        Ok(classified)
    }

    pub fn load_generation(
        &self,
        project: &ProjectContext,
        generation: Generation,
    ) -> Result<Vec<TransformationRecord>> {
        Ok(self.ledger_store.load(&project.resolve_ledger(generation))?)
    }

    /*
     * Replaces each requested project reference with its binary. The records
     * are validated before the host is touched, so an invalid request leaves
     * the project unchanged. The existing current ledger is rotated to
     * previous before the new one is saved.
     *
     * Args:
     *   project: The project being modified; its ledgers live beside it.
     *   requests: One entry per project reference to replace, in the order
     *     the records are written. An empty slice is a no-op.
     *
     * Returns:
     *   A `SwitchReport` with the written records and any failed host steps.
     *   Failed steps do not abort the batch. `SwitchError::Ledger` when a
     *   request is invalid or the ledger cannot be rotated or saved.
     */
    pub fn switch_to_binary(
        &self,
        project: &ProjectContext,
        requests: &[BinarySwitchRequest],
    ) -> Result<SwitchReport> {
        log::trace!(
            "SwitchCoordinator: Switching {} references of '{}' to binaries.",
            requests.len(),
            project.name()
        );
        if requests.is_empty() {
            log::debug!("SwitchCoordinator: Nothing selected, ledger left untouched.");
            return Ok(SwitchReport::default());
        }

        let pending = requests
            .iter()
            .map(|request| {
                TransformationRecord::new(
                    request.project_name(),
                    &request.project_path,
                    &request.binary_path,
                )
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut report = SwitchReport::default();
        for (request, record) in requests.iter().zip(pending) {
            let failures_before = report.failures.len();

            let removed = self.host.remove_reference(project, &request.reference);
            if !removed {
                log::warn!(
                    "SwitchCoordinator: Could not remove project reference '{}' from '{}'.",
                    record.project_name,
                    project.name()
                );
                report.failures.push(SwitchFailure {
                    project_name: record.project_name.clone(),
                    step: SwitchStep::RemoveProjectReference,
                    path: record.project_path.clone(),
                });
            }

            if !self.host.add_file_reference(project, &record.binary_path) {
                log::warn!(
                    "SwitchCoordinator: Could not add file reference {:?} to '{}'.",
                    record.binary_path,
                    project.name()
                );
                report.failures.push(SwitchFailure {
                    project_name: record.project_name.clone(),
                    step: SwitchStep::AddFileReference,
                    path: record.binary_path.clone(),
                });
            }

            report.records.push(record.with_removed(removed));
            report.tally(failures_before);
        }

        let current = project.resolve_current_ledger();
        self.ledger_store
            .rotate(&current, &project.resolve_previous_ledger())?;
        self.ledger_store.save(&current, &report.records)?;
        self.host.save_project(project);

        log::debug!(
            "SwitchCoordinator: Switched '{}' to binaries: {} succeeded, {} failed.",
            project.name(),
            report.succeeded,
            report.failed
        );
        Ok(report)
    }

    /*
     * Replays a ledger generation backwards: each binary reference is removed
     * and the project reference restored. Binaries that are already gone and
     * project references that are already present count as done, so running
     * this twice is harmless. The ledger files are left as they are.
     *
     * Args:
     *   project: The project to restore.
     *   generation: Which ledger to replay, current or previous.
     *
     * Returns:
     *   A report whose `records` are the replayed ledger. A missing or empty
     *   ledger gives an empty report without contacting the host.
     */
    pub fn switch_to_project(
        &self,
        project: &ProjectContext,
        generation: Generation,
    ) -> Result<SwitchReport> {
        let ledger_path = project.resolve_ledger(generation);
        log::trace!(
            "SwitchCoordinator: Switching '{}' back to projects using the {generation} ledger {:?}.",
            project.name(),
            ledger_path
        );
        let records = self.ledger_store.load(&ledger_path)?;
        if records.is_empty() {
            log::debug!("SwitchCoordinator: Ledger {ledger_path:?} is empty, nothing to restore.");
            return Ok(SwitchReport::default());
        }

        let mut references = self.host.list_references(project)?;
        let mut report = SwitchReport::default();

        for record in &records {
            let failures_before = report.failures.len();

            match references
                .iter()
                .position(|r| same_path(&r.resolved_path, &record.binary_path))
            {
                Some(index) => {
                    if self.host.remove_reference(project, &references[index]) {
                        references.remove(index);
                    } else {
                        log::warn!(
                            "SwitchCoordinator: Could not remove file reference {:?} from '{}'.",
                            record.binary_path,
                            project.name()
                        );
                        report.failures.push(SwitchFailure {
                            project_name: record.project_name.clone(),
                            step: SwitchStep::RemoveFileReference,
                            path: record.binary_path.clone(),
                        });
                    }
                }
                None => log::debug!(
                    "SwitchCoordinator: File reference {:?} already absent.",
                    record.binary_path
                ),
            }

            let already_present = references
                .iter()
                .any(|r| r.owner_project_name.as_deref() == Some(record.project_name.as_str()));
            if already_present {
                log::debug!(
                    "SwitchCoordinator: Project reference '{}' already present.",
                    record.project_name
                );
            } else if self
                .host
                .add_project_reference(project, &record.project_path)
            {
                references.push(ReferenceHandle::project(
                    record.project_name.clone(),
                    record.project_path.clone(),
                    record.project_name.clone(),
                ));
            } else {
                log::warn!(
                    "SwitchCoordinator: Could not add project reference {:?} to '{}'.",
                    record.project_path,
                    project.name()
                );
                report.failures.push(SwitchFailure {
                    project_name: record.project_name.clone(),
                    step: SwitchStep::AddProjectReference,
                    path: record.project_path.clone(),
                });
            }

            report.tally(failures_before);
        }

        self.host.save_project(project);
        report.records = records;
        log::debug!(
            "SwitchCoordinator: Switched '{}' back to projects: {} succeeded, {} failed.",
            project.name(),
            report.succeeded,
            report.failed
        );
        Ok(report)
    }

    /*
     * Retires the current ledger: it becomes the previous generation and no
     * current ledger remains. An older previous generation is discarded and
     * is never promoted back to current.
     *
     * Returns:
     *   `Ok(())` also when there was no current ledger.
     */
    pub fn clear_current_configuration(&self, project: &ProjectContext) -> Result<()> {
        log::trace!(
            "SwitchCoordinator: Clearing current configuration of '{}'.",
            project.name()
        );
        self.ledger_store.rotate(
            &project.resolve_current_ledger(),
            &project.resolve_previous_ledger(),
        )?;
        Ok(())
    }
}
