/*
 * Decides whether a reference resolves into a package folder. This is a path
 * heuristic only: a reference counts as packaged when one of its path
 * segments is literally `packages`. The file itself is never inspected.
 */
use super::reference_host::ReferenceHandle;
use std::path::Path;

const PACKAGES_SEGMENT: &str = "packages";

/// Case-sensitive segment match; `/` and `\` both separate segments.
pub fn is_packaged(resolved_path: &Path) -> bool {
    resolved_path
        .to_string_lossy()
        .split(['/', '\\'])
        .any(|segment| segment == PACKAGES_SEGMENT)
}

/*
 * A project's references split for display and selection: packaged ones are
 * candidates for switching back to a project reference, everything else is
 * ordinary.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedReferences {
    pub ordinary: Vec<ReferenceHandle>,
    pub packaged: Vec<ReferenceHandle>,
}

pub fn classify(references: Vec<ReferenceHandle>) -> ClassifiedReferences {
    let (packaged, ordinary): (Vec<_>, Vec<_>) = references
        .into_iter()
        .partition(|r| is_packaged(&r.resolved_path));
    ClassifiedReferences { ordinary, packaged }
}
