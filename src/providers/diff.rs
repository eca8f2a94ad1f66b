use crate::spec::{load_data_source, NormalizedSpec};
use anyhow::Result;
use std::path::Path;

/// What changed since the project was last generated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub interface_changed: bool,
    pub datatype_changed: bool,
}

impl DiffResult {
    /// Everything changed.
    pub const ALL: DiffResult = DiffResult {
        interface_changed: true,
        datatype_changed: true,
    };

    pub fn any_changed(&self) -> bool {
        self.interface_changed || self.datatype_changed
    }
}

/// Change detection for incremental runs.
pub trait DiffProvider {
    fn diff(&self, spec: &NormalizedSpec) -> DiffResult;
}

/// A fixed answer, for callers that already know what changed.
impl DiffProvider for DiffResult {
    fn diff(&self, _spec: &NormalizedSpec) -> DiffResult {
        *self
    }
}

/// Compares against a previously generated export.
#[derive(Debug, Clone, Default)]
pub struct SnapshotDiff {
    previous: Option<NormalizedSpec>,
}

impl SnapshotDiff {
    pub fn new(previous: Option<NormalizedSpec>) -> Self {
        Self { previous }
    }

    pub fn from_path(previous: Option<&Path>) -> Result<Self> {
        let previous = previous.map(load_data_source).transpose()?;
        Ok(Self::new(previous))
    }
}

impl DiffProvider for SnapshotDiff {
    fn diff(&self, spec: &NormalizedSpec) -> DiffResult {
        match &self.previous {
            None => DiffResult::ALL,
            Some(prev) => DiffResult {
                interface_changed: prev.interfaces != spec.interfaces,
                datatype_changed: prev.type_catalog != spec.type_catalog,
            },
        }
    }
}
