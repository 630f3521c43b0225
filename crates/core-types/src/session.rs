use crate::mapping::ColumnMapping;
use crate::structs::{DcaPlan, Series};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Everything one analyst session works on, owned by the caller.
///
/// Collaborators receive the session by reference; nothing in the workspace keeps
/// a dataset in global state between calls.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    pub id: Uuid,
    /// Where the data came from (a file path, an upload name).
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub mapping: ColumnMapping,
    series: Series,
    plan: Option<DcaPlan>,
}

impl AnalysisSession {
    pub fn new(source: impl Into<String>, series: Series, mapping: ColumnMapping) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            loaded_at: Utc::now(),
            mapping,
            series,
            plan: None,
        }
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    /// Swaps in a freshly derived series (new window, new upload).
    pub fn replace_series(&mut self, series: Series) {
        tracing::debug!(session = %self.id, observations = series.len(), "Replacing session series");
        self.series = series;
    }

    pub fn plan(&self) -> Option<&DcaPlan> {
        self.plan.as_ref()
    }

    /// Sets the single active DCA plan, returning the one it replaced.
    pub fn set_plan(&mut self, plan: DcaPlan) -> Option<DcaPlan> {
        self.plan.replace(plan)
    }
}
