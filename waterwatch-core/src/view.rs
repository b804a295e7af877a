//! The in-memory sample collection behind a chart and export panel.

use crate::{error::WaterwatchError, store::SampleStore};
use tracing::{debug, warn};
use waterwatch_schemas::{query::QuerySpec, sample::Sample};

/// Issued when a fetch starts; only the latest ticket may be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    spec: QuerySpec,
}

impl FetchTicket {
    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer fetch was started after this one; the result was dropped.
    Stale,
}

/// Explicit answer to "are you sure you want to delete this sample?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

#[derive(Debug, Default)]
pub struct SampleView {
    scope: Option<QuerySpec>,
    generation: u64,
    samples: Vec<Sample>,
}

impl SampleView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn scope(&self) -> Option<&QuerySpec> {
        self.scope.as_ref()
    }

    /// Records `spec` as the current scope and invalidates earlier tickets.
    pub fn begin_fetch(&mut self, spec: QuerySpec) -> FetchTicket {
        self.generation += 1;
        self.scope = Some(spec);
        FetchTicket { generation: self.generation, spec }
    }

    /// Applies a fetch result if `ticket` is still current. A failed fetch
    /// leaves the view with no data and returns the error.
    pub fn apply(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Sample>, WaterwatchError>,
    ) -> Result<ApplyOutcome, WaterwatchError> {
        if ticket.generation != self.generation || self.scope != Some(ticket.spec) {
            debug!(query = %ticket.spec.to_query_string(), "Dropping stale fetch result");
            return Ok(ApplyOutcome::Stale);
        }
        match result {
            Ok(samples) => {
                debug!(query = %ticket.spec.to_query_string(), samples = samples.len(), "Applied fetch result");
                self.samples = samples;
                Ok(ApplyOutcome::Applied)
            }
            Err(e) => {
                warn!(query = %ticket.spec.to_query_string(), error = %e, "Fetch failed");
                self.samples.clear();
                Err(e)
            }
        }
    }

    /// Fetches `spec` from `store` and applies it in one step.
    pub fn refresh(&mut self, store: &dyn SampleStore, spec: QuerySpec) -> Result<&[Sample], WaterwatchError> {
        let ticket = self.begin_fetch(spec);
        let result = store.fetch(ticket.spec());
        self.apply(ticket, result)?;
        Ok(&self.samples)
    }

    /// Deletes a sample through `store`. Nothing is sent without
    /// confirmation, and the local collection only changes on success.
    pub fn delete(
        &mut self,
        store: &mut dyn SampleStore,
        id: u64,
        confirmation: Confirmation,
    ) -> Result<Sample, WaterwatchError> {
        if confirmation != Confirmation::Confirmed {
            return Err(WaterwatchError::DeletionNotConfirmed(id));
        }
        let index = self
            .samples
            .iter()
            .position(|s| s.id == id)
            .ok_or(WaterwatchError::SampleNotFound(id))?;
        store.delete(id)?;
        Ok(self.samples.remove(index))
    }
}
