use chrono::{DateTime, Utc};
use orderwatch_core::{normalize, AnalysisResult, BackendError, NarrativeEngine, OrderLookup};
use tracing::info;

use crate::blocks::{not_found_message, order_summary_message, MessageTemplate};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupOutcome {
    Found { analysis: AnalysisResult, message: MessageTemplate },
    NotFound { message: MessageTemplate },
}

impl LookupOutcome {
    pub fn message(&self) -> &MessageTemplate {
        match self {
            Self::Found { message, .. } | Self::NotFound { message } => message,
        }
    }
}

/// fetch → normalize → analyze → format for a single order name.
pub struct OrderPipeline<L> {
    lookup: L,
    engine: NarrativeEngine,
}

impl<L> OrderPipeline<L>
where
    L: OrderLookup,
{
    pub fn new(lookup: L, engine: NarrativeEngine) -> Self {
        Self { lookup, engine }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub async fn run(&self, order_name: &str) -> Result<LookupOutcome, BackendError> {
        self.run_at(order_name, Utc::now()).await
    }

    pub async fn run_at(
        &self,
        order_name: &str,
        now: DateTime<Utc>,
    ) -> Result<LookupOutcome, BackendError> {
        let Some(record) = self.lookup.fetch(order_name).await? else {
            info!(event_name = "order.lookup.not_found", order_name, "order not found");
            return Ok(LookupOutcome::NotFound { message: not_found_message(order_name) });
        };

        let attributes = normalize(&record);
        let analysis = self.engine.analyze(&record, &attributes, now);
        info!(
            event_name = "order.lookup.analyzed",
            order_name,
            narrative_lines = analysis.narrative.len(),
            detail_entries = analysis.details.len(),
            "order analyzed"
        );
        let message = order_summary_message(&analysis);
        Ok(LookupOutcome::Found { analysis, message })
    }
}
