use async_trait::async_trait;

use crate::domain::order::OrderRecord;
use crate::errors::BackendError;

/// Source of order records, keyed by the order's display name (`#S1234`).
#[async_trait]
pub trait OrderLookup: Send + Sync {
    /// `Ok(None)` when the backend answered but no order carries that name.
    async fn fetch(&self, order_name: &str) -> Result<Option<OrderRecord>, BackendError>;
}
