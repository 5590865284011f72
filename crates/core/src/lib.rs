pub mod config;
pub mod domain;
pub mod errors;
pub mod lookup;
pub mod normalize;
pub mod rules;

pub use domain::analysis::{AnalysisResult, DetailEntry, DetailList, FooterLink};
pub use domain::order::{AttributeKey, CustomFields, FulfillmentEvent, OrderRecord};
pub use errors::{BackendError, InterfaceError};
pub use lookup::OrderLookup;
pub use normalize::{normalize, NormalizedAttributes};
pub use rules::NarrativeEngine;
