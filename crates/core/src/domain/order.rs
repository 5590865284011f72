use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Custom single-value attributes stored on an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKey {
    WeeksSinceOrder,
    ArrangeStatus,
    ArrangedWith,
    Incoming,
    ReserveIncoming,
    ReadyToContact,
    NeedsFollowUp,
    FollowUpNotes,
    OwesReturn,
    ReturnNotes,
    InvoicedWith,
}

impl AttributeKey {
    pub const ALL: [AttributeKey; 11] = [
        Self::WeeksSinceOrder,
        Self::ArrangeStatus,
        Self::ArrangedWith,
        Self::Incoming,
        Self::ReserveIncoming,
        Self::ReadyToContact,
        Self::NeedsFollowUp,
        Self::FollowUpNotes,
        Self::OwesReturn,
        Self::ReturnNotes,
        Self::InvoicedWith,
    ];

    /// Key of the backing metafield in the `custom` namespace.
    pub fn metafield_key(self) -> &'static str {
        match self {
            Self::WeeksSinceOrder => "weeks_since_order",
            Self::ArrangeStatus => "arrange_status",
            Self::ArrangedWith => "arranged_with",
            Self::Incoming => "incoming",
            Self::ReserveIncoming => "reserve_incoming",
            Self::ReadyToContact => "ready_to_contact",
            Self::NeedsFollowUp => "needs_follow_up",
            Self::FollowUpNotes => "follow_up_notes",
            Self::OwesReturn => "owes_return",
            Self::ReturnNotes => "return_notes",
            Self::InvoicedWith => "invoiced_with",
        }
    }

    /// GraphQL alias used when projecting the metafield.
    pub fn query_alias(self) -> &'static str {
        match self {
            Self::WeeksSinceOrder => "weeksSinceOrder",
            Self::ArrangeStatus => "arrangeStatus",
            Self::ArrangedWith => "arrangedWith",
            Self::Incoming => "incoming",
            Self::ReserveIncoming => "reserveIncoming",
            Self::ReadyToContact => "readyToContact",
            Self::NeedsFollowUp => "needsFollowUp",
            Self::FollowUpNotes => "followUpNotes",
            Self::OwesReturn => "owesReturn",
            Self::ReturnNotes => "returnNotes",
            Self::InvoicedWith => "invoicedWith",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::WeeksSinceOrder => "Weeks Since Order",
            Self::ArrangeStatus => "Arrange Status",
            Self::ArrangedWith => "Arranged With",
            Self::Incoming => "Incoming",
            Self::ReserveIncoming => "Reserve Incoming",
            Self::ReadyToContact => "Ready To Contact",
            Self::NeedsFollowUp => "Needs Follow-up",
            Self::FollowUpNotes => "Follow-up Notes",
            Self::OwesReturn => "Owes Return",
            Self::ReturnNotes => "Return Notes",
            Self::InvoicedWith => "Invoiced With",
        }
    }

    /// Enum-bearing attributes are compared case-insensitively.
    pub fn is_enumerated(self) -> bool {
        matches!(
            self,
            Self::ArrangeStatus
                | Self::Incoming
                | Self::ReserveIncoming
                | Self::ReadyToContact
                | Self::NeedsFollowUp
                | Self::OwesReturn
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomFields(BTreeMap<AttributeKey, Value>);

impl CustomFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: AttributeKey, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: AttributeKey, value: impl Into<Value>) {
        self.0.insert(key, value.into());
    }

    pub fn get(&self, key: AttributeKey) -> Option<&Value> {
        self.0.get(&key)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentEvent {
    pub created_at: Option<DateTime<Utc>>,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Opaque backend identifier, e.g. `gid://shopify/Order/5512`.
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub customer_name: Option<String>,
    pub fulfillment_status: String,
    pub fulfillments: Vec<FulfillmentEvent>,
    pub custom_fields: CustomFields,
}

impl OrderRecord {
    /// Last `/`-separated segment of the opaque id.
    pub fn numeric_id(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }
}
