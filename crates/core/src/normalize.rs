//! Boundary between the loosely typed attribute bag returned by the commerce
//! backend and the rule engine. Every value is reduced to a trimmed string
//! (empty when absent); enum-bearing values are upper-cased so comparisons are
//! case-insensitive. Absent values are never defaulted to "no".

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::order::{AttributeKey, OrderRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrangeStatus {
    NeedToArrange,
    Arranged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncomingStatus {
    Incoming,
    NotYet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReserveStatus {
    ReservedIncomingInventory,
    No,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactReadiness {
    ReadyToContact,
    ContactLater,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowUpStatus {
    NeedsFollowUp,
    No,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnStatus {
    OwesReturn,
    No,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedAttributes {
    pub weeks_since_order: String,
    pub arrange_status: String,
    pub arranged_with: String,
    pub incoming: String,
    pub reserve_incoming: String,
    pub ready_to_contact: String,
    pub needs_follow_up: String,
    pub follow_up_notes: String,
    pub owes_return: String,
    pub return_notes: String,
    pub invoiced_with: String,
    pub latest_fulfillment_at: Option<DateTime<Utc>>,
    pub fulfilled: bool,
}

impl NormalizedAttributes {
    pub fn value(&self, key: AttributeKey) -> &str {
        match key {
            AttributeKey::WeeksSinceOrder => &self.weeks_since_order,
            AttributeKey::ArrangeStatus => &self.arrange_status,
            AttributeKey::ArrangedWith => &self.arranged_with,
            AttributeKey::Incoming => &self.incoming,
            AttributeKey::ReserveIncoming => &self.reserve_incoming,
            AttributeKey::ReadyToContact => &self.ready_to_contact,
            AttributeKey::NeedsFollowUp => &self.needs_follow_up,
            AttributeKey::FollowUpNotes => &self.follow_up_notes,
            AttributeKey::OwesReturn => &self.owes_return,
            AttributeKey::ReturnNotes => &self.return_notes,
            AttributeKey::InvoicedWith => &self.invoiced_with,
        }
    }

    fn slot(&mut self, key: AttributeKey) -> &mut String {
        match key {
            AttributeKey::WeeksSinceOrder => &mut self.weeks_since_order,
            AttributeKey::ArrangeStatus => &mut self.arrange_status,
            AttributeKey::ArrangedWith => &mut self.arranged_with,
            AttributeKey::Incoming => &mut self.incoming,
            AttributeKey::ReserveIncoming => &mut self.reserve_incoming,
            AttributeKey::ReadyToContact => &mut self.ready_to_contact,
            AttributeKey::NeedsFollowUp => &mut self.needs_follow_up,
            AttributeKey::FollowUpNotes => &mut self.follow_up_notes,
            AttributeKey::OwesReturn => &mut self.owes_return,
            AttributeKey::ReturnNotes => &mut self.return_notes,
            AttributeKey::InvoicedWith => &mut self.invoiced_with,
        }
    }

    pub fn arrange_status(&self) -> Option<ArrangeStatus> {
        match self.arrange_status.as_str() {
            "NEED_TO_ARRANGE" => Some(ArrangeStatus::NeedToArrange),
            "ARRANGED" => Some(ArrangeStatus::Arranged),
            _ => None,
        }
    }

    pub fn incoming(&self) -> Option<IncomingStatus> {
        match self.incoming.as_str() {
            "INCOMING" => Some(IncomingStatus::Incoming),
            "NOT_YET" => Some(IncomingStatus::NotYet),
            _ => None,
        }
    }

    pub fn reserve_incoming(&self) -> Option<ReserveStatus> {
        match self.reserve_incoming.as_str() {
            "RESERVED_INCOMING_INVENTORY" => Some(ReserveStatus::ReservedIncomingInventory),
            "NO" => Some(ReserveStatus::No),
            _ => None,
        }
    }

    pub fn ready_to_contact(&self) -> Option<ContactReadiness> {
        match self.ready_to_contact.as_str() {
            "READY_TO_CONTACT" => Some(ContactReadiness::ReadyToContact),
            "CONTACT_LATER" => Some(ContactReadiness::ContactLater),
            _ => None,
        }
    }

    pub fn needs_follow_up(&self) -> Option<FollowUpStatus> {
        match self.needs_follow_up.as_str() {
            "NEEDS_FOLLOW_UP" => Some(FollowUpStatus::NeedsFollowUp),
            "NO" => Some(FollowUpStatus::No),
            _ => None,
        }
    }

    pub fn owes_return(&self) -> Option<ReturnStatus> {
        match self.owes_return.as_str() {
            "OWES_RETURN" => Some(ReturnStatus::OwesReturn),
            "NO" => Some(ReturnStatus::No),
            _ => None,
        }
    }
}

pub fn normalize(record: &OrderRecord) -> NormalizedAttributes {
    let mut normalized = NormalizedAttributes::default();

    for key in AttributeKey::ALL {
        let raw = record.custom_fields.get(key).map(stringify).unwrap_or_default();
        let trimmed = raw.trim();
        *normalized.slot(key) =
            if key.is_enumerated() { trimmed.to_uppercase() } else { trimmed.to_owned() };
    }

    normalized.latest_fulfillment_at =
        record.fulfillments.iter().filter_map(|event| event.created_at).max();
    normalized.fulfilled = record.fulfillment_status.trim().eq_ignore_ascii_case("FULFILLED");
    normalized
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}
