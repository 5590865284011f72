//! Narrative rule engine.
//!
//! Rules are independent predicates evaluated in a fixed order. Each rule that
//! fires appends one narrative line and requests zero or more detail entries;
//! details are unique by attribute key and the first request wins.

use chrono::{DateTime, Utc};

use crate::domain::analysis::{AnalysisResult, DetailList, FooterLink};
use crate::domain::order::{AttributeKey, OrderRecord};
use crate::normalize::{
    ArrangeStatus, ContactReadiness, FollowUpStatus, IncomingStatus, NormalizedAttributes,
    ReserveStatus, ReturnStatus,
};

pub const NO_EXCEPTIONS_LINE: &str = "No exceptions detected";
pub const ADMIN_LINK_LABEL: &str = "View in admin";
const RESERVED_FROM_LABEL: &str = "Reserved From";
const MILLIS_PER_WEEK: f64 = 7.0 * 24.0 * 3600.0 * 1000.0;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NarrativeEngine {
    shop_domain: String,
}

impl NarrativeEngine {
    pub fn new(shop_domain: impl Into<String>) -> Self {
        Self { shop_domain: shop_domain.into() }
    }

    pub fn analyze(
        &self,
        record: &OrderRecord,
        attrs: &NormalizedAttributes,
        now: DateTime<Utc>,
    ) -> AnalysisResult {
        let mut narrative = Vec::new();
        let mut details = DetailList::new();

        fulfillment_rule(attrs, now, &mut narrative, &mut details);
        need_to_arrange_rule(attrs, &mut narrative, &mut details);
        arranged_rule(attrs, &mut narrative, &mut details);
        incoming_rule(attrs, &mut narrative, &mut details);
        contact_rule(attrs, &mut narrative, &mut details);
        follow_up_rule(attrs, &mut narrative, &mut details);
        reserve_rule(attrs, &mut narrative, &mut details);
        return_rule(attrs, &mut narrative, &mut details);

        // The fulfillment rule always emits, so this only triggers if that ever changes.
        if narrative.is_empty() {
            narrative.push(NO_EXCEPTIONS_LINE.to_owned());
        }

        AnalysisResult {
            order_name: record.name.clone(),
            header: header_text(record),
            narrative,
            details: details.into_entries(),
            footer_links: vec![FooterLink {
                label: ADMIN_LINK_LABEL.to_owned(),
                url: format!("https://{}/admin/orders/{}", self.shop_domain, record.numeric_id()),
            }],
        }
    }
}

fn header_text(record: &OrderRecord) -> String {
    match record.customer_name.as_deref().map(str::trim).filter(|name| !name.is_empty()) {
        Some(customer) => format!("Order {} · {customer}", record.name),
        None => format!("Order {}", record.name),
    }
}

fn request(details: &mut DetailList, attrs: &NormalizedAttributes, key: AttributeKey) {
    details.request(key, key.label(), attrs.value(key));
}

fn request_age_if_open(details: &mut DetailList, attrs: &NormalizedAttributes) {
    if !attrs.fulfilled {
        request(details, attrs, AttributeKey::WeeksSinceOrder);
    }
}

fn fulfillment_rule(
    attrs: &NormalizedAttributes,
    now: DateTime<Utc>,
    narrative: &mut Vec<String>,
    details: &mut DetailList,
) {
    if attrs.fulfilled {
        let line = match attrs.latest_fulfillment_at {
            Some(fulfilled_at) => {
                let elapsed = now.signed_duration_since(fulfilled_at).num_milliseconds();
                format!("Fulfilled {} weeks ago", format_weeks(elapsed))
            }
            None => "Fulfilled (date unavailable)".to_owned(),
        };
        narrative.push(line);
        request(details, attrs, AttributeKey::InvoicedWith);
    } else if attrs.weeks_since_order.is_empty() {
        narrative.push("Not yet fulfilled, age unknown".to_owned());
    } else {
        narrative.push(format!(
            "Not yet fulfilled, {} weeks since order",
            attrs.weeks_since_order
        ));
    }
}

fn need_to_arrange_rule(
    attrs: &NormalizedAttributes,
    narrative: &mut Vec<String>,
    details: &mut DetailList,
) {
    if attrs.arrange_status() != Some(ArrangeStatus::NeedToArrange) {
        return;
    }
    narrative.push("Needs to be arranged with a supplier".to_owned());
    request(details, attrs, AttributeKey::FollowUpNotes);
    request_age_if_open(details, attrs);
}

fn arranged_rule(
    attrs: &NormalizedAttributes,
    narrative: &mut Vec<String>,
    details: &mut DetailList,
) {
    if attrs.arrange_status() != Some(ArrangeStatus::Arranged)
        || attrs.incoming() == Some(IncomingStatus::Incoming)
    {
        return;
    }
    narrative.push("Arranged with supplier, not yet incoming".to_owned());
    request(details, attrs, AttributeKey::ArrangedWith);
    request_age_if_open(details, attrs);
}

fn incoming_rule(
    attrs: &NormalizedAttributes,
    narrative: &mut Vec<String>,
    details: &mut DetailList,
) {
    if attrs.incoming() != Some(IncomingStatus::Incoming) {
        return;
    }
    if attrs.arrange_status() == Some(ArrangeStatus::Arranged) {
        narrative.push("Partially incoming from supplier".to_owned());
        request(details, attrs, AttributeKey::FollowUpNotes);
    } else {
        narrative.push("Incoming from supplier".to_owned());
    }
    request(details, attrs, AttributeKey::InvoicedWith);
    request_age_if_open(details, attrs);
}

fn contact_rule(
    attrs: &NormalizedAttributes,
    narrative: &mut Vec<String>,
    details: &mut DetailList,
) {
    match attrs.ready_to_contact() {
        Some(ContactReadiness::ReadyToContact) => {
            narrative.push("Ready to contact customer".to_owned());
            request(details, attrs, AttributeKey::InvoicedWith);
        }
        Some(ContactReadiness::ContactLater) => {
            narrative.push("Contact customer later".to_owned());
            request(details, attrs, AttributeKey::WeeksSinceOrder);
            request(details, attrs, AttributeKey::InvoicedWith);
        }
        None => {}
    }
}

fn follow_up_rule(
    attrs: &NormalizedAttributes,
    narrative: &mut Vec<String>,
    details: &mut DetailList,
) {
    if attrs.needs_follow_up() == Some(FollowUpStatus::NeedsFollowUp) {
        narrative.push("Needs follow-up".to_owned());
        request(details, attrs, AttributeKey::FollowUpNotes);
    }
}

fn reserve_rule(
    attrs: &NormalizedAttributes,
    narrative: &mut Vec<String>,
    details: &mut DetailList,
) {
    if attrs.reserve_incoming() == Some(ReserveStatus::ReservedIncomingInventory) {
        narrative.push("Reserved incoming inventory".to_owned());
        details.request(AttributeKey::ArrangedWith, RESERVED_FROM_LABEL, &attrs.arranged_with);
    }
}

fn return_rule(
    attrs: &NormalizedAttributes,
    narrative: &mut Vec<String>,
    details: &mut DetailList,
) {
    if attrs.owes_return() == Some(ReturnStatus::OwesReturn) {
        narrative.push("Customer owes a return".to_owned());
        request(details, attrs, AttributeKey::ReturnNotes);
    }
}

/// Elapsed milliseconds as weeks, rounded half away from zero to one decimal.
pub fn format_weeks(elapsed_millis: i64) -> String {
    let weeks = elapsed_millis as f64 / MILLIS_PER_WEEK;
    let rounded = (weeks * 10.0).round() / 10.0;
    format!("{rounded:.1}")
}
