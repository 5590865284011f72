use chrono::{DateTime, Utc};
use orderwatch_core::{AttributeKey, BackendError, CustomFields, FulfillmentEvent, OrderRecord};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, Deserialize)]
struct OrdersData {
    orders: OrderConnection,
}

#[derive(Debug, Deserialize)]
struct OrderConnection {
    #[serde(default)]
    edges: Vec<OrderEdge>,
}

#[derive(Debug, Deserialize)]
struct OrderEdge {
    node: OrderNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderNode {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    display_fulfillment_status: Option<String>,
    customer: Option<CustomerNode>,
    #[serde(default)]
    fulfillments: Vec<FulfillmentNode>,
    #[serde(flatten)]
    metafields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerNode {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FulfillmentNode {
    created_at: Option<DateTime<Utc>>,
    status: Option<String>,
}

/// Turns a successful GraphQL response body into an order record.
///
/// Error entries at the top level or nested anywhere under `data`
/// (`errors` / `userErrors`) fail the lookup even when `data` is present.
pub fn decode_order_response(
    body: &Value,
    requested_name: &str,
) -> Result<Option<OrderRecord>, BackendError> {
    let mut messages = error_messages(body.get("errors"));
    if let Some(data) = body.get("data") {
        collect_nested_errors(data, &mut messages);
    }
    if !messages.is_empty() {
        return Err(BackendError::Query(messages));
    }

    let data = match body.get("data") {
        Some(data) if !data.is_null() => data.clone(),
        _ => return Err(BackendError::Decode("response carried no `data` object".to_owned())),
    };
    let data: OrdersData =
        serde_json::from_value(data).map_err(|error| BackendError::Decode(error.to_string()))?;

    let Some(edge) = data.orders.edges.into_iter().next() else {
        return Ok(None);
    };

    if edge.node.name.trim() != requested_name.trim() {
        warn!(
            event_name = "commerce.lookup.name_mismatch",
            order_name = requested_name,
            returned_name = %edge.node.name,
            "backend returned a different order than requested; treating as not found"
        );
        return Ok(None);
    }

    Ok(Some(into_record(edge.node)))
}

fn into_record(node: OrderNode) -> OrderRecord {
    let mut custom_fields = CustomFields::new();
    for key in AttributeKey::ALL {
        let value = node
            .metafields
            .get(key.query_alias())
            .and_then(|metafield| metafield.get("value"))
            .filter(|value| !value.is_null());
        if let Some(value) = value {
            custom_fields.insert(key, value.clone());
        }
    }

    OrderRecord {
        id: node.id,
        name: node.name,
        created_at: node.created_at,
        customer_name: node.customer.and_then(|customer| customer.display_name),
        fulfillment_status: node.display_fulfillment_status.unwrap_or_default(),
        fulfillments: node
            .fulfillments
            .into_iter()
            .map(|fulfillment| FulfillmentEvent {
                created_at: fulfillment.created_at,
                status: fulfillment.status.unwrap_or_default(),
            })
            .collect(),
        custom_fields,
    }
}

fn collect_nested_errors(value: &Value, messages: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "errors" || key == "userErrors" {
                    messages.extend(error_messages(Some(child)));
                } else {
                    collect_nested_errors(child, messages);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_nested_errors(item, messages);
            }
        }
        _ => {}
    }
}

fn error_messages(errors: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(entries)) = errors else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|entry| match entry.get("message").and_then(Value::as_str) {
            Some(message) => message.to_owned(),
            None => entry.to_string(),
        })
        .collect()
}
