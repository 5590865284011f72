use orderwatch_core::AttributeKey;
use serde::Serialize;
use serde_json::{json, Value};

pub const METAFIELD_NAMESPACE: &str = "custom";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphqlRequest {
    pub query: String,
    pub variables: Value,
}

/// One `orders(first: 1)` query filtered by exact name across every status.
pub fn order_by_name(order_name: &str) -> GraphqlRequest {
    GraphqlRequest {
        query: order_query_document(),
        variables: json!({ "query": search_filter(order_name) }),
    }
}

pub fn search_filter(order_name: &str) -> String {
    format!("name:{} status:any", order_name.trim())
}

pub fn order_query_document() -> String {
    let metafields = AttributeKey::ALL
        .iter()
        .map(|key| {
            format!(
                "        {}: metafield(namespace: \"{METAFIELD_NAMESPACE}\", key: \"{}\") {{ value }}",
                key.query_alias(),
                key.metafield_key()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "query OrderByName($query: String!) {{
  orders(first: 1, query: $query) {{
    edges {{
      node {{
        id
        name
        createdAt
        displayFulfillmentStatus
        customer {{ displayName }}
        fulfillments {{ createdAt status }}
{metafields}
      }}
    }}
  }}
}}"
    )
}
