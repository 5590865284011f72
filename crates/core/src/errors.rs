use thiserror::Error;

/// Failures talking to the commerce backend. A query that matches nothing is
/// not an error; fetchers return `Ok(None)` for it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("commerce backend returned HTTP {status}: {body}")]
    Transport { status: u16, body: String },
    #[error("commerce backend reported query errors: {}", .0.join("; "))]
    Query(Vec<String>),
    #[error("commerce backend request failed: {0}")]
    Request(String),
    #[error("commerce backend response could not be decoded: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Query(_) => "query",
            Self::Request(_) => "request",
            Self::Decode(_) => "decode",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("order lookup failed for {order_name}: {message}")]
    LookupFailed { order_name: String, message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn lookup_failed(
        order_name: impl Into<String>,
        error: &dyn std::error::Error,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self::LookupFailed {
            order_name: order_name.into(),
            message: error.to_string(),
            correlation_id: correlation_id.into(),
        }
    }

    /// Text safe to show in the conversation; never includes backend detail.
    pub fn user_message(&self) -> String {
        match self {
            Self::LookupFailed { order_name, .. } => format!(
                "Sorry, something went wrong while looking up order {order_name}. Please try again later."
            ),
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::LookupFailed { correlation_id, .. } => correlation_id,
        }
    }
}
