use std::{collections::HashMap, sync::Arc, sync::OnceLock};

use async_trait::async_trait;
use orderwatch_core::{BackendError, InterfaceError, OrderLookup};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::{
    blocks::lookup_failed_message,
    pipeline::OrderPipeline,
    web::{ReplyPoster, SlackApiError},
};

/// `#S` followed by four or five digits. Case-sensitive, not word-bounded.
pub const ORDER_NAME_PATTERN: &str = r"#S[0-9]{4,5}";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    ChannelMessage(ChannelMessageEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::ChannelMessage(_) => SlackEventType::ChannelMessage,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    ChannelMessage,
    Unsupported,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelMessageEvent {
    pub channel_id: String,
    pub ts: String,
    pub thread_ts: Option<String>,
    pub user_id: Option<String>,
    pub bot_id: Option<String>,
    pub subtype: Option<String>,
    pub text: String,
}

impl ChannelMessageEvent {
    /// Replies go into the existing thread, or start one under this message.
    pub fn reply_thread_ts(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Replied { count: usize },
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Lookup(#[from] BackendError),
    #[error("reply could not be posted: {0}")]
    Reply(#[from] SlackApiError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

fn order_name_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| match Regex::new(ORDER_NAME_PATTERN) {
        Ok(regex) => regex,
        Err(error) => unreachable!("order name pattern is a valid literal: {error}"),
    })
}

/// All order names in `text`, left to right, non-overlapping.
pub fn extract_order_names(text: &str) -> Vec<String> {
    order_name_regex().find_iter(text).map(|found| found.as_str().to_owned()).collect()
}

/// Looks up every order named in a channel message and posts one threaded
/// reply per name, strictly one after another.
pub struct OrderMessageHandler<L, P> {
    pipeline: OrderPipeline<L>,
    poster: P,
    channel_lock: Option<String>,
}

impl<L, P> OrderMessageHandler<L, P>
where
    L: OrderLookup,
    P: ReplyPoster,
{
    pub fn new(pipeline: OrderPipeline<L>, poster: P, channel_lock: Option<String>) -> Self {
        Self { pipeline, poster, channel_lock }
    }

    fn ignore_reason(&self, event: &ChannelMessageEvent) -> Option<&'static str> {
        if let Some(locked) = &self.channel_lock {
            if locked != &event.channel_id {
                return Some("channel_not_allowed");
            }
        }
        if event.subtype.is_some() {
            return Some("message_subtype");
        }
        if event.text.trim().is_empty() {
            return Some("empty_text");
        }
        if event.bot_id.is_some() {
            return Some("automated_sender");
        }
        None
    }

    async fn reply_for(
        &self,
        event: &ChannelMessageEvent,
        order_name: &str,
    ) -> Result<(), EventHandlerError> {
        let outcome = self.pipeline.run(order_name).await?;
        self.poster
            .post_reply(&event.channel_id, event.reply_thread_ts(), outcome.message())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl<L, P> EventHandler for OrderMessageHandler<L, P>
where
    L: OrderLookup + 'static,
    P: ReplyPoster + 'static,
{
    fn event_type(&self) -> SlackEventType {
        SlackEventType::ChannelMessage
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ChannelMessage(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        if let Some(reason) = self.ignore_reason(event) {
            debug!(
                event_name = "ingress.slack.message_ignored",
                correlation_id = %ctx.correlation_id,
                channel_id = %event.channel_id,
                reason,
                "ignoring channel message"
            );
            return Ok(HandlerResult::Ignored);
        }

        let order_names = extract_order_names(&event.text);
        if order_names.is_empty() {
            return Ok(HandlerResult::Processed);
        }

        let mut count = 0;
        for order_name in &order_names {
            info!(
                event_name = "order.lookup.start",
                correlation_id = %ctx.correlation_id,
                order_name = %order_name,
                thread_id = event.reply_thread_ts(),
                "looking up order"
            );

            match self.reply_for(event, order_name).await {
                Ok(()) => count += 1,
                Err(failure) => {
                    let interface =
                        InterfaceError::lookup_failed(order_name, &failure, &ctx.correlation_id);
                    error!(
                        event_name = "order.lookup.failed",
                        correlation_id = %ctx.correlation_id,
                        order_name = %order_name,
                        error = %interface,
                        "order lookup failed; posting apology"
                    );
                    let apology = lookup_failed_message(
                        &interface.user_message(),
                        interface.correlation_id(),
                    );
                    match self
                        .poster
                        .post_reply(&event.channel_id, event.reply_thread_ts(), &apology)
                        .await
                    {
                        Ok(()) => count += 1,
                        Err(post_error) => error!(
                            event_name = "order.lookup.apology_failed",
                            correlation_id = %ctx.correlation_id,
                            order_name = %order_name,
                            error = %post_error,
                            "could not post apology reply"
                        ),
                    }
                }
            }
        }

        Ok(HandlerResult::Replied { count })
    }
}
