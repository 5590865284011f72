//! Slack interface for orderwatch
//!
//! - **Socket Mode** (`socket`) - WebSocket connection to Slack (no public URL needed)
//! - **Events** (`events`) - channel messages, order-name extraction, dispatch
//! - **Pipeline** (`pipeline`) - fetch, normalize, analyze and format one order
//! - **Block Kit** (`blocks`) - order summary, not-found and apology messages
//! - **Web API** (`web`) - `chat.postMessage` threaded replies, `apps.connections.open`
//!
//! # Architecture
//!
//! ```text
//! Slack Events → EventDispatcher → OrderMessageHandler → OrderPipeline → Commerce backend
//!                                          ↓
//!                          Block Kit reply ← chat.postMessage
//! ```

pub mod blocks;
pub mod events;
pub mod pipeline;
pub mod socket;
pub mod web;
