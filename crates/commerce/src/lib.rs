//! Order Fetcher for the commerce backend's GraphQL Admin API.
//!
//! - `query` builds the single `orders(first: 1)` request filtered by exact name
//! - `response` decodes the projection and surfaces query errors
//! - `client` sends the request and implements `OrderLookup`

pub mod client;
pub mod query;
pub mod response;

pub use client::CommerceClient;
