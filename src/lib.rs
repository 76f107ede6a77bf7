//! Bazaar marketplace client.
//!
//! Layers, bottom up: [`client`] issues one typed request per call,
//! [`resources`] maps every backend endpoint onto it, [`cache`] stores read
//! results with staleness windows and request coalescing, and
//! [`application`] ties those together with the signed-in session and the
//! invalidation rules of each write.

pub mod application;
pub mod cache;
pub mod client;
pub mod config;
pub mod infra;
pub mod resources;
pub(crate) mod util;

pub use application::{Identity, Marketplace, Session};
pub use client::{ApiClient, ClientError};
