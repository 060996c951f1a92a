//! RSS Reader - feed subscriptions, a same-origin fetch proxy and an RSS/Atom parser
//!
//! The backend stores feed subscriptions and relays remote feed documents so a
//! browser can read them without cross-origin requests. The client side turns
//! the relayed markup into articles and keeps the reader's state.

pub mod config;
pub mod controller;
pub mod dates;
pub mod db;
pub mod fetcher;
pub mod parser;
pub mod routes;
