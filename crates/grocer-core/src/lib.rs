//! # Grocer Core
//!
//! Shared, runtime-free logic for grocer: product models, search-term
//! normalization, ingredient quality rules, candidate filtering, the
//! selection/scoring engine, and the key-value store abstraction.
//!
//! This crate contains no tokio, sqlx, HTTP client, or filesystem I/O.
//! Everything here is deterministic given its inputs, which is what lets
//! the ranking behavior be tested exhaustively without a network.

pub mod filter;
pub mod models;
pub mod rules;
pub mod select;
pub mod store;
pub mod terms;
