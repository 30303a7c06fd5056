//! # grocer
//!
//! Resolves free-text ingredient requests ("2 boneless chicken breasts",
//! "finely chopped yellow onion") into concrete products from an upstream
//! grocery catalog, without ever exceeding that catalog's rate limits.
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────┐   hit   ┌────────────────┐
//! term ──────────▶ │ CatalogCache │ ──────▶ │ SelectionEngine│ ──▶ Match
//!                  └──────┬───────┘         └────────────────┘
//!                         │ miss                    ▲
//!                         ▼                         │
//!  ┌──────────────┐  ┌─────────────┐  ┌──────────────────────┐
//!  │ RequestQueue │─▶│RateGovernor │─▶│ ResilientTransport   │──▶ catalog
//!  │ (priority)   │  │ (shared KV) │  │ retry + CircuitBreaker│
//!  └──────────────┘  └─────────────┘  └──────────────────────┘
//! ```
//!
//! Rate counters and cache entries live in a shared [`KvStore`] (SQLite in
//! production), so every process using the same database file shares one
//! rate budget. The queue and breaker are per process.
//!
//! ## Quick Start
//!
//! ```bash
//! grocer init                              # create database
//! grocer resolve "boneless chicken breast" --location 01400943
//! grocer top "yellow onion" --limit 3
//! grocer rank "chicken breast" --file candidates.json   # offline scoring
//! grocer serve                             # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`error`] | Catalog error taxonomy |
//! | [`db`] / [`migrate`] | SQLite connection and schema |
//! | [`sqlite_store`] | SQLite [`KvStore`] |
//! | [`queue`] | Priority request queue |
//! | [`governor`] | Shared per-second / per-hour rate limits |
//! | [`breaker`] | Circuit breaker |
//! | [`transport`] | Retrying HTTP transport |
//! | [`auth`] | OAuth2 access tokens |
//! | [`catalog`] | Catalog client and response parsing |
//! | [`cache`] | TTL cache of search results |
//! | [`resolver`] | Term → product resolution |
//! | [`app`] | Service wiring |
//! | [`server`] | HTTP server |
//! | [`rank`] | Offline scoring and rule inspection |
//! | [`resolve_cmd`] | Online CLI commands |
//! | [`stats`] | Store statistics |
//!
//! [`KvStore`]: grocer_core::store::KvStore

pub mod app;
pub mod auth;
pub mod breaker;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod governor;
pub mod logging;
pub mod migrate;
pub mod queue;
pub mod rank;
pub mod resolve_cmd;
pub mod resolver;
pub mod server;
pub mod sqlite_store;
pub mod stats;
pub mod transport;
