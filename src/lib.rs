//! Whistle Documentation MCP Service
//!
//! This crate crawls the documentation site of the Whistle web debugging
//! proxy, caches the extracted sections on disk and serves them to MCP
//! clients through list, lookup and keyword search tools.
//!
//! # Features
//!
//! - Crawl the documentation index and every section page it links to
//! - Persist sections to a local cache directory with a one hour TTL
//! - Case-insensitive keyword search with context excerpts
//! - MCP server over stdio or SSE
//!
//! # Modules
//!
//! - [`docs_cache`]: The documentation cache and its refresh state machine
//! - [`extractor`]: Selector-driven HTML extraction of sections and content
//! - [`fetcher`]: HTTP retrieval of documentation pages
//! - [`store`]: On-disk per-section records
//! - [`search`]: Substring matching and excerpt building
//! - [`mcp`]: MCP server implementation and result rendering

pub mod clock;
pub mod config;
pub mod docs_cache;
pub mod extractor;
pub mod fetcher;
pub mod mcp;
pub mod search;
pub mod section;
pub mod server;
pub mod store;
