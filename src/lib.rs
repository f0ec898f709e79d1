//! MCP server for Confluence.
//!
//! Exposes Confluence search, page, and space operations plus credential
//! setup as MCP tools and resources over JSON-RPC 2.0 stdio transport,
//! compatible with any MCP-aware AI agent.

pub mod auth;
pub mod client;
pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod store;

pub mod schema;
