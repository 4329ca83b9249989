//! LLM-backed code review service.
//!
//! Accepts a code snippet over HTTP, asks a single reviewer agent for
//! improvement suggestions, and keeps every analysis in Postgres.

pub mod agent;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod llm;
pub mod logging;
pub mod service;
