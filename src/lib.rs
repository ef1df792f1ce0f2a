//! folio library
//!
//! Cached, retrying access to a portfolio's blog and project API, plus the
//! text renderers and CLI parsing used by the `folio` binary.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod refresh;
pub mod render;
