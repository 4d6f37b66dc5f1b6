//! HTTP API for the compose manager.

pub mod dto;
pub mod server;

pub use server::start_api_server;
