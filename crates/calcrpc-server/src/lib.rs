//! calcrpc Server
//!
//! This crate provides the operation servers. Each server plays one
//! [`ServerRole`](calcrpc_common::ServerRole), answers one command per
//! connection and keeps its own file-backed result cache.

pub mod engine;
pub mod handler;
pub mod news;
pub mod server;

pub use engine::{OperationEngine, PrimePool};
pub use handler::CommandHandler;
pub use news::HeadlineScraper;
pub use server::OperationServer;
