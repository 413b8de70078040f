use async_trait::async_trait;
use calcrpc_common::{Command, OperationResult};

use crate::engine::OperationEngine;

/// Something that turns a parsed command into a result.
///
/// [`OperationServer`](crate::OperationServer) only sees this trait, so the
/// engine and external collaborators such as the headline scraper plug in
/// the same way.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, command: &Command) -> OperationResult;
}

#[async_trait]
impl CommandHandler for OperationEngine {
    async fn handle(&self, command: &Command) -> OperationResult {
        self.execute(command).await
    }
}
