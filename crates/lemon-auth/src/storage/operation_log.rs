//! Audit trail for permission-guarded operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AuthResult;

/// One audited request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationLog {
    pub user_id: i64,
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub path: String,
    pub method: String,
    pub description: String,
    pub ip: String,
    /// Captured request body, empty when it was too large to buffer.
    pub body: String,
    pub success: bool,
}

/// Destination for operation logs.
///
/// Writes are best-effort: the middleware logs a failed write and carries on.
#[async_trait]
pub trait OperationLogSink: Send + Sync {
    async fn record(&self, entry: OperationLog) -> AuthResult<()>;
}
