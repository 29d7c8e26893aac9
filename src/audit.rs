use serde_json::Value;

use crate::{
    error::AppResult,
    store::{AuditEntry, AuditLog},
};

pub async fn log_audit<S: AuditLog + ?Sized>(
    store: &S,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    store
        .record_audit(AuditEntry {
            action: action.to_string(),
            resource: resource.map(str::to_string),
            metadata,
        })
        .await
}
