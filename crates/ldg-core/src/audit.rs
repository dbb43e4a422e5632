use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{errors::Error, guard::GuardResult, Result};

const AUDIT_MAX_TEXT: usize = 500;

/// RFC3339 timestamp in UTC (for logs/telemetry).
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

/// One audit record: either a guard decision or a runtime override flip.
///
/// Flat optional schema so both event kinds serialize through the same
/// struct; absent fields are skipped entirely in the JSON form.
#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<bool>,
}

impl AuditEvent {
    /// Record the outcome of one guard invocation, pass or reject.
    pub fn decision(actor_user_id: &str, reason: &str, result: &GuardResult) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: "decision".to_string(),
            actor_user_id: Some(actor_user_id.to_string()),
            source: Some(result.source.clone()),
            action_type: Some(result.action_type.clone()),
            target_id: result.target_id.clone(),
            success: Some(result.success),
            executed: Some(result.executed),
            dry_run: Some(result.dry_run),
            message: Some(result.message.clone()),
            reason: Some(reason.to_string()),
            value: None,
        }
    }

    /// Record a runtime dry-run override change.
    pub fn dry_run_override(actor_user_id: &str, value: bool) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: "dry_run_override".to_string(),
            actor_user_id: Some(actor_user_id.to_string()),
            source: Some("command".to_string()),
            action_type: None,
            target_id: None,
            success: None,
            executed: None,
            dry_run: None,
            message: None,
            reason: None,
            value: Some(value),
        }
    }
}

/// Append-only audit trail, one event per write.
///
/// `json` selects JSON-lines output; otherwise a plain key/value block is
/// written for eyeball debugging. Callers treat failures as best-effort:
/// a full disk must never block the guard itself.
#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        // Truncate the free-text fields; ids and flags stay as-is.
        if let Some(s) = &event.message {
            event.message = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }
        if let Some(s) = &event.reason {
            event.reason = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            out.push_str(&json_value_to_display(v));
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}

fn json_value_to_display(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::Null => "null".to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.to_string(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "<unprintable>".to_string()),
    }
}
