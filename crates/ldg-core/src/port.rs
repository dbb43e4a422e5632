use async_trait::async_trait;

use crate::domain::RemoteEndpoint;

/// Outcome of one control-plane call.
///
/// `ok` only says the transport and protocol succeeded (HTTP 2xx and a
/// well-formed body reporting `status == "ok"`); whether the call was
/// *allowed* at all is the evaluator's business. `raw` carries the parsed
/// response object when one existed, even for remote-reported failures.
#[derive(Clone, Debug)]
pub struct CallOutcome {
    pub ok: bool,
    pub detail: String,
    pub raw: Option<serde_json::Value>,
}

impl CallOutcome {
    pub fn success(raw: serde_json::Value) -> Self {
        Self {
            ok: true,
            detail: "ok".to_string(),
            raw: Some(raw),
        }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
            raw: None,
        }
    }

    pub fn remote_failure(detail: impl Into<String>, raw: serde_json::Value) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
            raw: Some(raw),
        }
    }
}

/// Port for the remote action invoker.
///
/// The HTTP implementation lives in the `ldg-napcat` adapter crate; tests
/// swap in a recording fake so the evaluator can be exercised without
/// network access. One call means exactly one attempt: retries, if ever
/// wanted, belong to the caller.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn invoke(
        &self,
        endpoint: &RemoteEndpoint,
        remote_action: &str,
        payload: serde_json::Value,
    ) -> CallOutcome;
}
