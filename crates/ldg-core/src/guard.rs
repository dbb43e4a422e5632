use std::sync::Arc;

use serde_json::json;

use crate::{
    domain::{ActionContext, ActionKind, GuardRequest},
    dry_run::{effective_dry_run, DryRunOverride},
    policy::{GuardPolicy, PolicyMode},
    port::ControlPlane,
};

/// Outcome record for one guard invocation.
///
/// Constructed once per call and never mutated; the host renders it (chat
/// reply, log line) however it likes. `executed` is true only when the
/// remote call was actually made and succeeded.
#[derive(Clone, Debug)]
pub struct GuardResult {
    pub success: bool,
    pub message: String,
    /// Normalized action name, or the invalid input echoed back.
    pub action_type: String,
    pub target_id: Option<String>,
    /// Provenance tag copied from the request, e.g. "planner" or "command".
    pub source: String,
    pub executed: bool,
    pub dry_run: bool,
}

impl GuardResult {
    fn rejected(
        message: impl Into<String>,
        action_type: impl Into<String>,
        target_id: Option<String>,
        source: &str,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            action_type: action_type.into(),
            target_id,
            source: source.to_string(),
            executed: false,
            dry_run: false,
        }
    }
}

/// Normalize an untrusted reason string: trim; blank stays empty.
///
/// Idempotent, and the length gate below counts characters on the
/// normalized value (so CJK reasons count per character, not per byte).
pub fn normalize_reason(reason: &str) -> String {
    reason.trim().to_string()
}

/// Resolve the concrete target for an action, enforcing the cross-context
/// invariant: a leave can only target the current group, a delete can only
/// target the current private peer.
fn resolve_target(kind: ActionKind, context: &ActionContext) -> Result<String, &'static str> {
    match (kind, context) {
        (ActionKind::Leave, ActionContext::Group { group_id }) => match group_id {
            Some(id) if !id.is_empty() => Ok(id.clone()),
            _ => Err("not a group context, refusing to leave the group"),
        },
        (ActionKind::Leave, ActionContext::Private { .. }) => {
            Err("not a group context, refusing to leave the group")
        }
        (ActionKind::Delete, ActionContext::Group { .. }) => {
            Err("group context, refusing to delete a friend")
        }
        (ActionKind::Delete, ActionContext::Private { user_id }) => match user_id {
            Some(id) if !id.is_empty() => Ok(id.clone()),
            _ => Err("missing private chat target, refusing to delete a friend"),
        },
    }
}

/// Wire payload for the control-plane call (bit-exact contract).
fn payload_for(kind: ActionKind, target_id: &str) -> serde_json::Value {
    match kind {
        ActionKind::Leave => json!({ "group_id": target_id, "is_dismiss": false }),
        ActionKind::Delete => json!({ "user_id": target_id }),
    }
}

/// The guarded high-risk action executor.
///
/// Walks an explicit gate sequence (action type, cross-context, reason,
/// force, dry-run) and only then lets the control plane do the irreversible
/// part. Every path, including every rejection, comes back as a
/// [`GuardResult`]; this method does not return errors and must never panic
/// on any input.
pub struct Guard {
    control_plane: Arc<dyn ControlPlane>,
    dry_run: Arc<DryRunOverride>,
}

impl Guard {
    pub fn new(control_plane: Arc<dyn ControlPlane>, dry_run: Arc<DryRunOverride>) -> Self {
        Self {
            control_plane,
            dry_run,
        }
    }

    pub async fn execute(&self, req: GuardRequest, policy: &GuardPolicy) -> GuardResult {
        let normalized_reason = normalize_reason(&req.reason);

        // Gate 1: action type.
        let Some(kind) = ActionKind::parse(&req.action_type) else {
            let normalized = req.action_type.trim().to_lowercase();
            let echoed = if normalized.is_empty() {
                req.action_type.clone()
            } else {
                normalized
            };
            return GuardResult::rejected(
                format!("unsupported action type: {}", req.action_type),
                echoed,
                None,
                &req.source,
            );
        };

        // Gate 2: cross-context. Rejections here carry no target id because
        // no target was ever established.
        let target_id = match resolve_target(kind, &req.context) {
            Ok(id) => id,
            Err(message) => {
                return GuardResult::rejected(message, kind.as_str(), None, &req.source);
            }
        };

        // Gate 3: reason length, cautious mode only.
        if policy.mode == PolicyMode::Cautious
            && normalized_reason.chars().count() < policy.min_reason_length
        {
            return GuardResult::rejected(
                format!(
                    "cautious mode refused: reason must be at least {} characters",
                    policy.min_reason_length
                ),
                kind.as_str(),
                Some(target_id),
                &req.source,
            );
        }

        // Gate 4: force. The global switch is checked before the whitelist
        // so a disabled force never leaks whether an actor is whitelisted.
        if req.force && !policy.allow_force {
            return GuardResult::rejected(
                "force is disabled by the current configuration",
                kind.as_str(),
                Some(target_id),
                &req.source,
            );
        }
        if req.force && !policy.is_whitelisted(&req.actor_user_id) {
            return GuardResult::rejected(
                "force is restricted to the developer whitelist",
                kind.as_str(),
                Some(target_id),
                &req.source,
            );
        }

        // Gate 5: effective dry-run, runtime override first.
        let dry_run = effective_dry_run(policy.default_dry_run, self.dry_run.get());
        if dry_run {
            let reason_display = if normalized_reason.is_empty() {
                "N/A"
            } else {
                normalized_reason.as_str()
            };
            return GuardResult {
                success: true,
                message: format!(
                    "[dry-run] checks passed, would execute {} -> {}; source={}; force={}; reason={}",
                    kind.as_str(),
                    target_id,
                    req.source,
                    req.force,
                    reason_display
                ),
                action_type: kind.as_str().to_string(),
                target_id: Some(target_id),
                source: req.source,
                executed: false,
                dry_run: true,
            };
        }

        // Live path: one attempt against the control plane.
        let payload = payload_for(kind, &target_id);
        let outcome = self
            .control_plane
            .invoke(&policy.endpoint, kind.remote_action(), payload)
            .await;

        if !outcome.ok {
            return GuardResult::rejected(
                format!("failed to execute {}: {}", kind.as_str(), outcome.detail),
                kind.as_str(),
                Some(target_id),
                &req.source,
            );
        }

        GuardResult {
            success: true,
            message: format!("executed {}, target={}", kind.as_str(), target_id),
            action_type: kind.as_str().to_string(),
            target_id: Some(target_id),
            source: req.source,
            executed: true,
            dry_run: false,
        }
    }
}
