use std::collections::HashSet;

use crate::domain::RemoteEndpoint;

/// Minimum reason length enforced in cautious mode unless configured
/// otherwise.
pub const DEFAULT_MIN_REASON_LENGTH: usize = 4;

/// Policy strictness.
///
/// Cautious additionally requires an explainable reason of at least
/// `min_reason_length` characters; normal mode skips that gate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PolicyMode {
    #[default]
    Cautious,
    Normal,
}

impl PolicyMode {
    /// Parse a mode string (trimmed, case-insensitive).
    ///
    /// `None` means the input was not one of the two known modes. This is
    /// the only place mode strings are interpreted; callers that need a
    /// fallback coerce to `PolicyMode::default()` themselves so the
    /// coercion (and any warning) happens exactly once, at config load.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "cautious" => Some(Self::Cautious),
            "normal" => Some(Self::Normal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cautious => "cautious",
            Self::Normal => "normal",
        }
    }
}

/// Immutable configuration snapshot for one evaluation.
///
/// Built by the host (normally from [`crate::config::Config::policy`]) right
/// before calling the guard; nothing in here changes mid-evaluation. The
/// runtime dry-run override deliberately lives outside this snapshot, in the
/// injected [`crate::dry_run::DryRunOverride`] store.
#[derive(Clone, Debug)]
pub struct GuardPolicy {
    pub mode: PolicyMode,
    /// Actor ids allowed to use `force` and the debug command.
    pub developer_whitelist: HashSet<String>,
    pub allow_force: bool,
    pub default_dry_run: bool,
    pub endpoint: RemoteEndpoint,
    pub min_reason_length: usize,
}

impl GuardPolicy {
    pub fn is_whitelisted(&self, actor_user_id: &str) -> bool {
        self.developer_whitelist.contains(actor_user_id)
    }
}
