use std::sync::atomic::{AtomicU8, Ordering};

// Tri-state encoding: the override either does not exist or pins dry-run to
// an explicit value.
const UNSET: u8 = 0;
const FORCED_OFF: u8 = 1;
const FORCED_ON: u8 = 2;

/// Process-wide runtime dry-run override.
///
/// Starts unset; flipped only by an explicit admin command (see
/// [`crate::command`]); read exactly once per evaluation. Single writer,
/// many readers, so a lone atomic cell is all the synchronization the guard
/// needs. The store is injected into [`crate::guard::Guard`] rather than
/// read from ambient state.
#[derive(Debug, Default)]
pub struct DryRunOverride {
    state: AtomicU8,
}

impl DryRunOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: Option<bool>) {
        let encoded = match value {
            None => UNSET,
            Some(false) => FORCED_OFF,
            Some(true) => FORCED_ON,
        };
        self.state.store(encoded, Ordering::SeqCst);
    }

    pub fn get(&self) -> Option<bool> {
        match self.state.load(Ordering::SeqCst) {
            FORCED_OFF => Some(false),
            FORCED_ON => Some(true),
            _ => None,
        }
    }

    pub fn clear(&self) {
        self.set(None);
    }
}

/// Dry-run precedence: an override, when present, always wins over the
/// configured default, for both `true` and `false`.
pub fn effective_dry_run(default_dry_run: bool, forced: Option<bool>) -> bool {
    forced.unwrap_or(default_dry_run)
}
