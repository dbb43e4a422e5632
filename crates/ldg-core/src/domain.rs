/// The two high-risk actions this guard knows how to execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    /// Leave the current group chat (never dismissing it).
    Leave,
    /// Delete the current private-chat contact.
    Delete,
}

impl ActionKind {
    /// Parse an untrusted action-type string (trimmed, case-insensitive).
    ///
    /// Anything other than the literal `leave` / `delete` is unsupported and
    /// left to the caller to reject.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "leave" => Some(Self::Leave),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Leave => "leave",
            Self::Delete => "delete",
        }
    }

    /// Control-plane endpoint name for this action.
    pub fn remote_action(&self) -> &'static str {
        match self {
            Self::Leave => "set_group_leave",
            Self::Delete => "delete_friend",
        }
    }
}

/// Where the requested action would apply.
///
/// A group action can only ever target the group id and a private action can
/// only ever target the private peer; the enum makes a both-targets context
/// unrepresentable. Missing ids are kept as `None` so the evaluator can
/// reject them with a specific message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionContext {
    Group { group_id: Option<String> },
    Private { user_id: Option<String> },
}

impl ActionContext {
    /// Group-chat context; an empty id collapses to "no target".
    pub fn group(group_id: impl Into<String>) -> Self {
        Self::Group {
            group_id: non_empty(group_id.into()),
        }
    }

    /// Private-chat context; an empty id collapses to "no target".
    pub fn private(user_id: impl Into<String>) -> Self {
        Self::Private {
            user_id: non_empty(user_id.into()),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Control-plane endpoint descriptor.
///
/// The port is kept as a string and embedded verbatim in the request URL,
/// matching how hosts hand it to us from their own config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteEndpoint {
    pub host: String,
    pub port: String,
    pub token: String,
}

/// One guard invocation as handed over by the host.
///
/// All fields are untrusted on entry; the evaluator does its own
/// normalization and rejects anything it cannot vouch for.
#[derive(Clone, Debug)]
pub struct GuardRequest {
    /// Raw action type ("leave" / "delete", any casing or padding).
    pub action_type: String,
    /// Who is asking. Only used for whitelist membership.
    pub actor_user_id: String,
    pub context: ActionContext,
    pub force: bool,
    pub reason: String,
    /// Free-form provenance tag, e.g. "planner" or "command".
    pub source: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_parses_padded_and_cased_input() {
        assert_eq!(ActionKind::parse("  Leave "), Some(ActionKind::Leave));
        assert_eq!(ActionKind::parse("DELETE"), Some(ActionKind::Delete));
        assert_eq!(ActionKind::parse("kick"), None);
        assert_eq!(ActionKind::parse(""), None);
    }

    #[test]
    fn action_kind_maps_to_remote_actions() {
        assert_eq!(ActionKind::Leave.remote_action(), "set_group_leave");
        assert_eq!(ActionKind::Delete.remote_action(), "delete_friend");
    }

    #[test]
    fn empty_ids_collapse_to_no_target() {
        assert_eq!(
            ActionContext::group(""),
            ActionContext::Group { group_id: None }
        );
        assert_eq!(
            ActionContext::private(""),
            ActionContext::Private { user_id: None }
        );
        assert_eq!(
            ActionContext::group("123"),
            ActionContext::Group {
                group_id: Some("123".to_string())
            }
        );
    }
}
