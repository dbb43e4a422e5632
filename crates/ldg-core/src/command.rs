use std::sync::Arc;

use regex::Regex;

use crate::{
    audit::{AuditEvent, AuditLogger},
    domain::{ActionContext, GuardRequest},
    dry_run::DryRunOverride,
    guard::{Guard, GuardResult},
    policy::GuardPolicy,
};

/// How the host should treat a handled command.
///
/// `Usage` covers malformed invocations; `Refused` covers permission
/// denials and guard rejections (including a failed remote call).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    Refused,
    Usage,
}

#[derive(Clone, Debug)]
pub struct CommandReply {
    pub status: CommandStatus,
    pub text: String,
}

impl CommandReply {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Ok,
            text: text.into(),
        }
    }

    fn refused(text: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Refused,
            text: text.into(),
        }
    }

    fn usage(text: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Usage,
            text: text.into(),
        }
    }
}

/// Developer debug command: `/ldg help|leave|delete|dryrun [force|on|off]`.
///
/// Platform-free: the host hands in the raw message text, the actor id and
/// the chat context it already knows, and gets back one reply. Every guard
/// decision and every override flip taken through here lands in the audit
/// log; audit write failures are reported to stderr and otherwise ignored.
pub struct CommandHandler {
    guard: Guard,
    dry_run: Arc<DryRunOverride>,
    audit: AuditLogger,
}

impl CommandHandler {
    pub fn new(guard: Guard, dry_run: Arc<DryRunOverride>, audit: AuditLogger) -> Self {
        Self {
            guard,
            dry_run,
            audit,
        }
    }

    /// Strict recognizer for hosts that dispatch on whole-message patterns.
    ///
    /// Deliberately narrower than [`handle`](Self::handle), which lowercases
    /// subcommands and answers malformed `/ldg ...` lines with usage errors.
    pub fn matches(text: &str) -> bool {
        let re = Regex::new(r"^/ldg(?:\s+(help|leave|delete|dryrun)(?:\s+(force|on|off))?)?\s*$")
            .expect("valid regex");
        re.is_match(text.trim())
    }

    pub async fn handle(
        &self,
        text: &str,
        actor_user_id: &str,
        context: &ActionContext,
        policy: &GuardPolicy,
    ) -> CommandReply {
        let text = text.trim();
        let parts: Vec<&str> = text.split_whitespace().collect();
        if parts.first() != Some(&"/ldg") {
            return CommandReply::usage("not an /ldg command");
        }

        // Whitelist gate comes before everything else, help included.
        if !policy.is_whitelisted(actor_user_id) {
            return CommandReply::refused(
                "no permission: /ldg is restricted to developer_whitelist users",
            );
        }

        if parts.len() <= 1 || parts[1].eq_ignore_ascii_case("help") {
            return CommandReply::ok(help_text());
        }

        let subcmd = parts[1].to_lowercase();
        let arg1 = parts.get(2).map(|s| s.to_lowercase()).unwrap_or_default();
        if parts.len() > 3 {
            return CommandReply::usage("too many arguments, see /ldg help for the command format");
        }

        if subcmd == "dryrun" {
            if arg1 != "on" && arg1 != "off" {
                return CommandReply::usage("dryrun usage: /ldg dryrun on|off");
            }
            let value = arg1 == "on";
            self.dry_run.set(Some(value));
            self.write_audit(AuditEvent::dry_run_override(actor_user_id, value));
            return CommandReply::ok(format!(
                "runtime dry_run set to {} (current process only)",
                if value { "ON" } else { "OFF" }
            ));
        }

        if subcmd != "leave" && subcmd != "delete" {
            return CommandReply::usage("unknown subcommand, see /ldg help");
        }

        let mut force = false;
        if !arg1.is_empty() {
            if arg1 != "force" {
                return CommandReply::usage(format!(
                    "the {subcmd} subcommand only accepts the optional argument force"
                ));
            }
            force = true;
        }

        let reason = format!("command:{text}");
        let req = GuardRequest {
            action_type: subcmd,
            actor_user_id: actor_user_id.to_string(),
            context: context.clone(),
            force,
            reason: reason.clone(),
            source: "command".to_string(),
        };

        let result = self.guard.execute(req, policy).await;
        self.write_audit(AuditEvent::decision(actor_user_id, &reason, &result));

        let rendered = format_result(&result);
        if result.success {
            CommandReply::ok(rendered)
        } else {
            CommandReply::refused(rendered)
        }
    }

    fn write_audit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.write(event) {
            eprintln!("Failed to write audit log: {e}");
        }
    }
}

/// Multi-line result block sent back to the developer.
pub fn format_result(result: &GuardResult) -> String {
    format!(
        "[ldg] success={}\naction={}\ntarget={}\ndry_run={}\nexecuted={}\ndetail={}",
        result.success,
        result.action_type,
        result.target_id.as_deref().unwrap_or("N/A"),
        result.dry_run,
        result.executed,
        result.message
    )
}

fn help_text() -> String {
    [
        "leave/delete guard debug commands",
        "/ldg help",
        "/ldg leave [force]    # leave the current group chat",
        "/ldg delete [force]   # delete the current private-chat friend",
        "/ldg dryrun on|off    # set the process-local dry-run override",
        "note: restricted to developer_whitelist users.",
    ]
    .join("\n")
}
