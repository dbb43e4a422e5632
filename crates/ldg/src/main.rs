//! One-shot CLI host for the leave/delete guard.
//!
//! Wires the NapCat control plane into the core guard and runs a single
//! `/ldg` debug command from argv, e.g.:
//!
//! ```text
//! ldg --actor 1001 --group 123 /ldg leave
//! ldg --actor 1001 --user 42 /ldg delete force
//! ldg --actor 1001 --group 123 /ldg dryrun on
//! ```
//!
//! Exit codes: 0 on success, 1 on refusal or failure, 2 on usage errors.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use ldg_core::{
    audit::AuditLogger,
    command::{CommandHandler, CommandReply, CommandStatus},
    config::Config,
    domain::ActionContext,
    dry_run::DryRunOverride,
    guard::Guard,
};
use ldg_napcat::NapcatClient;

const USAGE: &str =
    "usage: ldg --actor <user_id> (--group <group_id> | --user <user_id>) [command ...]";

struct Invocation {
    actor_user_id: String,
    context: ActionContext,
    text: String,
}

fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut actor: Option<String> = None;
    let mut group: Option<String> = None;
    let mut user: Option<String> = None;
    let mut rest: Vec<String> = Vec::new();

    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--actor" => actor = Some(it.next().cloned().ok_or("--actor needs a value")?),
            "--group" => group = Some(it.next().cloned().ok_or("--group needs a value")?),
            "--user" => user = Some(it.next().cloned().ok_or("--user needs a value")?),
            _ => rest.push(arg.clone()),
        }
    }

    let Some(actor_user_id) = actor else {
        return Err("--actor is required".to_string());
    };

    let context = match (group, user) {
        (Some(_), Some(_)) => return Err("--group and --user are mutually exclusive".to_string()),
        (Some(g), None) => ActionContext::group(g),
        (None, Some(u)) => ActionContext::private(u),
        (None, None) => return Err("one of --group or --user is required".to_string()),
    };

    // No command text means "show me the help".
    let text = if rest.is_empty() {
        "/ldg".to_string()
    } else {
        rest.join(" ")
    };

    Ok(Invocation {
        actor_user_id,
        context,
        text,
    })
}

async fn run(invocation: Invocation) -> anyhow::Result<CommandReply> {
    ldg_core::logging::init("ldg")?;

    let config = Config::load().context("failed to load configuration")?;

    let dry_run = Arc::new(DryRunOverride::new());
    let guard = Guard::new(Arc::new(NapcatClient::new()), dry_run.clone());
    let audit = AuditLogger::new(config.audit_log_path.clone(), config.audit_log_json);
    let handler = CommandHandler::new(guard, dry_run, audit);

    let reply = handler
        .handle(
            &invocation.text,
            &invocation.actor_user_id,
            &invocation.context,
            &config.policy(),
        )
        .await;

    Ok(reply)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match parse_args(&args) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(invocation).await {
        Ok(reply) => {
            println!("{}", reply.text);
            match reply.status {
                CommandStatus::Ok => ExitCode::SUCCESS,
                CommandStatus::Refused => ExitCode::from(1),
                CommandStatus::Usage => ExitCode::from(2),
            }
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}
