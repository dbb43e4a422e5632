use std::{
    collections::HashSet,
    env, fs,
    path::{Path, PathBuf},
};

use crate::{
    domain::RemoteEndpoint,
    policy::{GuardPolicy, PolicyMode, DEFAULT_MIN_REASON_LENGTH},
    Error, Result,
};

/// Typed configuration, loaded once at startup from `LDG_*` environment
/// variables (with an optional `.env` file for local runs).
///
/// Everything has a safe default: no whitelist, force allowed, dry-run off,
/// cautious mode, control plane at `127.0.0.1:3000` with no token.
#[derive(Clone, Debug)]
pub struct Config {
    // Policy
    pub mode: PolicyMode,
    pub developer_whitelist: HashSet<String>,
    pub allow_force: bool,
    pub default_dry_run: bool,
    pub min_reason_length: usize,

    // Control plane
    pub napcat_host: String,
    pub napcat_port: String,
    pub napcat_token: String,

    // Audit
    pub audit_log_path: PathBuf,
    pub audit_log_json: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Unknown mode strings are coerced here, exactly once, so the
        // evaluator only ever sees a typed mode.
        let mode = match env_str("LDG_MODE").and_then(trimmed_non_empty) {
            Some(raw) => PolicyMode::parse(&raw).unwrap_or_else(|| {
                let fallback = PolicyMode::default();
                eprintln!("unknown LDG_MODE value {raw:?}, using {}", fallback.as_str());
                fallback
            }),
            None => PolicyMode::default(),
        };

        let developer_whitelist = parse_csv_set(env_str("LDG_DEVELOPER_WHITELIST"));
        let allow_force = env_bool("LDG_ALLOW_FORCE").unwrap_or(true);
        let default_dry_run = env_bool("LDG_DEFAULT_DRY_RUN").unwrap_or(false);
        let min_reason_length = match env_str("LDG_MIN_REASON_LENGTH").and_then(trimmed_non_empty)
        {
            Some(raw) => parse_min_reason_length(&raw)?,
            None => DEFAULT_MIN_REASON_LENGTH,
        };

        // The port stays a string; it is embedded verbatim in the URL.
        let napcat_host = env_str("LDG_NAPCAT_HOST")
            .and_then(trimmed_non_empty)
            .unwrap_or_else(|| "127.0.0.1".to_string());
        let napcat_port = env_str("LDG_NAPCAT_PORT")
            .and_then(trimmed_non_empty)
            .unwrap_or_else(|| "3000".to_string());
        let napcat_token = env_str("LDG_NAPCAT_TOKEN").unwrap_or_default();

        let audit_log_path = PathBuf::from(
            env_str("LDG_AUDIT_LOG_PATH").unwrap_or("/tmp/ldg-audit.log".to_string()),
        );
        let audit_log_json = env_bool("LDG_AUDIT_LOG_JSON").unwrap_or(false);

        Ok(Self {
            mode,
            developer_whitelist,
            allow_force,
            default_dry_run,
            min_reason_length,
            napcat_host,
            napcat_port,
            napcat_token,
            audit_log_path,
            audit_log_json,
        })
    }

    /// Immutable policy snapshot for one evaluation.
    pub fn policy(&self) -> GuardPolicy {
        GuardPolicy {
            mode: self.mode,
            developer_whitelist: self.developer_whitelist.clone(),
            allow_force: self.allow_force,
            default_dry_run: self.default_dry_run,
            endpoint: RemoteEndpoint {
                host: self.napcat_host.clone(),
                port: self.napcat_port.clone(),
                token: self.napcat_token.clone(),
            },
            min_reason_length: self.min_reason_length,
        }
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

/// Tolerant boolean parsing: `1/true/yes/on` and `0/false/no/off` are
/// recognized (any casing, padded); anything else is `None` so the caller's
/// default applies.
fn parse_bool_like(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).as_deref().and_then(parse_bool_like)
}

/// Strict counterpart to the tolerant bool parsing: a value that is set but
/// not an integer fails the load. Only an unset or blank variable falls back
/// to the default.
fn parse_min_reason_length(raw: &str) -> Result<usize> {
    raw.parse::<usize>().map_err(|_| {
        Error::Config(format!(
            "LDG_MIN_REASON_LENGTH must be an integer, got {raw:?}"
        ))
    })
}

fn parse_csv_set(v: Option<String>) -> HashSet<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn trimmed_non_empty(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}
