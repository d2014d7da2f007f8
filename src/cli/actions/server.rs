use crate::{
    api::{self, AppState},
    memory::{LogNotifier, MemorySessionStore, MemoryTokenIssuer, MemoryUserStore},
    registrar::{
        Notifier, RecoveryWorkflow, RegistrationConfig, RegistrationWorkflow, SessionStore,
        TokenIssuer, UserStore,
    },
};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub frontend_base_url: String,
    pub session_ttl_seconds: u64,
    pub registration_enabled: bool,
    pub registration_fields: Option<Vec<String>>,
    pub min_password_length: usize,
    pub recovery_token_ttl_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the frontend URL is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let state = build_state(&args);

    api::new(args.port, state, &args.frontend_base_url).await
}

/// Wire the in-memory stores into both workflows.
pub(crate) fn build_state(args: &Args) -> AppState {
    let mut config = RegistrationConfig::new().with_enabled(args.registration_enabled);
    if let Some(fields) = &args.registration_fields {
        config = config.with_fields(fields.iter().cloned());
    }

    let users: Arc<dyn UserStore> =
        Arc::new(MemoryUserStore::new().with_min_password_length(args.min_password_length));
    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(Duration::from_secs(
        args.session_ttl_seconds,
    )));
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
    let tokens: Arc<dyn TokenIssuer> = Arc::new(
        MemoryTokenIssuer::new(notifier.clone(), args.frontend_base_url.clone())
            .with_ttl(Duration::from_secs(args.recovery_token_ttl_seconds)),
    );

    let registration = RegistrationWorkflow::new(config, users.clone(), sessions.clone(), notifier);
    let recovery = RecoveryWorkflow::new(users, tokens);

    AppState::new(registration, recovery, sessions)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_secure_cookies(args.frontend_base_url.starts_with("https://"))
}

fn log_startup_args(args: &Args) {
    let fields = args
        .registration_fields
        .as_ref()
        .map_or_else(|| "default".to_string(), |fields| fields.join(","));
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("frontend_base_url", args.frontend_base_url.clone()),
        ("registration_enabled", args.registration_enabled.to_string()),
        ("registration_fields", fields),
        ("min_password_length", args.min_password_length.to_string()),
        ("session_ttl_seconds", args.session_ttl_seconds.to_string()),
        (
            "recovery_token_ttl_seconds",
            args.recovery_token_ttl_seconds.to_string(),
        ),
    ];
    log_entries("Startup configuration", &entries);
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "registrar {} - {}\n\n{title}:",
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
