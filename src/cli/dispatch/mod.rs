use crate::cli::{
    actions::{server::Args, Action},
    commands::registration::{
        ARG_DISABLE_REGISTRATION, ARG_MIN_PASSWORD_LENGTH, ARG_RECOVERY_TOKEN_TTL_SECONDS,
        ARG_REGISTRATION_FIELDS,
    },
};
use anyhow::{bail, Context, Result};

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let frontend_base_url = matches
        .get_one::<String>("frontend-base-url")
        .cloned()
        .context("missing required argument: --frontend-base-url")?;

    let session_ttl_seconds = matches
        .get_one::<u64>("session-ttl-seconds")
        .copied()
        .context("missing required argument: --session-ttl-seconds")?;

    let registration_enabled = !matches
        .get_one::<bool>(ARG_DISABLE_REGISTRATION)
        .copied()
        .unwrap_or(false);

    let registration_fields = matches
        .get_many::<String>(ARG_REGISTRATION_FIELDS)
        .map(|values| {
            values
                .map(|field| field.trim().to_string())
                .filter(|field| !field.is_empty())
                .collect::<Vec<_>>()
        });
    if registration_fields.as_ref().is_some_and(Vec::is_empty) {
        bail!("--{ARG_REGISTRATION_FIELDS} must name at least one field");
    }

    let min_password_length = matches
        .get_one::<usize>(ARG_MIN_PASSWORD_LENGTH)
        .copied()
        .context("missing required argument: --min-password-length")?;

    let recovery_token_ttl_seconds = matches
        .get_one::<u64>(ARG_RECOVERY_TOKEN_TTL_SECONDS)
        .copied()
        .context("missing required argument: --recovery-token-ttl-seconds")?;

    Ok(Action::Server(Args {
        port,
        frontend_base_url,
        session_ttl_seconds,
        registration_enabled,
        registration_fields,
        min_password_length,
        recovery_token_ttl_seconds,
    }))
}
