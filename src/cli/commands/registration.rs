use clap::{builder::BoolishValueParser, Arg, ArgAction, Command};

pub const ARG_DISABLE_REGISTRATION: &str = "disable-registration";
pub const ARG_REGISTRATION_FIELDS: &str = "registration-fields";
pub const ARG_MIN_PASSWORD_LENGTH: &str = "min-password-length";
pub const ARG_RECOVERY_TOKEN_TTL_SECONDS: &str = "recovery-token-ttl-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DISABLE_REGISTRATION)
                .long(ARG_DISABLE_REGISTRATION)
                .help("Turn off self-registration")
                .env("REGISTRAR_DISABLE_REGISTRATION")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_REGISTRATION_FIELDS)
                .long(ARG_REGISTRATION_FIELDS)
                .help("Comma separated fields accepted from the registration form")
                .long_help(
                    "Comma separated fields accepted from the registration form. Defaults to FirstName,LastName,Gender,BirthDate,Username,Password,Email,Phone,Location,About",
                )
                .env("REGISTRAR_REGISTRATION_FIELDS")
                .value_delimiter(',')
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(ARG_MIN_PASSWORD_LENGTH)
                .long(ARG_MIN_PASSWORD_LENGTH)
                .help("Minimum password length for new accounts")
                .default_value("5")
                .env("REGISTRAR_MIN_PASSWORD_LENGTH")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new(ARG_RECOVERY_TOKEN_TTL_SECONDS)
                .long(ARG_RECOVERY_TOKEN_TTL_SECONDS)
                .help("Lifetime of password recovery tokens in seconds")
                .default_value("1800")
                .env("REGISTRAR_RECOVERY_TOKEN_TTL_SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
