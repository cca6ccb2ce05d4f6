pub mod auth;
pub mod cache;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ArgGroup, ColorChoice, Command,
};

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_PUBLIC_KEY_FILE: &str = "public-key-file";
pub const ARG_PRIVATE_KEY_FILE: &str = "private-key-file";
pub const ARG_SESSION_TOKEN: &str = "session-token";
pub const ARG_AUTH_TOKEN: &str = "auth-token";
pub const ARG_CODE_ID: &str = "code-id";
pub const ARG_SIGNATURE: &str = "signature";
pub const ARG_BITS: &str = "bits";
pub const ARG_OUT_DIR: &str = "out-dir";

fn email() -> Arg {
    Arg::new(ARG_EMAIL)
        .long(ARG_EMAIL)
        .help("Account email")
        .env("KEYWARD_EMAIL")
        .required(true)
}

fn password() -> Arg {
    Arg::new(ARG_PASSWORD)
        .long(ARG_PASSWORD)
        .help("Account password")
        .env("KEYWARD_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

fn session_token() -> Arg {
    Arg::new(ARG_SESSION_TOKEN)
        .long(ARG_SESSION_TOKEN)
        .help("Session Token returned by sign-in")
        .env("KEYWARD_SESSION_TOKEN")
        .hide_env_values(true)
        .required(true)
}

fn auth_token() -> Arg {
    Arg::new(ARG_AUTH_TOKEN)
        .long(ARG_AUTH_TOKEN)
        .help("Auth Token returned by sign-in or refresh")
        .env("KEYWARD_AUTH_TOKEN")
        .hide_env_values(true)
        .required(true)
}

fn code_id() -> Arg {
    Arg::new(ARG_CODE_ID)
        .long(ARG_CODE_ID)
        .help("Refresh code id returned by generate-code")
        .required(true)
}

fn private_key_file() -> Arg {
    Arg::new(ARG_PRIVATE_KEY_FILE)
        .long(ARG_PRIVATE_KEY_FILE)
        .help("PEM private key (PKCS#8 or PKCS#1) matching the session public key")
}

fn subcommands() -> Vec<Command> {
    vec![
        Command::new("sign-up")
            .about("Create a user and register its password")
            .arg(email())
            .arg(password()),
        Command::new("sign-in")
            .about("Sign in and open a session bound to a public key")
            .arg(email())
            .arg(password())
            .arg(
                Arg::new(ARG_PUBLIC_KEY_FILE)
                    .long(ARG_PUBLIC_KEY_FILE)
                    .help("RSA public key (PEM, SPKI or PKCS#1) used to sign refresh codes")
                    .required(true),
            ),
        Command::new("sign-out")
            .about("Delete the session and its auth")
            .arg(session_token())
            .arg(auth_token()),
        Command::new("verify")
            .about("Check that a token pair is currently authorized")
            .arg(session_token())
            .arg(auth_token()),
        Command::new("generate-code")
            .about("Issue a refresh code for a session")
            .arg(session_token()),
        Command::new("refresh")
            .about("Redeem a signed refresh code for a new Auth Token")
            .arg(session_token())
            .arg(code_id())
            .arg(
                Arg::new(ARG_SIGNATURE)
                    .long(ARG_SIGNATURE)
                    .help("Base64 RSA-PSS signature over the code id"),
            )
            .arg(private_key_file().help("Sign the code id with this key instead of --signature"))
            .group(
                ArgGroup::new("proof")
                    .args([ARG_SIGNATURE, ARG_PRIVATE_KEY_FILE])
                    .required(true),
            ),
        Command::new("sessions").about("List live session ids"),
        Command::new("keygen")
            .about("Generate a client key pair")
            .arg(
                Arg::new(ARG_BITS)
                    .long(ARG_BITS)
                    .help("RSA modulus size")
                    .default_value("2048")
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                Arg::new(ARG_OUT_DIR)
                    .long(ARG_OUT_DIR)
                    .help("Directory for client_key.pem and client_key.pub.pem")
                    .default_value("."),
            ),
        Command::new("sign-code")
            .about("Sign a refresh code id with a client private key")
            .arg(code_id())
            .arg(private_key_file().required(true)),
    ]
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("keyward")
        .about("Challenge-response session and authorization service")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommands(subcommands());

    let command = cache::with_args(command);
    let command = auth::with_args(command);
    logging::with_args(command)
}
