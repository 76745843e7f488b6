//! Cellar - a git-native, recipient-scoped encrypted secret store.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cellar::cli::output;
use cellar::cli::{execute, Cli};
use cellar::core::constants::LOG_ENV;
use cellar::error::ErrorKind;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("cellar=debug")
        } else {
            EnvFilter::new("cellar=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = execute(cli) {
        let suggestion = match e.kind() {
            ErrorKind::NoRecipients => {
                Some("add a recipient before saving secrets here: cellar recipients add <id>")
            }
            ErrorKind::UnknownRecipient => {
                Some("import the recipient's public key: cellar import-keys")
            }
            ErrorKind::DecryptionFailed => Some("you are not a recipient of this entry"),
            ErrorKind::NotFound => {
                Some("run: cellar ls, or cellar init to create a store")
            }
            ErrorKind::BackendUnavailable => {
                Some("check that the backend is installed, or run: cellar init")
            }
            ErrorKind::InvalidName => {
                Some("names are slash-separated, without leading dots or empty segments")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
