//! Entry commands (ls, show, insert, rm, mv, cp).

use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;

use dialoguer::{Confirm, Password};
use tracing::info;

use crate::cli::{open_store, output};
use crate::core::context::Context;
use crate::core::domain::Secret;
use crate::error::Result;

/// List entries below `prefix`.
pub fn list(store: Option<PathBuf>, prefix: &str, json: bool) -> Result<()> {
    let store = open_store(store)?;
    let names = store.list(prefix)?;

    if json {
        let output = serde_json::json!({
            "entries": names,
            "count": names.len()
        });
        let text = serde_json::to_string_pretty(&output).map_err(io::Error::from)?;
        println!("{}", text);
    } else if names.is_empty() {
        output::dimmed("no entries");
    } else {
        for name in names {
            println!("{}", name);
        }
    }
    Ok(())
}

/// Print an entry, or only its password line.
pub fn show(ctx: &Context, store: Option<PathBuf>, name: &str, password_only: bool) -> Result<()> {
    let store = open_store(store)?;
    let secret = store.get(ctx, name)?;

    let mut stdout = io::stdout().lock();
    if password_only {
        writeln!(stdout, "{}", secret.password())?;
    } else {
        stdout.write_all(&secret.to_bytes())?;
        if !secret.body().is_empty() && !secret.body().ends_with('\n') {
            writeln!(stdout)?;
        }
    }
    Ok(())
}

/// Store an entry from a hidden prompt or from stdin.
pub fn insert(ctx: &Context, store: Option<PathBuf>, name: &str, multiline: bool) -> Result<()> {
    let store = open_store(store)?;
    let interactive = io::stdin().is_terminal();

    if interactive && store.exists(name) {
        output::warn(&format!("{} already exists", output::name(name)));
        let overwrite = Confirm::new()
            .with_prompt("Overwrite?")
            .default(false)
            .interact()?;
        if !overwrite {
            return Ok(());
        }
    }

    let secret = if multiline {
        let mut input = Vec::new();
        io::stdin().read_to_end(&mut input)?;
        Secret::parse(name, &input)?
    } else if interactive {
        let password = Password::new()
            .with_prompt(format!("Password for {}", output::name(name)))
            .with_confirmation("Retype", "passwords do not match")
            .interact()?;
        Secret::new(password, "")
    } else {
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Secret::new(line.trim_end_matches(&['\r', '\n'][..]), "")
    };

    store.set(ctx, name, &secret)?;
    info!(name, "entry saved");
    output::success(&format!("saved {}", output::name(name)));
    Ok(())
}

/// Remove an entry, or a whole subtree with `recursive`.
pub fn rm(ctx: &Context, store: Option<PathBuf>, name: &str, recursive: bool) -> Result<()> {
    let store = open_store(store)?;
    if recursive {
        store.prune(ctx, name)?;
    } else {
        store.delete(ctx, name)?;
    }
    output::success(&format!("removed {}", output::name(name)));
    Ok(())
}

/// Move an entry or subtree.
pub fn mv(ctx: &Context, store: Option<PathBuf>, from: &str, to: &str) -> Result<()> {
    let store = open_store(store)?;
    store.rename(ctx, from, to)?;
    output::success(&format!("moved {} to {}", output::name(from), output::name(to)));
    Ok(())
}

/// Copy an entry or subtree.
pub fn cp(ctx: &Context, store: Option<PathBuf>, from: &str, to: &str) -> Result<()> {
    let store = open_store(store)?;
    store.copy(ctx, from, to)?;
    output::success(&format!("copied {} to {}", output::name(from), output::name(to)));
    Ok(())
}
