//! Login, logout and whoami handlers

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use tracing::warn;

use devtrack_core::{SessionOracle, Tracker};

use super::with_hint;
use crate::output::{Output, OutputFormat};

/// Sign in with a bearer token
///
/// The token comes from `--token` or, when omitted, from stdin. A token the
/// backend rejects is not kept. Once the profile is read the login stands,
/// even if the device refresh after it fails.
pub async fn login(tracker: &Tracker, token: Option<String>, output: &Output) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => read_token(io::stdin().lock())?,
    };
    let token = token.trim();
    if token.is_empty() {
        bail!("Token must not be empty");
    }

    let report = match tracker.lifecycle().login(token).await {
        Ok(report) => report,
        Err(e) => {
            if e.is_unauthorized() {
                if let Err(clear_err) = tracker.session().clear() {
                    warn!("Failed to discard rejected token: {:#}", clear_err);
                }
            }
            return Err(with_hint(e));
        }
    };

    match output.format {
        OutputFormat::Json => output.print_json(&report),
        OutputFormat::Quiet => println!("{}", report.username),
        OutputFormat::Human => match &report.devices {
            Some(devices) => output.success(&format!(
                "Logged in as {} ({} device(s))",
                report.username, devices.device_count
            )),
            None => output.success(&format!("Logged in as {}", report.username)),
        },
    }
    if let Some(e) = &report.refresh_error {
        output.warn(&format!("Could not refresh devices: {}", e));
    }
    Ok(())
}

/// Sign out and show what the public feed holds
pub async fn logout(tracker: &Tracker, output: &Output) -> Result<()> {
    let report = tracker.lifecycle().logout().await.map_err(with_hint)?;

    match output.format {
        OutputFormat::Json => output.print_json(&report),
        _ => output.success(&format!(
            "Logged out ({} public device(s))",
            report.device_count
        )),
    }
    Ok(())
}

/// Show the signed-in user
pub async fn whoami(tracker: &Tracker, output: &Output) -> Result<()> {
    let username = tracker.lifecycle().restore().await.map_err(with_hint)?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "authenticated": tracker.session().is_authenticated(),
                    "username": username
                })
            );
        }
        OutputFormat::Quiet => {
            if let Some(username) = username {
                println!("{}", username);
            }
        }
        OutputFormat::Human => match username {
            Some(username) => println!("Logged in as {}", username),
            None => println!("Not logged in (anonymous mode)"),
        },
    }
    Ok(())
}

/// Read a token from the first line of `input`, prompting on a terminal
fn read_token(mut input: impl BufRead) -> Result<String> {
    if atty::is(atty::Stream::Stdin) {
        print!("Token: ");
        io::stdout().flush()?;
    }

    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read token from stdin")?;
    Ok(line.trim().to_string())
}
