//! selcdn - upload files to Selectel Cloud Storage and print their public URL.
//!
//! Every upload is verified with a HEAD request after the PUT, against the
//! attached CDN domain when one is configured.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use selcdn_core::config::ENV_AUTH_KEY;
use selcdn_core::{Config, CredentialStore, SessionStore, StorageClient};

/// Directory for optional log files
const ENV_LOG_DIR: &str = "SELCDN_LOG_DIR";

const USAGE: &str = "\
Usage:
  selcdn login
  selcdn upload <file> <remote-path> [-H Name:Value]...
  selcdn logout";

/// Initialize the tracing subscriber for logging.
///
/// The returned guard must stay alive for file logs to be flushed.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(ENV_LOG_DIR) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(PathBuf::from(dir), "selcdn.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("login") => login(),
        Some("logout") => logout(),
        Some("upload") => upload(&args[1..]).await,
        Some("-h") | Some("--help") | Some("help") => {
            println!("{}", USAGE);
            Ok(())
        }
        _ => bail!("{}", USAGE),
    }
}

/// Ask for account details, keep the key in the keychain and the rest in config.
fn login() -> Result<()> {
    let mut config = Config::load()?;

    let auth_user = prompt("Auth user", config.auth_user.as_deref())?;
    let container = prompt("Container", config.container_name.as_deref())?;
    let domain = prompt("Attached domain (optional)", config.attached_domain.as_deref())?;
    let auth_key = rpassword::prompt_password("Auth key: ").context("Failed to read auth key")?;
    if auth_user.is_empty() || container.is_empty() || auth_key.is_empty() {
        bail!("Auth user, container and key are required");
    }

    CredentialStore::store(&auth_user, &auth_key)?;
    config.auth_user = Some(auth_user);
    config.container_name = Some(container);
    config.attached_domain = if domain.is_empty() { None } else { Some(domain) };
    config.save()?;

    info!(user = ?config.auth_user, "Credentials saved");
    eprintln!("Saved. Run `selcdn upload <file> <remote-path>` to upload.");
    Ok(())
}

fn logout() -> Result<()> {
    let config = Config::load()?;
    let Some(ref auth_user) = config.auth_user else {
        eprintln!("Not logged in.");
        return Ok(());
    };

    SessionStore::new(config.cache_dir()?).clear()?;
    if CredentialStore::has_key(auth_user) {
        CredentialStore::delete(auth_user)?;
    }
    eprintln!("Removed stored key and session for {}.", auth_user);
    Ok(())
}

async fn upload(args: &[String]) -> Result<()> {
    let (file, remote_path, headers) = parse_upload_args(args)?;

    let config = Config::load()?.with_env_overrides();
    let auth_key = match std::env::var(ENV_AUTH_KEY) {
        Ok(key) if !key.is_empty() => key,
        _ => {
            let user = config
                .auth_user
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("No auth user configured. Run `selcdn login` first."))?;
            CredentialStore::get_key(user)?
        }
    };
    let credentials = config.credentials(&auth_key)?;

    let content = std::fs::read(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let session_store = SessionStore::new(config.cache_dir()?);
    let mut client = StorageClient::new(credentials)?.with_auth_url(config.auth_url());
    match session_store.load() {
        Ok(Some(data)) => {
            debug!(expires_in = data.seconds_until_expiry(), "Reusing cached session");
            client = client.with_session(data);
        }
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Ignoring unreadable session cache"),
    }

    let url = client.upload(&content, &remote_path, &headers).await?;

    if let Some(data) = client.session().data() {
        if let Err(e) = session_store.save(data) {
            warn!(error = %e, "Failed to cache session");
        }
    }

    println!("{}", url);
    Ok(())
}

fn parse_upload_args(args: &[String]) -> Result<(PathBuf, String, HashMap<String, String>)> {
    let mut positional = Vec::new();
    let mut headers = HashMap::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-H" || arg == "--header" {
            let raw = iter
                .next()
                .ok_or_else(|| anyhow::anyhow!("{} requires a Name:Value argument", arg))?;
            let (name, value) = raw
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("Header {:?} must look like Name:Value", raw))?;
            headers.insert(name.trim().to_string(), value.trim().to_string());
        } else {
            positional.push(arg.as_str());
        }
    }

    match positional.as_slice() {
        [file, remote] => Ok((PathBuf::from(file), remote.to_string(), headers)),
        _ => bail!("{}", USAGE),
    }
}

fn prompt(label: &str, current: Option<&str>) -> Result<String> {
    match current {
        Some(value) => eprint!("{} [{}]: ", label, value),
        None => eprint!("{}: ", label),
    }
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();
    if line.is_empty() {
        Ok(current.unwrap_or_default().to_string())
    } else {
        Ok(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_upload_args_with_headers() {
        let (file, remote, headers) = parse_upload_args(&args(&[
            "-H",
            "Content-Type: image/png",
            "logo.png",
            "--header",
            "X-Delete-After:3600",
            "static/logo.png",
        ]))
        .unwrap();

        assert_eq!(file, PathBuf::from("logo.png"));
        assert_eq!(remote, "static/logo.png");
        assert_eq!(headers.get("Content-Type").map(String::as_str), Some("image/png"));
        assert_eq!(headers.get("X-Delete-After").map(String::as_str), Some("3600"));
    }

    #[test]
    fn test_parse_upload_args_rejects_bad_input() {
        assert!(parse_upload_args(&args(&["only-one"])).is_err());
        assert!(parse_upload_args(&args(&["a", "b", "-H"])).is_err());
        assert!(parse_upload_args(&args(&["a", "b", "-H", "NoColon"])).is_err());
    }
}
