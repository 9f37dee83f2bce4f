#![deny(unsafe_code)]

use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Streaming encrypt/decrypt for RNCryptor v3 containers
#[derive(Parser)]
#[command(name = "rncryptor-cli")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Encrypt a file to a container
    rncryptor-cli encrypt --password-stdin secret.txt secret.rnc <<< \"hunter2\"

    # Decrypt a container, writing plaintext to stdout
    rncryptor-cli decrypt --password-stdin secret.rnc - <<< \"hunter2\"
")]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a file (or stdin) into a v3 container
    Encrypt(Transform),
    /// Decrypt a v3 container (from a file or stdin)
    Decrypt(Transform),
}

#[derive(Args)]
struct Transform {
    /// Input path, or `-` to read from stdin
    input: PathBuf,
    /// Output path, or `-` to write to stdout
    output: PathBuf,

    /// Password (insecure, prefer --password-stdin or RNCRYPTOR_PASSWORD)
    #[arg(long, env = "RNCRYPTOR_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Read password from stdin (single line, not compatible with `-` input)
    #[arg(long, conflicts_with = "password")]
    password_stdin: bool,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match cli.command {
        Commands::Encrypt(transform) => encrypt(transform),
        Commands::Decrypt(transform) => decrypt(transform),
    }
}

fn resolve_password(transform: &Transform) -> Result<String> {
    if let Some(password) = &transform.password {
        return Ok(password.clone());
    }
    if transform.password_stdin {
        let mut line = String::new();
        io::stdin()
            .read_line(&mut line)
            .context("reading password from stdin")?;
        return Ok(line.trim_end_matches(['\n', '\r']).to_string());
    }
    if io::stdin().is_terminal() {
        bail!("no password supplied: use --password, --password-stdin, or RNCRYPTOR_PASSWORD");
    }
    bail!("no password supplied and stdin is not a terminal to prompt on");
}

fn read_input(path: &PathBuf) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf).context("reading stdin")?;
        return Ok(buf);
    }
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn write_output(path: &PathBuf, data: &[u8]) -> Result<()> {
    if path.as_os_str() == "-" {
        io::stdout().write_all(data).context("writing stdout")?;
        return Ok(());
    }
    std::fs::write(path, data).with_context(|| format!("writing {}", path.display()))
}

fn encrypt(transform: Transform) -> Result<()> {
    let password = resolve_password(&transform)?;
    let plaintext = read_input(&transform.input)?;
    tracing::debug!(bytes = plaintext.len(), "encrypting");
    let container = rncryptor::encrypt(&plaintext, &password).context("encrypting container")?;
    write_output(&transform.output, &container)
}

fn decrypt(transform: Transform) -> Result<()> {
    let password = resolve_password(&transform)?;
    let container = read_input(&transform.input)?;
    tracing::debug!(bytes = container.len(), "decrypting");
    let plaintext = rncryptor::decrypt(&container, &password).context("decrypting container")?;
    write_output(&transform.output, &plaintext)
}

fn setup_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with_writer(io::stderr)
        .init();
}
