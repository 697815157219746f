//! Stratum watcher binary.
//!
//! `run` layers an encrypted file, a watched plain file, the command-line
//! flags below and (with the `etcd` feature) an etcd prefix, prints the
//! merged document, and prints it again on every change until Ctrl-C.
//! `encode` produces the encrypted files `run` reads.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use stratum::{AesGcmHexDecoder, CliSource, Config, ConfigBuilder, FileSource, encrypt_to_hex};
use stratum_core::values::parse::parse_duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "stratum-watcher", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the merged configuration and follow changes.
    Run(RunArgs),
    /// Encrypt a configuration file for use with `--encrypted`.
    Encode(EncodeArgs),
}

#[derive(Debug, Args)]
#[cfg_attr(not(feature = "etcd"), allow(dead_code))]
struct RunArgs {
    /// Hex-encoded AES-GCM file, decrypted with --config-key.
    #[arg(long, env = "STRATUM_ENCRYPTED_FILE")]
    encrypted: Option<PathBuf>,

    /// Plain JSON or YAML file, watched for writes.
    #[arg(long, env = "STRATUM_FILE")]
    file: Option<PathBuf>,

    /// Hex-encoded 16 or 32 byte key.
    #[arg(long, env = "STRATUM_CONFIG_KEY", hide_env_values = true)]
    config_key: Option<String>,

    /// Comma separated etcd endpoints.
    #[arg(long, env = "STRATUM_ETCD_ENDPOINTS")]
    etcd_endpoints: Option<String>,

    #[arg(long, env = "STRATUM_ETCD_PREFIX", default_value = "/configuration/app")]
    etcd_prefix: String,

    #[arg(long, env = "STRATUM_ETCD_USERNAME")]
    etcd_username: Option<String>,

    #[arg(long, env = "STRATUM_ETCD_PASSWORD", hide_env_values = true)]
    etcd_password: Option<String>,

    #[arg(long, env = "STRATUM_ETCD_DIAL_TIMEOUT", default_value = "2s", value_parser = duration)]
    etcd_dial_timeout: Duration,

    /// Refresh interval, e.g. `5s` or `1m30s`.
    #[arg(long, env = "STRATUM_WATCH_INTERVAL", default_value = "5s", value_parser = duration)]
    interval: Duration,

    #[command(flatten)]
    flags: AppFlags,
}

/// Flags exposed to the configuration through the command-line source.
#[derive(Debug, Args)]
#[allow(dead_code)] // read back through ArgMatches
struct AppFlags {
    /// Person name.
    #[arg(long, default_value = "")]
    name: String,

    /// Person slogan.
    #[arg(long, default_value = "")]
    slogan: String,

    #[arg(id = "nested.props.deep", long = "nested.props.deep", default_value = "")]
    nested_deep: String,

    #[arg(id = "nested.props.really", long = "nested.props.really", default_value_t = 55)]
    nested_really: i64,
}

#[derive(Debug, Args)]
struct EncodeArgs {
    /// Hex-encoded 16 or 32 byte key.
    #[arg(long, env = "STRATUM_CONFIG_KEY", hide_env_values = true)]
    config_key: String,

    /// Plain configuration file.
    src: PathBuf,

    /// Where to write the encrypted file.
    dest: PathBuf,
}

fn duration(s: &str) -> Result<Duration, String> {
    parse_duration(s).ok_or_else(|| format!("invalid duration '{s}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    match cli.command {
        Command::Encode(args) => encode(args),
        Command::Run(args) => {
            let run_matches = matches
                .subcommand_matches("run")
                .context("missing run arguments")?;
            run(args, CliSource::from_matches_with(run_matches, is_app_flag())?).await
        },
    }
}

/// Returns a filter accepting only the ids declared on [`AppFlags`].
fn is_app_flag() -> impl Fn(&str) -> bool {
    let ids: HashSet<String> = AppFlags::augment_args(clap::Command::new("flags"))
        .get_arguments()
        .map(|arg| arg.get_id().to_string())
        .collect();
    move |id| ids.contains(id)
}

fn encode(args: EncodeArgs) -> anyhow::Result<()> {
    if !args.src.exists() {
        bail!("configuration file not found: {}", args.src.display());
    }

    let plaintext = std::fs::read(&args.src)
        .with_context(|| format!("failed to read {}", args.src.display()))?;
    let key = decode_key(&args.config_key)?;
    let encoded = encrypt_to_hex(&key, &plaintext)?;

    std::fs::write(&args.dest, encoded)
        .with_context(|| format!("failed to write {}", args.dest.display()))?;

    info!(src = %args.src.display(), dest = %args.dest.display(), "Encoded configuration file");
    Ok(())
}

fn decode_key(key: &str) -> anyhow::Result<Vec<u8>> {
    hex::decode(key.trim()).context("config key must be hex encoded")
}

async fn run(args: RunArgs, flags: CliSource) -> anyhow::Result<()> {
    info!("Starting Stratum watcher v{}", env!("CARGO_PKG_VERSION"));

    let token = CancellationToken::new();
    let builder = sources(&args, flags).await?;
    let config = builder
        .watch(token.clone(), args.interval)
        .build()
        .await
        .context("failed to load configuration")?;

    print_document(&config);

    let mut changes = config.subscribe();
    let printer = tokio::spawn({
        let config = config.clone();
        async move {
            while changes.changed().await {
                println!("updated");
                print_document(&config);
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Cancelling watch");
    token.cancel();

    if let Some(handle) = config.take_watch_handle() {
        handle.join().await;
    }
    printer.await?;

    Ok(())
}

async fn sources(args: &RunArgs, flags: CliSource) -> anyhow::Result<ConfigBuilder> {
    let mut builder = Config::builder();

    if let Some(path) = &args.encrypted {
        let key = args
            .config_key
            .as_deref()
            .context("--config-key is required with --encrypted")?;
        builder = builder.source_with_decoder(
            FileSource::new(path),
            Arc::new(AesGcmHexDecoder::from_hex(key)?),
        );
    }

    if let Some(path) = &args.file {
        builder = builder.source(FileSource::new(path).with_watch(true));
    }

    builder = builder.source(flags);

    if let Some(endpoints) = &args.etcd_endpoints {
        builder = etcd_source(builder, args, endpoints).await?;
    }

    Ok(builder)
}

#[cfg(feature = "etcd")]
async fn etcd_source(
    builder: ConfigBuilder,
    args: &RunArgs,
    endpoints: &str,
) -> anyhow::Result<ConfigBuilder> {
    use stratum::{KvOptions, KvSource};

    let mut options = KvOptions::new(endpoints)
        .with_prefix(&args.etcd_prefix)
        .with_dial_timeout(args.etcd_dial_timeout);
    if let (Some(user), Some(password)) = (&args.etcd_username, &args.etcd_password) {
        options = options.with_credentials(user, password);
    }

    Ok(builder.source(KvSource::etcd(options).await?))
}

#[cfg(not(feature = "etcd"))]
async fn etcd_source(
    builder: ConfigBuilder,
    args: &RunArgs,
    endpoints: &str,
) -> anyhow::Result<ConfigBuilder> {
    tracing::warn!(
        endpoints,
        prefix = %args.etcd_prefix,
        "Built without the etcd feature, ignoring etcd endpoints"
    );
    Ok(builder)
}

fn print_document(config: &Config) {
    println!("{}", String::from_utf8_lossy(&config.bytes()));
    println!("alert? {}", config.get("alert.enabled").bool(false));
}
