//! fsplit: split files into fixed-size chunks and merge them back
//!
//! Commands:
//!   split <file>        - write file-data_<file>/ with data_N chunks + checksum
//!   merge <dir>         - reassemble a split directory and verify its checksum
//!   keygen [<path>]     - write a new random key file
//!   config show         - display the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use fsplit_chunks::{ChunkEngine, ProgressFn};
use fsplit_core::{ChunkConfig, FsplitConfig, MergeRequest, SplitRequest};
use fsplit_crypto::{ChunkCipher, KdfParams, XChaChaCipher};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "fsplit",
    version,
    about = "Split files into chunks and merge them back",
    long_about = "fsplit: split a file into fixed-size, optionally encrypted chunk files, \
                  and merge them back with SHA-256 verification"
)]
struct Cli {
    /// Path to fsplit.toml configuration file
    #[arg(long, short = 'c', env = "FSPLIT_CONFIG", default_value = "fsplit.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides config
    #[arg(long, env = "FSPLIT_LOG")]
    log: Option<String>,

    /// Log format; overrides config
    #[arg(long, env = "FSPLIT_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a file into a directory of chunk files
    Split {
        /// File to split
        path: PathBuf,
        /// Chunk size magnitude (default from config: 10)
        #[arg(long, short = 's')]
        size: Option<u64>,
        /// Chunk size unit: B, KB, MB, GB (default from config: MB)
        #[arg(long, short = 'u')]
        unit: Option<String>,
        #[command(flatten)]
        key: KeyArgs,
        /// Directory to create the split directory in (overrides config)
        #[arg(long, short = 'o')]
        output_root: Option<PathBuf>,
    },

    /// Merge a split directory back into a single file
    Merge {
        /// Split directory (e.g. file-data_movie.mp4)
        dir: PathBuf,
        /// Output file name (default: directory name without its prefix)
        #[arg(long)]
        output: Option<String>,
        #[command(flatten)]
        key: KeyArgs,
        /// Directory to write the merged file to (overrides config)
        #[arg(long, short = 'o')]
        output_root: Option<PathBuf>,
    },

    /// Generate a new random key file
    Keygen {
        /// Key file path (default from config: fsplit.key)
        path: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug)]
struct KeyArgs {
    /// Encrypt chunks and checksum (split) / decrypt them (merge)
    #[arg(long, short = 'e')]
    encrypt: bool,
    /// Key file (overrides config key_file)
    #[arg(long, env = "FSPLIT_KEY_FILE")]
    key_file: Option<PathBuf>,
    /// Derive the key from a passphrase (FSPLIT_PASSPHRASE or prompt) instead of a key file
    #[arg(long)]
    passphrase: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = FsplitConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;

    init_logging(&cli, &config);
    debug!(config = %cli.config.display(), exists = cli.config.exists(), "configuration loaded");

    match cli.command {
        Commands::Split { path, size, unit, key, output_root } => {
            cmd_split(&config, &path, size, unit, &key, output_root).await
        }
        Commands::Merge { dir, output, key, output_root } => {
            cmd_merge(&config, &dir, output, &key, output_root).await
        }
        Commands::Keygen { path } => cmd_keygen(&config, path.as_deref()),
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(cli: &Cli, config: &FsplitConfig) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = cli.log.as_deref().unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let format = cli.log_format.clone().unwrap_or(match config.logging.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── Key loading ───────────────────────────────────────────────────────────────

/// Build the cipher for `--encrypt`.
///
/// Passphrase mode derives the key with Argon2id. Key-file mode loads the
/// key file; on split a missing key file is generated.
fn load_cipher(
    config: &FsplitConfig,
    key: &KeyArgs,
    create_missing: bool,
) -> Result<Arc<dyn ChunkCipher>> {
    let chunk_key = if key.passphrase {
        let passphrase = read_passphrase()?;
        let params = KdfParams {
            mem_cost_kib: config.crypto.argon2_mem_cost_kib,
            time_cost: config.crypto.argon2_time_cost,
            parallelism: config.crypto.argon2_parallelism,
        };
        let salt = fsplit_crypto::salt_from_str(&config.crypto.salt);
        fsplit_crypto::derive_key(&passphrase, &salt, &params).context("deriving key from passphrase")?
    } else {
        let path = key.key_file.clone().unwrap_or_else(|| config.crypto.key_file.clone());
        if path.exists() {
            fsplit_crypto::load_key_file(&path)
                .with_context(|| format!("loading key file: {}", path.display()))?
        } else if create_missing {
            let generated = fsplit_crypto::generate_key();
            fsplit_crypto::save_key_file(&path, &generated)
                .with_context(|| format!("saving key file: {}", path.display()))?;
            info!(path = %path.display(), "generated new key file");
            println!("New key written to {} (needed to merge)", path.display());
            generated
        } else {
            anyhow::bail!(
                "key file not found: {}\nPass --key-file or --passphrase to decrypt.",
                path.display()
            );
        }
    };

    Ok(Arc::new(XChaChaCipher::new(&chunk_key)))
}

fn read_passphrase() -> Result<SecretString> {
    if let Ok(p) = std::env::var("FSPLIT_PASSPHRASE") {
        return Ok(SecretString::from(p));
    }
    let p = rpassword::prompt_password("Passphrase: ").context("reading passphrase")?;
    if p.is_empty() {
        anyhow::bail!("empty passphrase");
    }
    Ok(SecretString::from(p))
}

// ── Progress bar helpers ──────────────────────────────────────────────────────

fn make_progress_bar(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    pb.set_style(style);
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn progress_for(pb: &ProgressBar) -> ProgressFn {
    let pb = pb.clone();
    Arc::new(move |done: u64, total: u64, msg: &str| {
        pb.set_length(total);
        pb.set_position(done);
        pb.set_message(msg.to_string());
    })
}

fn build_engine(
    config: &FsplitConfig,
    output_root: Option<PathBuf>,
    cipher: Option<Arc<dyn ChunkCipher>>,
    pb: &ProgressBar,
) -> ChunkEngine {
    let mut layout = config.layout.clone();
    if let Some(root) = output_root {
        layout.output_root = root;
    }
    let engine = ChunkEngine::new(layout).with_progress(progress_for(pb));
    match cipher {
        Some(cipher) => engine.with_cipher(cipher),
        None => engine,
    }
}

// ── `fsplit split` ────────────────────────────────────────────────────────────

async fn cmd_split(
    config: &FsplitConfig,
    path: &Path,
    size: Option<u64>,
    unit: Option<String>,
    key: &KeyArgs,
    output_root: Option<PathBuf>,
) -> Result<()> {
    let chunk_config = ChunkConfig::new(
        size.unwrap_or(config.split.chunk_size),
        unit.unwrap_or_else(|| config.split.unit.to_string()),
    );
    // Reject a bad unit before a key file gets generated.
    chunk_config.bytes_per_chunk().context("split")?;

    let request = SplitRequest::from_path(path)?.encrypted(key.encrypt);
    let cipher = if key.encrypt {
        Some(load_cipher(config, key, true)?)
    } else {
        None
    };

    println!(
        "Splitting {} into {} {} chunks (encryption {})",
        path.display(),
        chunk_config.magnitude,
        chunk_config.unit,
        if key.encrypt { "enabled" } else { "disabled" },
    );

    let pb = make_progress_bar("split");
    let engine = build_engine(config, output_root, cipher, &pb);
    let result = engine.split(&request, &chunk_config).await;
    pb.finish_and_clear();

    let report = result.with_context(|| format!("splitting {}", path.display()))?;

    println!("Split complete:");
    println!("  output:  {}", report.output_dir.display());
    println!("  chunks:  {}", report.chunks);
    println!("  bytes:   {}", fmt_bytes(report.bytes));
    println!("  sha256:  {}", hex::encode(&report.digest));
    Ok(())
}

// ── `fsplit merge` ────────────────────────────────────────────────────────────

async fn cmd_merge(
    config: &FsplitConfig,
    dir: &Path,
    output: Option<String>,
    key: &KeyArgs,
    output_root: Option<PathBuf>,
) -> Result<()> {
    let mut request = MergeRequest::new(dir).encrypted(key.encrypt);
    if let Some(name) = output {
        request = request.output_name(name);
    }
    let cipher = if key.encrypt {
        Some(load_cipher(config, key, false)?)
    } else {
        None
    };

    println!(
        "Merging {} (encryption {})",
        dir.display(),
        if key.encrypt { "enabled" } else { "disabled" },
    );

    let pb = make_progress_bar("merge");
    let engine = build_engine(config, output_root, cipher, &pb);
    let result = engine.merge(&request).await;
    pb.finish_and_clear();

    let report = result.with_context(|| format!("merging {}", dir.display()))?;

    println!("Merge complete (checksum verified):");
    println!("  output:  {}", report.output_path.display());
    println!("  chunks:  {}", report.chunks);
    println!("  bytes:   {}", fmt_bytes(report.bytes));
    println!("  sha256:  {}", hex::encode(&report.digest));
    Ok(())
}

// ── `fsplit keygen` ───────────────────────────────────────────────────────────

fn cmd_keygen(config: &FsplitConfig, path: Option<&Path>) -> Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.crypto.key_file.clone());

    let key = fsplit_crypto::generate_key();
    fsplit_crypto::save_key_file(&path, &key)
        .with_context(|| format!("writing key file: {}", path.display()))?;

    println!("Key written to {}", path.display());
    Ok(())
}

// ── `fsplit config show` ──────────────────────────────────────────────────────

fn cmd_config_show(config: &FsplitConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

// ── Utilities ─────────────────────────────────────────────────────────────────

fn fmt_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
