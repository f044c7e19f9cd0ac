use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use pakrat_cli::commands::derive_key::DeriveRequest;
use pakrat_cli::commands::rename::RenameRequest;
use pakrat_cli::{HashKind, OutputFormat, commands, config};

#[derive(Parser)]
#[command(
    name = "pakrat",
    about = "List, extract and rewrite game archives",
    version,
    author,
    long_about = "A command-line tool for MPQ, PAK and ZIP game archives, with the MPQ string hash, FNV and PBKDF2 exposed for inspecting keys and names."
)]
struct Cli {
    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "warn")]
    log_level: LogLevel,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the resources of an archive
    List {
        /// Archive file
        archive: PathBuf,

        /// Force a plugin instead of detecting the format
        #[arg(short, long)]
        plugin: Option<String>,
    },

    /// Extract resources to a directory
    Extract {
        /// Archive file
        archive: PathBuf,

        /// Output directory
        out_dir: PathBuf,

        /// Only extract resources whose name contains this text
        #[arg(short = 'F', long)]
        filter: Option<String>,

        /// Force a plugin instead of detecting the format
        #[arg(short, long)]
        plugin: Option<String>,
    },

    /// Rename one resource and write the archive to a new file
    Rename {
        /// Archive file
        archive: PathBuf,

        /// Index of the resource, as shown by `list`
        index: usize,

        /// New resource name
        new_name: String,

        /// Output archive
        output: PathBuf,

        /// Force a plugin for reading
        #[arg(short, long)]
        plugin: Option<String>,

        /// Write with a different plugin (e.g. `zip`)
        #[arg(short, long)]
        to: Option<String>,

        /// Rewrite even if the archive was only partially read, dropping
        /// the entries that could not be enumerated
        #[arg(long)]
        force: bool,
    },

    /// Hash a string
    Hash {
        /// Text to hash
        text: String,

        /// Hash function
        #[arg(short, long, value_enum, default_value = "fnv1a-64")]
        algorithm: HashKind,
    },

    /// Derive a key with PBKDF2
    DeriveKey {
        /// Password
        password: String,

        /// Salt as hex
        #[arg(short, long)]
        salt: String,

        /// Iteration count
        #[arg(short, long, default_value_t = 1000)]
        iterations: u32,

        /// Key length in bytes (0 = digest length)
        #[arg(short = 'n', long, default_value_t = 0)]
        length: usize,

        /// HMAC hash (md5, sha1, sha256, sha512)
        #[arg(short, long, default_value = "sha1")]
        algorithm: String,

        /// Encode the password as Latin-1 instead of UTF-8
        #[arg(long)]
        latin1: bool,
    },

    /// List the available archive plugins
    Plugins,

    /// Show the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(cli.log_level.into()).into())
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let settings = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::List { archive, plugin } => {
            commands::list::handle(&archive, plugin.as_deref(), cli.format, settings)?;
        }
        Commands::Extract {
            archive,
            out_dir,
            filter,
            plugin,
        } => {
            commands::extract::handle(
                &archive,
                &out_dir,
                filter.as_deref(),
                plugin.as_deref(),
                cli.format,
                settings,
            )?;
        }
        Commands::Rename {
            archive,
            index,
            new_name,
            output,
            plugin,
            to,
            force,
        } => {
            let request = RenameRequest {
                archive: &archive,
                index,
                new_name: &new_name,
                output: &output,
                plugin: plugin.as_deref(),
                to: to.as_deref(),
                force,
            };
            commands::rename::handle(request, settings)?;
        }
        Commands::Hash { text, algorithm } => {
            commands::hash::handle(&text, algorithm, cli.format)?;
        }
        Commands::DeriveKey {
            password,
            salt,
            iterations,
            length,
            algorithm,
            latin1,
        } => {
            let request = DeriveRequest {
                password: &password,
                salt_hex: &salt,
                iterations,
                length,
                algorithm: &algorithm,
                latin1,
            };
            commands::derive_key::handle(&request, cli.format)?;
        }
        Commands::Plugins => commands::plugins::handle(cli.format, &settings)?,
        Commands::Config => commands::config::handle(&settings)?,
    }

    Ok(())
}
