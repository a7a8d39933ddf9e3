//! ZFS Ops CLI
//!
//! Thin command line front end over the library. Listing and query
//! subcommands print JSON on stdout; `send` writes the raw stream to stdout
//! and `receive` reads one from stdin. Logs go to stderr.

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use zfs_ops::{
    CloneOptions, CommandLoggerRef, DestroyFlag, DestroyFlags, Filesystem, NoopLogger,
    SendOptions, Snapshot, ToolCommand, TracingLogger, Zfs, ZfsConfig,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// ZFS Ops - structured access to the zfs and zpool tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML configuration file
    #[arg(long, env = "ZFS_OPS_CONFIG")]
    config: Option<PathBuf>,

    /// Dataset tool program
    #[arg(long, env = "ZFS_BIN")]
    zfs_bin: Option<PathBuf>,

    /// Pool tool program
    #[arg(long, env = "ZPOOL_BIN")]
    zpool_bin: Option<PathBuf>,

    /// Per-invocation timeout in seconds
    #[arg(long, env = "ZFS_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Log every tool invocation at DEBUG level
    #[arg(long, env = "LOG_COMMANDS")]
    log_commands: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ClapArgs, Debug)]
struct StreamFlags {
    /// Base snapshot for an incremental stream
    #[arg(short = 'i', long)]
    incremental_from: Option<String>,

    /// Include dataset properties
    #[arg(short = 'p', long)]
    properties: bool,

    /// Keep encrypted data encrypted
    #[arg(short = 'w', long)]
    raw: bool,
}

impl StreamFlags {
    fn options(&self) -> SendOptions {
        let mut options = SendOptions::default()
            .properties(self.properties)
            .raw(self.raw);
        if let Some(base) = &self.incremental_from {
            options = options.incremental_from_name(base.clone());
        }
        options
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all filesystems
    Filesystems,
    /// List snapshots, of one filesystem or of all
    Snapshots { filesystem: Option<String> },
    /// List direct child filesystems
    Children { filesystem: String },
    /// Create a filesystem
    Create {
        name: String,
        /// Property as key=value, repeatable
        #[arg(short = 'o', long = "property", value_parser = parse_key_val)]
        properties: Vec<(String, String)>,
        /// Enable passphrase encryption with this password
        #[arg(long, env = "ZFS_OPS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Destroy a filesystem or snapshot
    Destroy {
        name: String,
        #[arg(short = 'r')]
        recursive: bool,
        #[arg(short = 'R')]
        recursive_clones: bool,
        #[arg(short = 'd')]
        defer: bool,
        #[arg(short = 'f')]
        force: bool,
    },
    /// Read one property
    Get { name: String, key: String },
    /// Set one property
    Set { name: String, key: String, value: String },
    /// Take a snapshot of a filesystem
    Snapshot {
        filesystem: String,
        name: String,
        /// Include every descendant filesystem
        #[arg(short = 'r')]
        recursive: bool,
    },
    /// Roll back to a snapshot
    Rollback { snapshot: String },
    /// Clone a snapshot into a new filesystem
    Clone {
        snapshot: String,
        dest: String,
        #[arg(short = 'o', long = "property", value_parser = parse_key_val)]
        properties: Vec<(String, String)>,
    },
    Mount { filesystem: String },
    Unmount { filesystem: String },
    /// Load an encryption key
    LoadKey {
        filesystem: String,
        #[arg(long, env = "ZFS_OPS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    UnloadKey { filesystem: String },
    /// Place a hold on a snapshot
    Hold { snapshot: String, tag: String },
    /// Release a hold
    Release { snapshot: String, tag: String },
    /// List hold tags
    Holds { snapshot: String },
    /// Write a snapshot stream to stdout
    Send {
        snapshot: String,
        #[command(flatten)]
        flags: StreamFlags,
    },
    /// Receive a snapshot stream from stdin
    Receive { name: String },
    /// Stream a snapshot into a new snapshot
    Transfer {
        snapshot: String,
        target: String,
        #[command(flatten)]
        flags: StreamFlags,
    },
    /// List imported pools
    Pools,
    Import { pool: String },
    Export { pool: String },
}

fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {:?}", s))
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = load_config(&args)?;
    let logger: CommandLoggerRef = if args.log_commands {
        Arc::new(TracingLogger)
    } else {
        Arc::new(NoopLogger)
    };
    let zfs = Zfs::with_logger(config, logger);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling");
                cancel.cancel();
            }
        });
    }

    run(&zfs, &cancel, args.command).await
}

fn load_config(args: &Args) -> Result<ZfsConfig> {
    let mut config = match &args.config {
        Some(path) => ZfsConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ZfsConfig::default(),
    };

    if let Some(program) = &args.zfs_bin {
        config.zfs = ToolCommand::new(program);
    }
    if let Some(program) = &args.zpool_bin {
        config.zpool = ToolCommand::new(program);
    }
    if args.timeout_secs.is_some() {
        config.command_timeout_secs = args.timeout_secs;
    }

    config.validate()?;
    Ok(config)
}

async fn run(zfs: &Zfs, cancel: &CancellationToken, command: Command) -> Result<()> {
    match command {
        Command::Filesystems => {
            let filesystems = zfs.filesystems(cancel).await?;
            print_json(&filesystems.iter().map(|fs| &fs.info).collect::<Vec<_>>())
        }
        Command::Snapshots { filesystem } => {
            let snapshots = match filesystem {
                Some(name) => zfs.get_filesystem(cancel, &name).await?.snapshots(cancel).await?,
                None => zfs.snapshots(cancel).await?,
            };
            print_json(&snapshots.iter().map(|s| &s.info).collect::<Vec<_>>())
        }
        Command::Children { filesystem } => {
            let children = zfs
                .get_filesystem(cancel, &filesystem)
                .await?
                .children(cancel)
                .await?;
            print_json(&children.iter().map(|fs| &fs.info).collect::<Vec<_>>())
        }
        Command::Create {
            name,
            properties,
            password,
        } => {
            let mut properties: BTreeMap<String, String> = properties.into_iter().collect();
            if let Some(password) = password {
                properties.insert("password".to_string(), password);
            }
            let fs = zfs.create_filesystem(cancel, &name, &properties).await?;
            print_json(&fs.info)
        }
        Command::Destroy {
            name,
            recursive,
            recursive_clones,
            defer,
            force,
        } => {
            let mut flags = DestroyFlags::empty();
            for (set, flag) in [
                (recursive, DestroyFlag::Recursive),
                (recursive_clones, DestroyFlag::RecursiveClones),
                (defer, DestroyFlag::DeferDeletion),
                (force, DestroyFlag::ForceUnmount),
            ] {
                if set {
                    flags |= flag;
                }
            }
            match Dataset::resolve(zfs, cancel, &name).await? {
                Dataset::Filesystem(fs) => fs.destroy(cancel, flags).await?,
                Dataset::Snapshot(snapshot) => snapshot.destroy(cancel, flags).await?,
            }
            Ok(())
        }
        Command::Get { name, key } => {
            let (value, exists) = match Dataset::resolve(zfs, cancel, &name).await? {
                Dataset::Filesystem(fs) => fs.get_property(cancel, &key).await?,
                Dataset::Snapshot(snapshot) => snapshot.get_property(cancel, &key).await?,
            };
            print_json(&PropertyValue {
                name: &name,
                key: &key,
                value,
                exists,
            })
        }
        Command::Set { name, key, value } => {
            match Dataset::resolve(zfs, cancel, &name).await? {
                Dataset::Filesystem(fs) => fs.set_property(cancel, &key, &value).await?,
                Dataset::Snapshot(snapshot) => snapshot.set_property(cancel, &key, &value).await?,
            }
            Ok(())
        }
        Command::Snapshot {
            filesystem,
            name,
            recursive,
        } => {
            let fs = zfs.get_filesystem(cancel, &filesystem).await?;
            let snapshot = if recursive {
                fs.snapshot_recursive(cancel, &name).await?
            } else {
                fs.snapshot(cancel, &name).await?
            };
            print_json(&snapshot.info)
        }
        Command::Rollback { snapshot } => {
            zfs.get_snapshot(cancel, &snapshot).await?.rollback(cancel).await?;
            Ok(())
        }
        Command::Clone {
            snapshot,
            dest,
            properties,
        } => {
            let options = CloneOptions {
                properties: properties.into_iter().collect(),
            };
            let fs = zfs
                .get_snapshot(cancel, &snapshot)
                .await?
                .clone_to(cancel, &dest, &options)
                .await?;
            print_json(&fs.info)
        }
        Command::Mount { filesystem } => {
            zfs.get_filesystem(cancel, &filesystem).await?.mount(cancel).await?;
            Ok(())
        }
        Command::Unmount { filesystem } => {
            zfs.get_filesystem(cancel, &filesystem).await?.unmount(cancel).await?;
            Ok(())
        }
        Command::LoadKey {
            filesystem,
            password,
        } => {
            zfs.get_filesystem(cancel, &filesystem)
                .await?
                .load_key(cancel, &password)
                .await?;
            Ok(())
        }
        Command::UnloadKey { filesystem } => {
            zfs.get_filesystem(cancel, &filesystem)
                .await?
                .unload_key(cancel)
                .await?;
            Ok(())
        }
        Command::Hold { snapshot, tag } => {
            zfs.get_snapshot(cancel, &snapshot).await?.hold(cancel, &tag).await?;
            Ok(())
        }
        Command::Release { snapshot, tag } => {
            zfs.get_snapshot(cancel, &snapshot).await?.release(cancel, &tag).await?;
            Ok(())
        }
        Command::Holds { snapshot } => {
            let holds = zfs.get_snapshot(cancel, &snapshot).await?.holds(cancel).await?;
            print_json(&holds)
        }
        Command::Send { snapshot, flags } => {
            zfs.get_snapshot(cancel, &snapshot)
                .await?
                .send(cancel, &flags.options(), tokio::io::stdout())
                .await?;
            Ok(())
        }
        Command::Receive { name } => {
            let snapshot = zfs
                .receive_snapshot(cancel, tokio::io::stdin(), &name)
                .await?;
            print_json(&snapshot.info)
        }
        Command::Transfer {
            snapshot,
            target,
            flags,
        } => {
            let received = zfs
                .get_snapshot(cancel, &snapshot)
                .await?
                .transfer_to(cancel, &flags.options(), &target)
                .await?;
            info!("Transferred {} to {}", snapshot, received.name());
            print_json(&received.info)
        }
        Command::Pools => print_json(&zfs.pools(cancel).await?),
        Command::Import { pool } => print_json(&zfs.import_pool(cancel, &pool).await?),
        Command::Export { pool } => {
            zfs.get_pool(cancel, &pool).await?.export(cancel).await?;
            Ok(())
        }
    }
}

// =============================================================================
// Output
// =============================================================================

enum Dataset {
    Filesystem(Filesystem),
    Snapshot(Snapshot),
}

impl Dataset {
    async fn resolve(zfs: &Zfs, cancel: &CancellationToken, name: &str) -> zfs_ops::Result<Self> {
        if name.contains('@') {
            zfs.get_snapshot(cancel, name).await.map(Dataset::Snapshot)
        } else {
            zfs.get_filesystem(cancel, name).await.map(Dataset::Filesystem)
        }
    }
}

#[derive(Serialize)]
struct PropertyValue<'a> {
    name: &'a str,
    key: &'a str,
    value: String,
    exists: bool,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // stdout carries command output
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
