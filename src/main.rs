//! Ice Launcher CLI
//!
//! Entry point for the `ice-launcher` command-line tool.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use ice_launcher_lib::commands::Launcher;
use ice_launcher_lib::core::auth::{Account, OfflineAccount, StaticAccount};
use ice_launcher_lib::core::config::LauncherConfig;
use ice_launcher_lib::core::error::LauncherResult;
use ice_launcher_lib::core::progress::LogProgress;

#[derive(Parser)]
#[command(name = "ice-launcher")]
#[command(about = "Install and launch Minecraft versions", version)]
struct Cli {
    /// Data directory (default: platform data dir, or ICE_LAUNCHER_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List versions from the Mojang manifest
    Versions {
        /// Include snapshots and old betas/alphas
        #[arg(long)]
        snapshots: bool,
    },

    /// Create a vanilla instance
    Create {
        name: String,

        /// Minecraft version id, or `latest`
        version: String,

        /// Runtime: auto, latest, a major version (17) or a component name
        #[arg(long)]
        jre: Option<String>,
    },

    /// List instances
    List,

    /// Rename an instance
    Rename { old: String, new: String },

    /// Delete an instance and everything in it
    Delete { name: String },

    /// Download everything an instance needs
    Install { name: String },

    /// Start an instance and wait for it to exit
    Launch {
        name: String,

        /// Player name
        #[arg(long, default_value = "Player")]
        username: String,

        /// Profile UUID of an online account (requires --access-token)
        #[arg(long, requires = "access_token")]
        uuid: Option<String>,

        /// Access token of an online account (requires --uuid)
        #[arg(long, requires = "uuid")]
        access_token: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    ice_launcher_lib::init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> LauncherResult<()> {
    let launcher = Launcher::new(LauncherConfig::load(cli.data_dir)?)?;

    match cli.command {
        Commands::Versions { snapshots } => {
            for version in launcher.list_versions(snapshots).await? {
                println!(
                    "{:<24} {:<10} {}",
                    version.id,
                    version.version_type,
                    version.release_time.as_deref().unwrap_or("")
                );
            }
        }
        Commands::Create { name, version, jre } => {
            let instance = launcher
                .create_instance(&name, &version, jre.as_deref())
                .await?;
            println!(
                "Created '{}' ({} {}) at {}",
                instance.name,
                instance.info.instance_type,
                instance.info.minecraft_version,
                instance.dir.display()
            );
        }
        Commands::List => {
            for instance in launcher.instances().list().await? {
                println!(
                    "{:<24} {:<8} {:<12} jre={}",
                    instance.name,
                    instance.info.instance_type,
                    instance.info.minecraft_version,
                    instance.info.jre_version
                );
            }
        }
        Commands::Rename { old, new } => {
            launcher.instances().rename(&old, &new).await?;
            println!("Renamed '{}' to '{}'", old, new);
        }
        Commands::Delete { name } => {
            launcher.instances().delete(&name).await?;
            println!("Deleted '{}'", name);
        }
        Commands::Install { name } => {
            let (meta, runtime) = launcher
                .install_instance(&name, Arc::new(LogProgress::new(10)))
                .await?;
            println!(
                "Installed {} with runtime {} {}",
                meta.id, runtime.component, runtime.version
            );
        }
        Commands::Launch {
            name,
            username,
            uuid,
            access_token,
        } => {
            let account: Box<dyn Account> = match (uuid, access_token) {
                (Some(uuid), Some(token)) => Box::new(StaticAccount::new(&username, &uuid, &token)),
                _ => Box::new(OfflineAccount::new(&username)),
            };
            let status = launcher
                .launch_instance(&name, account.as_ref(), Arc::new(LogProgress::new(10)))
                .await?;
            if !status.success() {
                eprintln!("Game exited with {}", status);
                process::exit(status.code().unwrap_or(1));
            }
        }
    }

    Ok(())
}
