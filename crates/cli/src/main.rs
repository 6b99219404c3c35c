use anyhow::Result;
use catbox_core::LitterboxDuration;
use clap::{CommandFactory, Parser};
use color_eyre::config::HookBuilder;
use std::path::PathBuf;

mod handlers;
mod wizard;

/// catbox - upload files and manage albums on catbox.moe
#[derive(Parser, Debug)]
#[command(name = "catbox")]
#[command(version)]
#[command(about = "Upload files to catbox.moe and Litterbox from your terminal", long_about = None)]
struct Cli {
    /// Account userhash (overrides the configuration file)
    #[arg(long, env = "CATBOX_USERHASH", global = true, hide_env_values = true)]
    userhash: Option<String>,

    /// Configuration file (default: ~/.config/catbox/config.toml)
    #[arg(long, env = "CATBOX_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the configuration file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Initial setup (interactive wizard)
    Init,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Upload files permanently
    Upload {
        /// Files or directories to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Descend into directories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Upload files to temporary storage
    Litterbox {
        /// Files or directories to upload
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// How long the files stay online (1h, 12h, 24h, 72h, 1w)
        #[arg(short, long, default_value = "1h", value_parser = parse_duration)]
        time: LitterboxDuration,
        /// Descend into directories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Album management (requires a userhash)
    Album {
        #[command(subcommand)]
        action: AlbumAction,
    },

    /// File management (requires a userhash)
    Files {
        #[command(subcommand)]
        action: FileAction,
    },

    /// Print the shortcode of an album URL
    Shortcode {
        /// Album URL, e.g. https://catbox.moe/c/pd412w
        url: String,
    },

    /// Shell completion
    Completion {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: String,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Check the configuration file
    Validate,
    /// Print the configuration file location
    Path,
}

#[derive(clap::Subcommand, Debug)]
enum AlbumAction {
    /// Create an album from uploaded files
    Create {
        /// File names or file URLs
        files: Vec<String>,
        /// Album title
        #[arg(short, long, default_value = "")]
        title: String,
        /// Album description
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Replace the contents of an album
    Edit {
        /// Album shortcode or URL
        album: String,
        /// File names or file URLs (the full new file list)
        files: Vec<String>,
        /// Album title
        #[arg(short, long, default_value = "")]
        title: String,
        /// Album description
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Delete an album (its files are kept)
    Delete {
        /// Album shortcode or URL
        album: String,
    },
}

#[derive(clap::Subcommand, Debug)]
enum FileAction {
    /// Permanently delete uploaded files
    Delete {
        /// File names or file URLs
        #[arg(required = true)]
        files: Vec<String>,
    },
}

fn parse_duration(s: &str) -> std::result::Result<LitterboxDuration, String> {
    s.parse().map_err(|e: catbox_core::Error| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    // Parse CLI arguments
    let cli = Cli::parse();

    let overrides = handlers::Overrides {
        userhash: cli.userhash,
        config_path: cli.config,
        timeout: cli.timeout,
        json: cli.json,
        verbose: cli.verbose,
    };

    // Execute command
    match cli.command {
        Commands::Init => handlers::handle_init(&overrides).await,
        Commands::Config { action } => {
            let action = match action {
                ConfigAction::Show => handlers::ConfigCommand::Show,
                ConfigAction::Validate => handlers::ConfigCommand::Validate,
                ConfigAction::Path => handlers::ConfigCommand::Path,
            };
            handlers::handle_config(action, &overrides).await
        }
        Commands::Upload { paths, recursive } => {
            handlers::handle_upload(&paths, recursive, None, &overrides).await
        }
        Commands::Litterbox {
            paths,
            time,
            recursive,
        } => handlers::handle_upload(&paths, recursive, Some(time), &overrides).await,
        Commands::Album { action } => {
            let action = match action {
                AlbumAction::Create {
                    files,
                    title,
                    description,
                } => handlers::AlbumCommand::Create {
                    files,
                    title,
                    description,
                },
                AlbumAction::Edit {
                    album,
                    files,
                    title,
                    description,
                } => handlers::AlbumCommand::Edit {
                    album,
                    files,
                    title,
                    description,
                },
                AlbumAction::Delete { album } => handlers::AlbumCommand::Delete { album },
            };
            handlers::handle_album(action, &overrides).await
        }
        Commands::Files { action } => match action {
            FileAction::Delete { files } => handlers::handle_delete_files(&files, &overrides).await,
        },
        Commands::Shortcode { url } => handlers::handle_shortcode(&url, &overrides),
        Commands::Completion { shell } => handlers::handle_completion(&shell, &mut Cli::command()),
    }
}
