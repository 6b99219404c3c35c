//! Command handlers for the catbox CLI

use crate::wizard::run_init_wizard;
use anyhow::{Context, Result};
use catbox_core::{
    album_shortcode, extract_shortcode, get_config_path, load_config_from, validate_config,
    CatboxClient, ClientConfig, ConfigFile, Error as CoreError, LitterboxDuration, UploadTarget,
};
use clap::Command;
use clap_complete::{generate, Shell as ClapShell};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Global flags shared by every command
#[derive(Debug, Default)]
pub struct Overrides {
    pub userhash: Option<String>,
    pub config_path: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub json: bool,
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommand {
    Show,
    Validate,
    Path,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlbumCommand {
    Create {
        files: Vec<String>,
        title: String,
        description: String,
    },
    Edit {
        album: String,
        files: Vec<String>,
        title: String,
        description: String,
    },
    Delete {
        album: String,
    },
}

/// Handle init command
pub async fn handle_init(overrides: &Overrides) -> Result<()> {
    run_init_wizard(&config_path(overrides)?).await
}

/// Handle config commands
pub async fn handle_config(action: ConfigCommand, overrides: &Overrides) -> Result<()> {
    let path = config_path(overrides)?;

    match action {
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommand::Show => {
            let file = load_file(&path)?;
            init_logging(overrides.verbose, &file);
            let config = client_config(&file, overrides);

            if overrides.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "path": path,
                        "userhash": config.userhash.as_deref().map(mask_secret),
                        "api_url": config.api_url,
                        "litterbox_url": config.litterbox_url,
                        "file_url": config.file_url,
                        "album_url": config.album_url,
                        "timeout": config.timeout.as_secs(),
                    })
                );
                return Ok(());
            }

            println!("Current configuration ({}):", path.display());
            println!();
            println!("Account:");
            println!(
                "  Userhash: {}",
                config
                    .userhash
                    .as_deref()
                    .map(mask_secret)
                    .unwrap_or_else(|| "not set (anonymous uploads)".to_string())
            );
            println!();
            println!("Endpoints:");
            println!("  API: {}", config.api_url);
            println!("  Litterbox: {}", config.litterbox_url);
            println!("  Files: {}", config.file_url);
            println!("  Albums: {}", config.album_url);
            println!();
            println!("Timeout: {}s", config.timeout.as_secs());

            Ok(())
        }
        ConfigCommand::Validate => {
            println!("Validating {}...", path.display());

            let file = load_file(&path)?;
            validate_config(&file)?;
            println!("  ✅ Valid configuration format");

            let config = client_config(&file, overrides);
            config.validate()?;
            if config.userhash.is_some() {
                println!("  ✅ Userhash configured (albums and deletion available)");
            } else {
                println!("  ⚠️  No userhash: uploads are anonymous, album commands are unavailable");
            }

            Ok(())
        }
    }
}

/// A file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingUpload {
    path: PathBuf,
    size: u64,
}

#[derive(Tabled)]
struct UploadRow {
    file: String,
    size: String,
    #[tabled(rename = "type")]
    content_type: String,
    result: String,
}

/// Handle upload and litterbox commands.
///
/// Files are sent one at a time; a failed file does not stop the others.
pub async fn handle_upload(
    paths: &[PathBuf],
    recursive: bool,
    duration: Option<LitterboxDuration>,
    overrides: &Overrides,
) -> Result<()> {
    let client = build_client(overrides)?;
    let uploads = collect_files(paths, recursive)?;

    let mut rows = Vec::with_capacity(uploads.len());
    let mut results = Vec::with_capacity(uploads.len());
    let mut failures = 0usize;

    for upload in &uploads {
        let display_name = upload.path.display().to_string();
        let content_type = mime_guess::from_path(&upload.path)
            .first_or_octet_stream()
            .to_string();

        let progress = (!overrides.json).then(|| spinner(format!("Uploading {}...", display_name)));

        let target = UploadTarget::path(&upload.path);
        let outcome = match duration {
            Some(duration) => client.upload_to_litterbox(target, duration).await,
            None => client.upload_file(target).await,
        };

        if let Some(progress) = progress {
            progress.finish_and_clear();
        }

        let result = match &outcome {
            Ok(url) => {
                tracing::info!(file = %display_name, url = %url, "Uploaded");
                url.clone()
            }
            Err(e) => {
                failures += 1;
                tracing::error!(file = %display_name, error = %e, "Upload failed");
                format!("{} {}", style("✗").red(), e)
            }
        };

        results.push(serde_json::json!({
            "file": display_name,
            "size": upload.size,
            "url": outcome.as_ref().ok(),
            "error": outcome.as_ref().err().map(|e| e.to_string()),
        }));
        rows.push(UploadRow {
            file: display_name,
            size: format_bytes(upload.size),
            content_type,
            result,
        });
    }

    let expires_at = duration.map(expiry_time);

    if overrides.json {
        println!(
            "{}",
            serde_json::json!({
                "uploads": results,
                "expires_at": expires_at,
            })
        );
    } else {
        println!("{}", Table::new(rows));
        if let (Some(duration), Some(expires_at)) = (duration, expires_at) {
            println!();
            println!(
                "  Litterbox links expire after {} (around {})",
                duration,
                expires_at.format("%Y-%m-%d %H:%M UTC")
            );
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} uploads failed", failures, uploads.len());
    }

    Ok(())
}

/// Handle album commands
pub async fn handle_album(action: AlbumCommand, overrides: &Overrides) -> Result<()> {
    let client = build_client(overrides)?;

    match action {
        AlbumCommand::Create {
            files,
            title,
            description,
        } => {
            let url = client
                .create_album(&files, &title, &description)
                .await
                .context("Failed to create album")?;
            let shortcode = extract_shortcode(&url)?;

            if overrides.json {
                println!("{}", serde_json::json!({ "url": url, "shortcode": shortcode }));
            } else {
                println!("  ✅ Album created: {}", style(&url).bold());
                println!("  Shortcode: {}", shortcode);
            }

            Ok(())
        }
        AlbumCommand::Edit {
            album,
            files,
            title,
            description,
        } => {
            let shortcode = album_shortcode(&album, &client.config().album_url)?;
            let response = client
                .edit_album(&shortcode, &files, &title, &description)
                .await
                .with_context(|| format!("Failed to edit album '{}'", shortcode))?;

            if overrides.json {
                println!(
                    "{}",
                    serde_json::json!({ "shortcode": shortcode, "response": response })
                );
            } else {
                println!("  ✅ Album '{}' now holds {} file(s)", shortcode, files.len());
            }

            Ok(())
        }
        AlbumCommand::Delete { album } => {
            let shortcode = album_shortcode(&album, &client.config().album_url)?;

            if !overrides.json {
                println!("⚠️  Deleting album '{}' (its files are kept)", shortcode);
            }

            client
                .delete_album(&shortcode)
                .await
                .with_context(|| format!("Failed to delete album '{}'", shortcode))?;

            if overrides.json {
                println!("{}", serde_json::json!({ "deleted": shortcode }));
            } else {
                println!("  ✅ Album deleted: {}", shortcode);
            }

            Ok(())
        }
    }
}

/// Handle files delete command
pub async fn handle_delete_files(files: &[String], overrides: &Overrides) -> Result<()> {
    let client = build_client(overrides)?;

    if !overrides.json {
        println!("⚠️  Permanently deleting {} file(s)", files.len());
        println!("  This action is IRREVERSIBLE!");
    }

    client
        .delete_files(files)
        .await
        .context("Failed to delete files")?;

    if overrides.json {
        println!("{}", serde_json::json!({ "deleted": files }));
    } else {
        println!("  ✅ Files deleted");
    }

    Ok(())
}

/// Handle shortcode command
pub fn handle_shortcode(url: &str, overrides: &Overrides) -> Result<()> {
    let shortcode = extract_shortcode(url)?;

    if overrides.json {
        println!("{}", serde_json::json!({ "url": url, "shortcode": shortcode }));
    } else {
        println!("{}", shortcode);
    }

    Ok(())
}

/// Handle shell completion generation
pub fn handle_completion(shell: &str, cmd: &mut Command) -> Result<()> {
    let clap_shell = match shell {
        "bash" => ClapShell::Bash,
        "zsh" => ClapShell::Zsh,
        "fish" => ClapShell::Fish,
        "elvish" => ClapShell::Elvish,
        "powershell" | "pwsh" => ClapShell::PowerShell,
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported shell: {}\nSupported shells: bash, zsh, fish, elvish, powershell",
                shell
            ));
        }
    };

    generate(clap_shell, cmd, "catbox", &mut std::io::stdout());

    Ok(())
}

fn config_path(overrides: &Overrides) -> Result<PathBuf> {
    match &overrides.config_path {
        Some(path) => Ok(path.clone()),
        None => Ok(get_config_path()?),
    }
}

/// Load the config file; a missing file means defaults
pub(crate) fn load_file(path: &Path) -> Result<ConfigFile> {
    match load_config_from(path) {
        Ok(file) => Ok(file),
        Err(CoreError::ConfigNotFound(_)) => Ok(ConfigFile::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to load {}", path.display())),
    }
}

fn client_config(file: &ConfigFile, overrides: &Overrides) -> ClientConfig {
    let mut config = ClientConfig::from_file(file);
    if let Some(userhash) = &overrides.userhash {
        config = config.with_userhash(userhash.clone());
    }
    if let Some(timeout) = overrides.timeout {
        config = config.with_timeout(Duration::from_secs(timeout));
    }
    config
}

fn build_client(overrides: &Overrides) -> Result<CatboxClient> {
    let file = load_file(&config_path(overrides)?)?;
    init_logging(overrides.verbose, &file);

    let config = client_config(&file, overrides);
    config.validate()?;
    tracing::debug!(config = ?config, "Client configuration");

    Ok(CatboxClient::new(config)?)
}

fn init_logging(verbose: u8, file: &ConfigFile) {
    let level = match verbose {
        0 => file
            .logging
            .as_ref()
            .map(|l| l.level.clone())
            .unwrap_or_else(|| "warn".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("catbox={0},catbox_core={0}", level)));

    // Ignore a second initialisation
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Expand directories and check every path before anything is sent
fn collect_files(paths: &[PathBuf], recursive: bool) -> Result<Vec<PendingUpload>> {
    let mut uploads = Vec::new();

    for path in paths {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("File not found: {}", path.display()))?;

        if metadata.is_file() {
            uploads.push(PendingUpload {
                path: path.clone(),
                size: metadata.len(),
            });
            continue;
        }

        if !recursive {
            anyhow::bail!("{} is a directory (use --recursive)", path.display());
        }

        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                uploads.push(PendingUpload {
                    path: entry.path().to_path_buf(),
                    size: entry.metadata()?.len(),
                });
            }
        }
    }

    if uploads.is_empty() {
        anyhow::bail!("No files to upload");
    }

    Ok(uploads)
}

fn expiry_time(duration: LitterboxDuration) -> chrono::DateTime<chrono::Utc> {
    let retention = chrono::Duration::from_std(duration.as_duration())
        .unwrap_or_else(|_| chrono::Duration::hours(1));
    chrono::Utc::now() + retention
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Show only the first 4 characters of a secret
fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{}...", visible)
}

/// Format bytes to human-readable size
fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}
