//! Interactive setup wizard for catbox configuration

use anyhow::Result;
use crate::handlers::load_file;
use catbox_core::{save_config_to, validate_config, AdvancedConfig, CatboxConfig, ConfigFile};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use std::path::Path;

/// Run the interactive setup wizard
pub async fn run_init_wizard(config_path: &Path) -> Result<()> {
    println!("🚀 Welcome to catbox setup!\n");

    println!("This wizard writes {}.", config_path.display());
    println!("A userhash attaches uploads to your account and enables albums.");
    println!("Find yours at https://catbox.moe/user/manage.php (leave empty for anonymous use).\n");

    let mut config = starting_config(config_path)?;

    // Step 1: userhash
    let userhash = prompt_userhash()?;

    // Step 2: timeout
    let timeout = prompt_timeout(config.advanced.as_ref().map(|a| a.timeout).unwrap_or(30))?;

    config.catbox = CatboxConfig {
        userhash: userhash.clone(),
        ..config.catbox
    };
    config.advanced = Some(AdvancedConfig { timeout });

    validate_config(&config)?;

    // Summary
    println!("\n📋 Configuration summary:");
    println!(
        "  Account: {}",
        if userhash.is_some() {
            "userhash set"
        } else {
            "anonymous"
        }
    );
    println!("  API: {}", config.catbox.api_url);
    println!("  Timeout: {}s", timeout);

    // Confirmation
    let confirm = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Save this configuration?")
        .default(true)
        .interact()?;

    if !confirm {
        println!("❌ Configuration cancelled");
        return Ok(());
    }

    save_config_to(&config, config_path)?;

    println!("\n🎉 Setup complete!");
    println!("\nYou can now use catbox:");
    println!("  $ catbox upload photo.png");
    println!("  $ catbox litterbox --time 24h notes.txt");
    if userhash.is_some() {
        println!("  $ catbox album create abc123.png def456.jpg --title \"Holiday\"");
    }

    Ok(())
}

/// Existing settings to build on; endpoint overrides are kept. A file that
/// exists but cannot be parsed aborts the wizard instead of being replaced.
fn starting_config(config_path: &Path) -> Result<ConfigFile> {
    load_file(config_path)
}

/// Prompt for the account userhash; empty input means anonymous
fn prompt_userhash() -> Result<Option<String>> {
    let userhash: String = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Userhash (optional)")
        .allow_empty_password(true)
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.chars().any(char::is_whitespace) {
                Err("Userhash cannot contain spaces")
            } else {
                Ok(())
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to get userhash: {}", e))?;

    Ok(if userhash.is_empty() { None } else { Some(userhash) })
}

/// Prompt for the request timeout in seconds
fn prompt_timeout(default: u64) -> Result<u64> {
    Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Request timeout (seconds)")
        .default(default)
        .validate_with(|input: &u64| -> Result<(), &str> {
            if *input == 0 {
                Err("Timeout must be at least 1 second")
            } else if *input > 3600 {
                Err("Timeout cannot exceed 3600 seconds")
            } else {
                Ok(())
            }
        })
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to get timeout: {}", e))
}
