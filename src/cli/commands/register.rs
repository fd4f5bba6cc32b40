//! Register command handler

use std::path::Path;

use super::{open_service, password_or_prompt, report_rejection};
use crate::config::Config;
use crate::services::CredentialService;

pub async fn cmd_register(
    config: &Config,
    username: &str,
    password: Option<&str>,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let service = open_service(config).await?;

    let password = if let Some(password) = password {
        password.to_string()
    } else {
        let first = password_or_prompt(None, "Password")?;
        let confirmation = password_or_prompt(None, "Confirm password")?;
        if first != confirmation {
            println!("✗ Passwords do not match.");
            return Ok(());
        }
        first
    };

    let key_dir = out.unwrap_or(&config.keys.key_dir);
    let issued = match service.register(username, &password, key_dir).await {
        Ok(issued) => issued,
        Err(err) => return report_rejection(err),
    };

    println!("✓ Registered '{username}' (ID: {})", issued.user_id);
    println!("Secret key saved to {}", issued.key_path.display());
    println!("You will need this file to log in. Store it securely.");

    Ok(())
}
