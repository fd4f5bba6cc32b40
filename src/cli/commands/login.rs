use std::path::Path;

use super::{open_service, password_or_prompt, report_rejection};
use crate::config::Config;
use crate::services::{Session, secret_key};

pub async fn cmd_login(
    config: &Config,
    username: &str,
    password: Option<&str>,
    key_file: &Path,
) -> anyhow::Result<()> {
    let service = open_service(config).await?;

    let password = password_or_prompt(password, "Password")?;
    let key = secret_key::read_key_file(key_file).await?;

    let mut session = Session::anonymous();
    if let Err(err) = session.login(&service, username, &password, &key).await {
        return report_rejection(err);
    }

    let role = if session.is_admin() { "admin" } else { "user" };
    if let Some(user_id) = session.user_id() {
        println!("✓ Authenticated as '{username}' (ID: {user_id}, role: {role})");
    }

    session.logout();
    Ok(())
}
