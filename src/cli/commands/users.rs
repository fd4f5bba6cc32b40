//! Account management command handlers

use std::path::Path;

use super::{confirm, open_service, open_session, password_or_prompt, report_rejection};
use crate::cli::SessionArgs;
use crate::config::Config;
use crate::domain::UserId;
use crate::services::CredentialService;

pub async fn cmd_users_list(config: &Config, search: Option<&str>, json: bool) -> anyhow::Result<()> {
    let service = open_service(config).await?;

    let users = match search {
        Some(query) => service.search_users(query).await,
        None => service.list_users().await,
    };
    let users = match users {
        Ok(users) => users,
        Err(err) => return report_rejection(err),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No matching users.");
        return Ok(());
    }

    println!("{:<6} {:<32} {}", "ID", "Username", "Admin");
    println!("{:-<46}", "");
    for user in users {
        let admin = if user.is_admin { "Yes" } else { "No" };
        println!("{:<6} {:<32} {}", user.id.value(), user.username, admin);
    }

    Ok(())
}

pub async fn cmd_users_rotate_key(
    config: &Config,
    id: i32,
    out: Option<&Path>,
    args: &SessionArgs,
) -> anyhow::Result<()> {
    let service = open_service(config).await?;
    let Some(session) = open_session(&service, args).await? else {
        return Ok(());
    };
    let Some(actor) = session.identity() else {
        return Ok(());
    };

    let key_dir = out.unwrap_or(&config.keys.key_dir);
    let issued = match service
        .rotate_secret_key_to_file(actor, UserId::new(id), key_dir)
        .await
    {
        Ok(issued) => issued,
        Err(err) => return report_rejection(err),
    };

    println!("✓ Secret key for user {} regenerated.", issued.user_id);
    println!(
        "Saved to {}. The previous key no longer works.",
        issued.key_path.display()
    );

    Ok(())
}

pub async fn cmd_users_set_role(
    config: &Config,
    id: i32,
    is_admin: bool,
    args: &SessionArgs,
) -> anyhow::Result<()> {
    let service = open_service(config).await?;
    let Some(session) = open_session(&service, args).await? else {
        return Ok(());
    };

    if !session.is_admin() {
        println!("✗ Permission denied");
        return Ok(());
    }

    match service.set_role(UserId::new(id), is_admin).await {
        Ok(()) if is_admin => println!("✓ User {id} promoted to admin."),
        Ok(()) => println!("✓ User {id} demoted to regular user."),
        Err(err) => return report_rejection(err),
    }

    Ok(())
}

pub async fn cmd_users_delete(
    config: &Config,
    id: i32,
    yes: bool,
    args: &SessionArgs,
) -> anyhow::Result<()> {
    let service = open_service(config).await?;
    let Some(session) = open_session(&service, args).await? else {
        return Ok(());
    };

    if !session.is_admin() {
        println!("✗ Permission denied");
        return Ok(());
    }

    let target = UserId::new(id);
    let user = match service.get_user(target).await {
        Ok(user) => user,
        Err(err) => return report_rejection(err),
    };

    if !yes && !confirm(&format!("Delete user '{}' (ID: {id})?", user.username))? {
        println!("Cancelled.");
        return Ok(());
    }

    match service.delete_user(target).await {
        Ok(()) => println!("✓ Deleted: {}", user.username),
        Err(err) => return report_rejection(err),
    }

    Ok(())
}

pub async fn cmd_users_passwd(
    config: &Config,
    new_password: Option<&str>,
    args: &SessionArgs,
) -> anyhow::Result<()> {
    let service = open_service(config).await?;
    let current = password_or_prompt(args.password.as_deref(), "Current password")?;

    let session_args = SessionArgs {
        password: Some(current.clone()),
        ..args.clone()
    };
    let Some(session) = open_session(&service, &session_args).await? else {
        return Ok(());
    };
    let Some(user_id) = session.user_id() else {
        return Ok(());
    };

    let new_password = password_or_prompt(new_password, "New password")?;
    match service
        .change_password(user_id, &current, &new_password)
        .await
    {
        Ok(()) => println!("✓ Password changed."),
        Err(err) => return report_rejection(err),
    }

    Ok(())
}
