mod init;
mod login;
mod register;
mod users;

pub use init::cmd_init;
pub use login::cmd_login;
pub use register::cmd_register;
pub use users::{
    cmd_users_delete, cmd_users_list, cmd_users_passwd, cmd_users_rotate_key, cmd_users_set_role,
};

use anyhow::Context;
use std::io::Write;

use crate::cli::SessionArgs;
use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthError, CredentialService, SeaOrmCredentialService, Session, secret_key};

/// Open the store, build the credential service and make sure the bootstrap
/// admin exists.
pub(crate) async fn open_service(config: &Config) -> anyhow::Result<SeaOrmCredentialService> {
    let store = Store::from_config(&config.general).await?;
    let service = SeaOrmCredentialService::from_config(store, &config.security)?;

    if let Some(report) = service.ensure_bootstrap_admin(&config.keys.key_dir).await? {
        println!("Created bootstrap account 'admin' (ID: {}).", report.user_id);
        println!("Its secret key was written to: {}", report.key_path.display());
        println!("Change the default password and keep the key file safe.");
    }

    Ok(service)
}

/// Log in with the session arguments. `None` means the attempt was rejected
/// and a message has already been printed.
pub(crate) async fn open_session(
    service: &SeaOrmCredentialService,
    args: &SessionArgs,
) -> anyhow::Result<Option<Session>> {
    let password = password_or_prompt(args.password.as_deref(), "Password")?;
    let key = secret_key::read_key_file(&args.key_file).await?;

    let mut session = Session::anonymous();
    match session.login(service, &args.username, &password, &key).await {
        Ok(_) => Ok(Some(session)),
        Err(err) => {
            report_rejection(err)?;
            Ok(None)
        }
    }
}

/// Print user-facing rejections; infrastructure failures are returned as errors.
pub(crate) fn report_rejection(err: AuthError) -> anyhow::Result<()> {
    if err.is_user_facing() {
        println!("✗ {err}");
        Ok(())
    } else if matches!(err, AuthError::Storage(_)) {
        Err(anyhow::Error::new(err).context("Storage problem, try again later"))
    } else {
        Err(err.into())
    }
}

pub(crate) fn password_or_prompt(given: Option<&str>, label: &str) -> anyhow::Result<String> {
    if let Some(password) = given {
        return Ok(password.to_string());
    }

    print!("{label}: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .context("Failed to read from stdin")?;

    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

pub(crate) fn confirm(prompt: &str) -> anyhow::Result<bool> {
    println!("{prompt}");
    println!("Enter 'y' to confirm, anything else to cancel:");

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}
