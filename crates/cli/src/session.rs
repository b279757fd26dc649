use std::path::PathBuf;

use anyhow::{bail, Context};
use remote::{HttpSession, RemoteError, RemoteLibrary};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{debug, info, warn};

use crate::args::SessionArgs;
use crate::config::{config_path_from_env, load_or_create_config, ToolsConfig};
use crate::console::Console;

/// Loads the configuration named by `args`, creating it on first use.
pub fn load_config(args: &SessionArgs) -> anyhow::Result<(ToolsConfig, PathBuf)> {
    let path = args.config.clone().unwrap_or_else(config_path_from_env);
    let (config, created) = load_or_create_config(&path)
        .with_context(|| format!("failed to load config {:?}", path))?;
    if created {
        info!("Created default config at {:?}", path);
    } else {
        debug!("Loaded config from {:?}", path);
    }
    Ok((config, path))
}

/// Opens and authenticates a session, prompting for an authorization code
/// when the stored credentials do not work.
pub async fn connect(
    args: &SessionArgs,
    console: &Console,
) -> anyhow::Result<(HttpSession, ToolsConfig)> {
    let (config, path) = load_config(args)?;
    let remote_config = config.remote_config(&path, &args.cred, args.uploader_id.clone());
    let mut session = HttpSession::new(remote_config)?;
    let mut input = BufReader::new(tokio::io::stdin());
    login(&mut session, config.login_attempts, &mut input, console).await?;
    Ok((session, config))
}

pub async fn login<R, I>(
    remote: &mut R,
    attempts: u32,
    input: &mut I,
    console: &Console,
) -> anyhow::Result<()>
where
    R: RemoteLibrary + ?Sized,
    I: AsyncBufRead + Unpin,
{
    for attempt in 1..=attempts.max(1) {
        match remote.authenticate().await {
            Ok(()) => {
                console.say("Successfully logged in.\n");
                return Ok(());
            }
            Err(RemoteError::AuthenticationFailed(reason)) => {
                warn!("Login attempt {} failed: {}", attempt, reason);
            }
            Err(err) => return Err(err).context("login failed"),
        }
        if attempt == attempts.max(1) {
            break;
        }

        console.always(format!(
            "\nVisit the following URL to authorize this device:\n\n{}\n",
            remote.authorize_url()
        ));
        let code = match console.ask(input, "Enter the authorization code: ").await? {
            Some(code) if !code.trim().is_empty() => code,
            _ => break,
        };
        if let Err(err) = remote.exchange_code(&code).await {
            console.always("\nUnable to login with specified authorization code.");
            warn!("Code exchange failed: {}", err);
        }
    }
    bail!("Sorry, login failed.")
}

/// Ends the session; failures only get logged.
pub async fn finish<R: RemoteLibrary + ?Sized>(remote: &mut R) {
    if let Err(err) = remote.logout().await {
        warn!("Logout failed: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::login;
    use crate::console::Console;
    use crate::testing::FakeRemote;

    #[tokio::test]
    async fn stored_credentials_log_in_directly() {
        let mut remote = FakeRemote {
            logged_in: true,
            ..FakeRemote::default()
        };
        let mut input: &[u8] = b"";
        login(&mut remote, 3, &mut input, &Console::new(true)).await.unwrap();
        assert_eq!(remote.auth_calls, 1);
    }

    #[tokio::test]
    async fn code_exchange_unlocks_login() {
        let mut remote = FakeRemote::default();
        remote.valid_codes = vec!["good".to_string()];
        let mut input: &[u8] = b"bad\ngood\n";
        login(&mut remote, 3, &mut input, &Console::new(true)).await.unwrap();
        assert_eq!(remote.auth_calls, 3);
    }

    #[tokio::test]
    async fn gives_up_after_attempts() {
        let mut remote = FakeRemote::default();
        let mut input: &[u8] = b"x\ny\nz\n";
        let err = login(&mut remote, 2, &mut input, &Console::new(true))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Sorry, login failed.");
        assert_eq!(remote.auth_calls, 2);
    }

    #[tokio::test]
    async fn end_of_input_stops_prompting() {
        let mut remote = FakeRemote::default();
        let mut input: &[u8] = b"";
        assert!(login(&mut remote, 5, &mut input, &Console::new(true)).await.is_err());
        assert_eq!(remote.auth_calls, 1);
    }
}
