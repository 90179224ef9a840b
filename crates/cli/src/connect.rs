use anyhow::{bail, Context, Result};
use mcphub_api_client::ApiClient;
use mcphub_runtime_config::HubConfig;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable consulted when `--password` is absent.
pub const ENV_PASSWORD: &str = "MCPHUB_PASSWORD";

#[derive(Debug, Clone, Default)]
pub struct ConnectArgs {
    pub config_path: Option<PathBuf>,
    pub server_url: Option<String>,
    pub password: Option<String>,
}

/// An authenticated client plus the configuration it was built from.
pub struct Session {
    pub client: ApiClient,
    pub config: HubConfig,
}

/// Load config, build the client, and log in unless the cookie is already
/// accepted.
pub async fn connect(args: &ConnectArgs) -> Result<Session> {
    let mut config = mcphub_runtime_config::load(args.config_path.as_deref())?;
    if let Some(url) = &args.server_url {
        config.server.url = url.clone();
    }
    let client = ApiClient::new(&config.server.url, config.server.request_timeout())
        .context("Failed to build HTTP client")?;

    let already = client
        .auth_check()
        .await
        .with_context(|| format!("Cannot connect to {}", config.server.url))?;
    if !already {
        let password = resolve_password(args.password.clone(), |key| std::env::var(key).ok())?;
        let resp = client
            .login(&password)
            .await
            .with_context(|| format!("Cannot connect to {}", config.server.url))?;
        if !resp.is_ok() {
            bail!("Incorrect password.");
        }
        debug!(server = %config.server.url, "logged in");
    }
    Ok(Session { client, config })
}

fn resolve_password(flag: Option<String>, env: impl Fn(&str) -> Option<String>) -> Result<String> {
    if let Some(password) = flag.or_else(|| env(ENV_PASSWORD)).filter(|p| !p.is_empty()) {
        return Ok(password);
    }
    dialoguer::Password::new()
        .with_prompt("Dashboard password")
        .interact()
        .context("No password given (use --password or MCPHUB_PASSWORD)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_environment() {
        let password = resolve_password(Some("flag".into()), |_| Some("env".into())).unwrap();
        assert_eq!(password, "flag");
    }

    #[test]
    fn environment_used_when_flag_missing() {
        let password = resolve_password(None, |key| {
            (key == ENV_PASSWORD).then(|| "from-env".to_string())
        })
        .unwrap();
        assert_eq!(password, "from-env");
    }
}
