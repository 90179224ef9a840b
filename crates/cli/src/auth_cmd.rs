use anyhow::{bail, Context, Result};
use clap::Args;
use mcphub_api::{AuthType, StoredAuthConfig};
use mcphub_dashboard::AuthConfigDraft;
use mcphub_dashboard::auth_editor::generate_api_key;

use crate::connect::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum AuthModeArg {
    None,
    ApiKey,
    EntraId,
}

impl From<AuthModeArg> for AuthType {
    fn from(value: AuthModeArg) -> Self {
        match value {
            AuthModeArg::None => AuthType::None,
            AuthModeArg::ApiKey => AuthType::ApiKey,
            AuthModeArg::EntraId => AuthType::EntraId,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct AuthArgs {
    pub app: String,

    /// Switch the endpoint to this mode; omit to show the current config
    #[arg(long, value_enum)]
    pub set: Option<AuthModeArg>,

    /// Shared secret for `api-key` mode
    #[arg(long, conflicts_with = "generate")]
    pub api_key: Option<String>,

    /// Generate a random shared secret for `api-key` mode
    #[arg(long)]
    pub generate: bool,

    /// Directory (tenant) ID for `entra-id` mode
    #[arg(long)]
    pub tenant_id: Option<String>,

    /// Application (client) ID for `entra-id` mode
    #[arg(long)]
    pub client_id: Option<String>,
}

pub async fn run(session: &Session, args: AuthArgs) -> Result<()> {
    let stored = session.client.auth_config(&args.app).await?.auth;
    let Some(mode) = args.set else {
        print!("{}", describe(&stored));
        return Ok(());
    };

    let draft = build_draft(stored, mode.into(), &args)?;
    let resp = session
        .client
        .set_auth_config(&args.app, &draft.to_config())
        .await?;
    if let Some(error) = resp.error {
        eprintln!("Warning: {}: {error}", args.app);
    }
    eprintln!("{}: {}", args.app, draft.auth_type.display());
    if args.generate {
        println!("{}", draft.api_key);
    }
    Ok(())
}

/// Merge flags over the stored config so unchanged fields keep their values.
fn build_draft(stored: StoredAuthConfig, mode: AuthType, args: &AuthArgs) -> Result<AuthConfigDraft> {
    let mut draft = AuthConfigDraft::from_stored(stored);
    draft.auth_type = mode;
    if let Some(key) = &args.api_key {
        draft.api_key = key.clone();
    }
    if args.generate {
        draft.api_key = generate_api_key().context("Failed to generate an API key")?;
    }
    if let Some(tenant) = &args.tenant_id {
        draft.tenant_id = tenant.clone();
    }
    if let Some(client) = &args.client_id {
        draft.client_id = client.clone();
    }

    match mode {
        AuthType::ApiKey if draft.api_key.trim().is_empty() => {
            bail!("api-key mode needs --api-key or --generate")
        }
        AuthType::EntraId if draft.tenant_id.trim().is_empty() || draft.client_id.trim().is_empty() => {
            bail!("entra-id mode needs --tenant-id and --client-id")
        }
        _ => Ok(draft),
    }
}

fn describe(stored: &StoredAuthConfig) -> String {
    let mut out = format!("mode: {}\n", stored.auth_type.display());
    match stored.auth_type {
        AuthType::None => {}
        AuthType::ApiKey => {
            out.push_str(&format!("api_key: {}\n", stored.api_key.as_deref().unwrap_or("")));
        }
        AuthType::EntraId => {
            out.push_str(&format!("tenant_id: {}\n", stored.tenant_id.as_deref().unwrap_or("")));
            out.push_str(&format!("client_id: {}\n", stored.client_id.as_deref().unwrap_or("")));
        }
    }
    out
}
