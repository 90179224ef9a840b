use anyhow::{bail, Context, Result};
use mcphub_api::{ActionResponse, AppSummary};
use mcphub_dashboard::actions::DUPLICATE_NAME_MESSAGE;

use crate::connect::Session;

pub async fn list(session: &Session) -> Result<()> {
    let apps = session.client.list_apps().await?;
    print!("{}", format_table(&apps));
    Ok(())
}

pub async fn deploy(session: &Session, app: &str) -> Result<()> {
    let summary = find(session, app).await?;
    eprintln!("{} {app}...", if summary.is_running() { "Restarting" } else { "Deploying" });
    report(app, "deployed", session.client.deploy(app).await?);
    Ok(())
}

pub async fn stop(session: &Session, app: &str) -> Result<()> {
    if !find(session, app).await?.is_running() {
        bail!("{app} is not running");
    }
    report(app, "stopped", session.client.stop(app).await?);
    Ok(())
}

pub async fn delete(session: &Session, app: &str, yes: bool) -> Result<()> {
    find(session, app).await?;
    if !confirm(&format!("Delete {app}? This removes the app and its files"), yes)? {
        eprintln!("Cancelled.");
        return Ok(());
    }
    report(app, "deleted", session.client.delete(app).await?);
    Ok(())
}

pub async fn create(session: &Session, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("App name must not be empty");
    }
    let apps = session.client.list_apps().await?;
    if apps.iter().any(|a| a.name == name) {
        bail!("{DUPLICATE_NAME_MESSAGE}");
    }
    report(name, "created", session.client.create(name).await?);
    Ok(())
}

pub async fn logs(session: &Session, app: &str) -> Result<()> {
    let text = session
        .client
        .logs(app)
        .await
        .with_context(|| format!("No logs found for {app}"))?;
    print!("{text}");
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

pub async fn password(session: &Session, app: &str, reset: bool, yes: bool) -> Result<()> {
    if !find(session, app).await?.is_running() {
        bail!("{app} is not running; start it before reading its password");
    }
    let resp = if reset {
        let prompt = format!("Reset the Web IDE password of {app}? The old password stops working");
        if !confirm(&prompt, yes)? {
            eprintln!("Cancelled.");
            return Ok(());
        }
        session.client.reset_password(app).await?
    } else {
        session.client.password(app).await?
    };
    match (resp.password, resp.error) {
        (Some(password), _) => println!("{password}"),
        (None, Some(error)) => bail!("{error}"),
        (None, None) => bail!("The backend returned no password"),
    }
    Ok(())
}

pub async fn open(session: &Session, app: &str) -> Result<()> {
    if !find(session, app).await?.is_running() {
        bail!("{app} is not running; the Web IDE is only reachable while it runs");
    }
    let url = mcphub_api::ide_url(&session.config.server.url, session.config.dashboard.ide_port, app)
        .with_context(|| format!("Cannot derive a host from {}", session.config.server.url))?;
    println!("{url}");
    Ok(())
}

/// Ask before a destructive request. `--yes` answers for the operator.
fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("Confirmation required (use --yes)")
}

async fn find(session: &Session, app: &str) -> Result<AppSummary> {
    let apps = session.client.list_apps().await?;
    apps.into_iter()
        .find(|a| a.name == app)
        .with_context(|| format!("No app named {app}"))
}

fn report(app: &str, verb: &str, resp: ActionResponse) {
    match resp.error {
        Some(error) => eprintln!("Warning: {app}: {error}"),
        None => eprintln!("{app} {verb}"),
    }
}

fn format_table(apps: &[AppSummary]) -> String {
    if apps.is_empty() {
        return "No apps.\n".to_string();
    }
    let name_width = apps.iter().map(|a| a.name.len()).max().unwrap_or(0).max(4);
    let status_width = apps
        .iter()
        .map(|a| a.status_label().len())
        .max()
        .unwrap_or(0)
        .max(6);
    let mut out = format!("{:<name_width$}  {:<status_width$}  AUTH\n", "NAME", "STATUS");
    for app in apps {
        out.push_str(&format!(
            "{:<name_width$}  {:<status_width$}  {}\n",
            app.name,
            app.status_label(),
            app.auth_type.badge().unwrap_or("-"),
        ));
    }
    out
}
