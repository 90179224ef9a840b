use anyhow::{Context, Result};
use clap::Args;
use mcphub_runtime_config::HubConfig;
use std::path::{Path, PathBuf};

/// `mcphub config` prints the effective configuration. Any setting flag
/// (including the global `--server`) writes the config file instead.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Externally reachable port of the app IDE proxy
    #[arg(long)]
    pub ide_port: Option<u16>,

    /// Roster refresh interval in seconds
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Per-request timeout in seconds (0 disables)
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Only print the config file location
    #[arg(long)]
    pub path: bool,
}

pub fn run(args: ConfigArgs, config_path: Option<&Path>, server: Option<String>) -> Result<()> {
    let path = resolve_path(config_path)?;
    if args.path {
        println!("{}", path.display());
        return Ok(());
    }

    let has_updates = server.is_some()
        || args.ide_port.is_some()
        || args.poll_interval.is_some()
        || args.request_timeout.is_some();
    if !has_updates {
        return show(&path);
    }

    let mut config = mcphub_runtime_config::load_file(&path)?;
    apply_updates(&mut config, &args, server);
    mcphub_runtime_config::save(&config, &path)?;
    println!("Saved {}", path.display());
    Ok(())
}

fn resolve_path(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path {
        Some(p) => Ok(p.to_path_buf()),
        None => mcphub_runtime_config::default_config_path(),
    }
}

fn show(path: &Path) -> Result<()> {
    let config = mcphub_runtime_config::load(Some(path))?;
    let exists = if path.exists() { "" } else { " (not created yet)" };
    println!("# {}{exists}", path.display());
    print!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to render configuration")?
    );
    Ok(())
}

fn apply_updates(config: &mut HubConfig, args: &ConfigArgs, server: Option<String>) {
    if let Some(url) = server {
        config.server.url = url.trim().trim_end_matches('/').to_string();
    }
    if let Some(port) = args.ide_port {
        config.dashboard.ide_port = port;
    }
    if let Some(secs) = args.poll_interval {
        config.dashboard.poll_interval_secs = secs.max(1);
    }
    if let Some(secs) = args.request_timeout {
        config.server.request_timeout_secs = (secs > 0).then_some(secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcphub.toml");
        let args = ConfigArgs {
            ide_port: Some(9443),
            request_timeout: Some(30),
            ..ConfigArgs::default()
        };
        run(args, Some(&path), Some("http://hub.lan:8081/".to_string())).unwrap();

        let saved = mcphub_runtime_config::load_file(&path).unwrap();
        assert_eq!(saved.server.url, "http://hub.lan:8081");
        assert_eq!(saved.server.request_timeout_secs, Some(30));
        assert_eq!(saved.dashboard.ide_port, 9443);
        assert_eq!(saved.dashboard.poll_interval_secs, 5);
    }

    #[test]
    fn zero_timeout_clears_the_setting() {
        let mut config = HubConfig::default();
        config.server.request_timeout_secs = Some(10);
        let args = ConfigArgs {
            request_timeout: Some(0),
            ..ConfigArgs::default()
        };
        apply_updates(&mut config, &args, None);
        assert_eq!(config.server.request_timeout_secs, None);
    }

    #[test]
    fn default_config_renders_every_section() {
        let text = toml::to_string_pretty(&HubConfig::default()).unwrap();
        assert!(text.contains("[server]"));
        assert!(text.contains("url = \"http://localhost:8081\""));
        assert!(text.contains("ide_port = 8085"));
    }
}
