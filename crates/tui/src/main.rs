use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mcphub-tui", about = "Terminal dashboard for mcphub")]
struct Args {
    /// Config file (defaults to ~/.config/mcphub/mcphub.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend URL, e.g. http://localhost:8081
    #[arg(long)]
    server: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    mcphub_tui::run(mcphub_tui::RunOptions {
        config_path: args.config,
        server_url: args.server,
    })
}
