//! Clipboard and browser hand-off through the platform's own tools.

use anyhow::{Context, Result, bail};
use std::io::Write;
use std::process::{Command, Stdio};

fn pipe_to(program: &str, args: &[&str], value: &str) -> Result<bool> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("launch {program}"))?;
    if let Some(stdin) = child.stdin.as_mut() {
        stdin
            .write_all(value.as_bytes())
            .with_context(|| format!("write {program}"))?;
    }
    let status = child.wait().with_context(|| format!("wait {program}"))?;
    Ok(status.success())
}

pub fn copy_to_clipboard(value: &str) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        if pipe_to("pbcopy", &[], value)? {
            return Ok(());
        }
    }

    #[cfg(target_os = "linux")]
    {
        if pipe_to("xclip", &["-selection", "clipboard"], value).unwrap_or(false) {
            return Ok(());
        }
        if pipe_to("wl-copy", &[], value)? {
            return Ok(());
        }
    }

    #[cfg(target_os = "windows")]
    {
        if pipe_to("clip", &[], value)? {
            return Ok(());
        }
    }

    let _ = value;
    bail!("clipboard copy is unavailable on this platform")
}

/// Open `url` in the default browser without waiting for it.
pub fn open_url(url: &str) -> Result<()> {
    let (program, args): (&str, Vec<&str>) = if cfg!(target_os = "macos") {
        ("open", vec![url])
    } else if cfg!(target_os = "windows") {
        ("cmd", vec!["/C", "start", "", url])
    } else {
        ("xdg-open", vec![url])
    };
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("launch {program}"))?;
    Ok(())
}
