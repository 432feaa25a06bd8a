//! Clipboard copy with automatic clearing.
//!
//! The copy goes through the platform's clipboard tool (`pbcopy`, `clip`,
//! `wl-copy` or `xclip`). A detached shell then empties the clipboard after
//! [`CLEAR_SECONDS`], so the password does not linger once the command has
//! exited.

use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

/// Seconds before a copied password is cleared from the clipboard.
pub const CLEAR_SECONDS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tool {
    Pbcopy,
    Clip,
    WlCopy,
    Xclip,
}

impl Tool {
    fn detect() -> Option<Self> {
        if cfg!(target_os = "macos") {
            Some(Self::Pbcopy)
        } else if cfg!(target_os = "windows") {
            Some(Self::Clip)
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() && command_exists("wl-copy") {
            Some(Self::WlCopy)
        } else if command_exists("xclip") {
            Some(Self::Xclip)
        } else {
            None
        }
    }

    fn copy_command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Pbcopy => ("pbcopy", &[]),
            Self::Clip => ("clip", &[]),
            Self::WlCopy => ("wl-copy", &[]),
            Self::Xclip => ("xclip", &["-selection", "clipboard"]),
        }
    }

    fn clear_command(self, seconds: u64) -> (&'static str, Vec<String>) {
        let unix = |clear: &str| ("sh", vec!["-c".to_string(), format!("sleep {seconds} && {clear}")]);
        match self {
            Self::Pbcopy => unix("printf '' | pbcopy"),
            Self::WlCopy => unix("wl-copy --clear"),
            Self::Xclip => unix("printf '' | xclip -selection clipboard"),
            Self::Clip => (
                "powershell",
                vec![
                    "-WindowStyle".to_string(),
                    "Hidden".to_string(),
                    "-Command".to_string(),
                    format!("Start-Sleep -Seconds {seconds}; Set-Clipboard -Value ''"),
                ],
            ),
        }
    }
}

/// Copy `secret` to the clipboard and schedule clearing it.
pub fn copy_with_clear(secret: &str) -> Result<()> {
    let Some(tool) = Tool::detect() else {
        bail!("no clipboard tool found; install xclip (X11) or wl-clipboard (Wayland)");
    };

    let (program, args) = tool.copy_command();
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to run {program}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(secret.as_bytes())
            .with_context(|| format!("failed to write to {program}"))?;
    }

    let status = child.wait()?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }

    let (program, args) = tool.clear_command(CLEAR_SECONDS);
    Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to schedule clipboard clearing")?;

    tracing::debug!(?tool, seconds = CLEAR_SECONDS, "copied secret to clipboard");
    Ok(())
}

fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_clear_waits_then_empties() {
        let (program, args) = Tool::Xclip.clear_command(20);
        assert_eq!(program, "sh");
        assert_eq!(args, ["-c", "sleep 20 && printf '' | xclip -selection clipboard"]);

        let (_, args) = Tool::WlCopy.clear_command(5);
        assert_eq!(args[1], "sleep 5 && wl-copy --clear");
    }

    #[test]
    fn windows_clear_uses_powershell() {
        let (program, args) = Tool::Clip.clear_command(20);
        assert_eq!(program, "powershell");
        assert!(args.last().unwrap().contains("Start-Sleep -Seconds 20"));
    }

    #[test]
    fn xclip_targets_clipboard_selection() {
        assert_eq!(
            Tool::Xclip.copy_command(),
            ("xclip", &["-selection", "clipboard"][..])
        );
    }
}
