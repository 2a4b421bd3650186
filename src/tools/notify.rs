//! Desktop notifications

use std::io;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

/// Shows a notification; best effort, nothing is returned
pub trait Notifier: Send + Sync {
    /// Show `body` under `title`
    fn notify(&self, title: &str, body: &str);
}

/// Notifies through the platform's notification command
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    #[cfg(target_os = "macos")]
    fn command(title: &str, body: &str) -> Command {
        let quote = |s: &str| s.replace('\\', "\\\\").replace('"', "\\\"");
        let mut cmd = Command::new("osascript");
        cmd.arg("-e").arg(format!(
            "display notification \"{}\" with title \"{}\"",
            quote(body),
            quote(title)
        ));
        cmd
    }

    #[cfg(windows)]
    fn command(title: &str, body: &str) -> Command {
        let mut cmd = Command::new("msg");
        cmd.arg("*").arg("/TIME:10").arg(format!("{title}: {body}"));
        cmd
    }

    #[cfg(not(any(target_os = "macos", windows)))]
    fn command(title: &str, body: &str) -> Command {
        let mut cmd = Command::new("notify-send");
        cmd.arg("--expire-time=10000").arg(title).arg(body);
        cmd
    }

    fn show(title: &str, body: &str) -> io::Result<()> {
        Self::command(title, body)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, title: &str, body: &str) {
        match Self::show(title, body) {
            Ok(()) => debug!("Notification shown: {title}"),
            Err(e) => warn!("Failed to show notification '{title}': {e}"),
        }
    }
}
