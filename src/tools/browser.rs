//! Opening URLs in the default browser

use std::io;
use std::process::{Command, Stdio};

/// Opens a URL; callers treat it as fire-and-forget
pub trait Browser: Send + Sync {
    /// Open `url` in a new tab
    ///
    /// # Errors
    /// Returns an error if the browser could not be launched.
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Opens URLs with the platform's default opener
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        opener(url).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null()).spawn()?;
        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn opener(url: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    cmd
}

#[cfg(windows)]
fn opener(url: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(url);
    cmd
}

#[cfg(not(any(target_os = "macos", windows)))]
fn opener(url: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(url);
    cmd
}

/// DuckDuckGo search URL for `query`, spaces encoded as `+`
#[must_use]
pub fn search_url(query: &str) -> String {
    let encoded = urlencoding::encode(query).replace("%20", "+");
    format!("https://duckduckgo.com/?q={encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encoding() {
        assert_eq!(
            search_url("Python asyncio tutorial"),
            "https://duckduckgo.com/?q=Python+asyncio+tutorial"
        );
        assert_eq!(search_url("a&b=c+d"), "https://duckduckgo.com/?q=a%26b%3Dc%2Bd");
    }
}
