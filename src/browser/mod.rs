use anyhow::{Context, Result};

/// Open a URL in the user's default browser
///
/// # Errors
/// Returns error if the URL is not an http(s) link or the browser cannot be opened
pub fn open_url(url: &str) -> Result<()> {
    let url = url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        anyhow::bail!("Not a web link: '{}'", url);
    }
    webbrowser::open(url).with_context(|| format!("Failed to open browser for URL: {}", url))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_web_links() {
        assert!(open_url("").is_err());
        assert!(open_url("file:///etc/passwd").is_err());
    }
}
