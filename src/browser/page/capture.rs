//! Screenshot capture methods.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Command, PageCommand};

use super::Page;

// ============================================================================
// Page - Capture
// ============================================================================

impl Page {
    /// Captures the viewport as PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the response carries no data, or
    /// [`Error::Base64`] if the data does not decode.
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        debug!(target_id = %self.target_id(), "Capturing screenshot");

        let result = self
            .execute(Command::Page(PageCommand::CaptureScreenshot {
                format: "png".to_string(),
            }))
            .await?;

        let data = result
            .get("data")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::protocol("Page.captureScreenshot returned no data"))?;

        let bytes = Base64Standard.decode(data)?;
        debug!(target_id = %self.target_id(), bytes = bytes.len(), "Screenshot captured");
        Ok(bytes)
    }

    /// Captures the viewport and writes it as a PNG file.
    ///
    /// # Errors
    ///
    /// Same as [`screenshot`](Self::screenshot), plus [`Error::Io`].
    pub async fn save_screenshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.screenshot().await?;
        tokio::fs::write(path.as_ref(), bytes).await?;
        debug!(path = %path.as_ref().display(), "Screenshot saved");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::browser::page::testing::page;
    use crate::error::Error;
    use crate::transport::testing::connected;
    use serde_json::json;

    /// PNG signature.
    const PNG_MAGIC_B64: &str = "iVBORw0KGgo=";

    #[tokio::test]
    async fn test_screenshot_decodes_png() {
        let (connection, browser) = connected().await;
        browser.serve(|method, params, _| {
            assert_eq!(method, "Page.captureScreenshot");
            assert_eq!(params["format"], "png");
            Ok(json!({"data": PNG_MAGIC_B64}))
        });
        let dir = tempfile::tempdir().expect("tempdir");
        let page = page(connection, &dir);

        let bytes = page.screenshot().await.expect("screenshot");
        assert_eq!(&bytes[..4], b"\x89PNG");

        let file = dir.path().join("shot.png");
        page.save_screenshot(&file).await.expect("save");
        assert_eq!(std::fs::read(&file).expect("read"), bytes);
    }

    #[tokio::test]
    async fn test_screenshot_bad_data() {
        let (connection, browser) = connected().await;
        browser.serve(|_, _, _| Ok(json!({"data": "***"})));
        let dir = tempfile::tempdir().expect("tempdir");

        let err = page(connection, &dir).screenshot().await.unwrap_err();
        assert!(matches!(err, Error::Base64(_)));
    }
}
