//! xdg-desktop-portal integration for screenshot capture.

use super::types::CaptureError;
use futures::StreamExt;
use std::collections::HashMap;
use zbus::zvariant::{OwnedValue, Value};
use zbus::{Connection, proxy};

/// D-Bus proxy for the xdg-desktop-portal Screenshot interface.
#[proxy(
    interface = "org.freedesktop.portal.Screenshot",
    default_service = "org.freedesktop.portal.Desktop",
    default_path = "/org/freedesktop/portal/desktop"
)]
trait Screenshot {
    /// Returns the object path of a Request whose `Response` signal carries the result.
    async fn screenshot(
        &self,
        parent_window: &str,
        options: HashMap<String, Value<'_>>,
    ) -> zbus::Result<zbus::zvariant::OwnedObjectPath>;
}

/// D-Bus proxy for org.freedesktop.portal.Request.
#[proxy(
    interface = "org.freedesktop.portal.Request",
    default_service = "org.freedesktop.portal.Desktop"
)]
trait Request {
    /// `response`: 0 = success, 1 = cancelled, 2 = other error.
    #[zbus(signal)]
    fn response(&self, response: u32, results: HashMap<String, OwnedValue>) -> zbus::Result<()>;
}

/// How the portal should behave for a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalMode {
    /// Grab every monitor without showing a dialog.
    Immediate,
    /// Let the user pick what to capture in the portal's own dialog.
    Interactive,
}

/// Ask the desktop portal for a screenshot and return the file URI it wrote.
pub async fn capture_via_portal(mode: PortalMode) -> Result<String, CaptureError> {
    log::debug!("Initiating portal screenshot capture: {:?}", mode);

    let connection = Connection::session().await?;
    let proxy = ScreenshotProxy::new(&connection).await?;

    let request_path = proxy
        .screenshot("", build_portal_options(mode))
        .await
        .map_err(|e| {
            log::error!("Portal screenshot call failed: {}", e);
            let text = e.to_string();
            if text.contains("Cancelled") || text.contains("denied") {
                CaptureError::PermissionDenied
            } else {
                CaptureError::DBusError(e)
            }
        })?;

    log::debug!("Screenshot request created: {:?}", request_path);

    let request_proxy = RequestProxy::builder(&connection)
        .path(request_path)?
        .build()
        .await?;

    let mut responses = request_proxy.receive_response().await?;
    let response = responses
        .next()
        .await
        .ok_or_else(|| CaptureError::InvalidResponse("No Response signal received".into()))?;

    let args = response.args().map_err(|e| {
        CaptureError::InvalidResponse(format!("Failed to parse response args: {}", e))
    })?;

    match args.response {
        0 => {
            let uri_value = args.results.get("uri").ok_or_else(|| {
                CaptureError::InvalidResponse("No 'uri' field in response".into())
            })?;
            let uri: &str = uri_value.downcast_ref().map_err(|e| {
                CaptureError::InvalidResponse(format!("URI is not a string: {}", e))
            })?;
            log::info!("Portal captured screenshot: {}", uri);
            Ok(uri.to_string())
        }
        1 => Err(CaptureError::Cancelled("dismissed in portal dialog".into())),
        code => Err(CaptureError::InvalidResponse(format!(
            "Portal returned error code {}",
            code
        ))),
    }
}

fn build_portal_options(mode: PortalMode) -> HashMap<String, Value<'static>> {
    let interactive = mode == PortalMode::Interactive;
    HashMap::from([
        ("modal".to_string(), Value::from(false)),
        ("interactive".to_string(), Value::from(interactive)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_mode_is_not_interactive() {
        let options = build_portal_options(PortalMode::Immediate);
        assert_eq!(options.get("interactive"), Some(&Value::from(false)));
    }

    #[test]
    fn interactive_mode_requests_dialog() {
        let options = build_portal_options(PortalMode::Interactive);
        assert_eq!(options.get("interactive"), Some(&Value::from(true)));
        assert_eq!(options.get("modal"), Some(&Value::from(false)));
    }
}
