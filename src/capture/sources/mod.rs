use crate::capture::portal::PortalMode;
use crate::capture::request::{CaptureMode, CaptureRequest, ScreenTarget};
use crate::capture::screens::ScreenLayout;
use crate::capture::types::CaptureError;
use crate::util::Rect;

mod grim;
mod portal;
pub(crate) mod reader;

use grim::GrimTarget;

/// What to grab, derived from a request's mode and initial selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTarget {
    /// User picks a region; a pre-seeded selection is taken as-is.
    Interactive { selection: Option<Rect> },
    /// Every monitor, optionally cropped to a selection.
    Desktop { selection: Option<Rect> },
    /// One monitor, optionally cropped to a selection.
    Screen {
        target: ScreenTarget,
        selection: Option<Rect>,
    },
    /// The portal's own capture chooser.
    Chooser,
}

impl CaptureTarget {
    pub fn for_request(request: &CaptureRequest) -> Self {
        if request.selects_whole_desktop() {
            return CaptureTarget::Desktop { selection: None };
        }
        let selection = request.initial_selection();
        match request.mode() {
            CaptureMode::Graphical => CaptureTarget::Interactive { selection },
            CaptureMode::FullScreen => CaptureTarget::Desktop { selection },
            CaptureMode::Screen(target) => CaptureTarget::Screen { target, selection },
        }
    }
}

/// Image bytes plus the desktop area they cover, when known.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub data: Vec<u8>,
    pub selection: Option<Rect>,
}

/// Acquire pixels for `target`, preferring grim/slurp and falling back to the portal.
pub async fn capture_image(
    target: CaptureTarget,
    layout: &dyn ScreenLayout,
) -> Result<CapturedImage, CaptureError> {
    let fast_path = match target {
        CaptureTarget::Chooser => None,
        CaptureTarget::Interactive { selection } => Some(interactive_via_grim(selection).await),
        CaptureTarget::Desktop { selection: Some(rect) }
        | CaptureTarget::Screen {
            selection: Some(rect),
            ..
        } => Some(geometry_via_grim(rect).await),
        CaptureTarget::Desktop { selection: None } => Some(
            capture_with_selection(GrimTarget::Everything, layout.desktop_geometry().ok()).await,
        ),
        CaptureTarget::Screen {
            target,
            selection: None,
        } => match layout.find(target) {
            Ok(screen) => Some(
                capture_with_selection(GrimTarget::Output(screen.name), Some(screen.geometry))
                    .await,
            ),
            Err(err @ CaptureError::UnknownScreen(_)) => return Err(err),
            Err(err) => Some(Err(err)),
        },
    };

    let grim_error = match fast_path {
        Some(Ok(image)) => return Ok(image),
        Some(Err(CaptureError::Cancelled(reason))) => return Err(CaptureError::Cancelled(reason)),
        Some(Err(err)) => Some(err),
        None => None,
    };

    let Some(mode) = portal_fallback(target) else {
        let reason = grim_error.map_or_else(|| "grim unavailable".to_string(), |e| e.to_string());
        return Err(CaptureError::ImageError(format!(
            "{reason}; the desktop portal cannot capture a single screen or region"
        )));
    };
    if let Some(err) = grim_error {
        log::warn!("grim capture failed: {}. Falling back to portal.", err);
    }

    let data = portal::capture_via_portal_bytes(mode).await?;
    Ok(CapturedImage {
        data,
        selection: None,
    })
}

/// Portal mode able to stand in for `target`. The portal only grabs the
/// whole desktop or lets the user choose, so monitor and cropped targets
/// have no fallback.
fn portal_fallback(target: CaptureTarget) -> Option<PortalMode> {
    match target {
        CaptureTarget::Interactive { .. } | CaptureTarget::Chooser => Some(PortalMode::Interactive),
        CaptureTarget::Desktop { selection: None } => Some(PortalMode::Immediate),
        CaptureTarget::Desktop { selection: Some(_) } | CaptureTarget::Screen { .. } => None,
    }
}

async fn interactive_via_grim(selection: Option<Rect>) -> Result<CapturedImage, CaptureError> {
    let rect = match selection {
        Some(rect) => rect,
        None => grim::select_with_slurp().await?,
    };
    geometry_via_grim(rect).await
}

async fn geometry_via_grim(rect: Rect) -> Result<CapturedImage, CaptureError> {
    capture_with_selection(GrimTarget::Geometry(rect), Some(rect)).await
}

async fn capture_with_selection(
    target: GrimTarget,
    selection: Option<Rect>,
) -> Result<CapturedImage, CaptureError> {
    let data = grim::capture_with_grim(target).await?;
    Ok(CapturedImage { data, selection })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::request::CaptureTask;

    #[test]
    fn target_follows_request_mode() {
        let rect = Rect::new(0, 0, 10, 10).unwrap();
        let request = CaptureRequest::builder(CaptureMode::Screen(ScreenTarget::Index(1)))
            .initial_selection(rect)
            .task(CaptureTask::Copy)
            .build();
        assert_eq!(
            CaptureTarget::for_request(&request),
            CaptureTarget::Screen {
                target: ScreenTarget::Index(1),
                selection: Some(rect)
            }
        );

        let graphical = CaptureRequest::builder(CaptureMode::Graphical).build();
        assert_eq!(
            CaptureTarget::for_request(&graphical),
            CaptureTarget::Interactive { selection: None }
        );
    }

    #[test]
    fn whole_desktop_request_ignores_mode() {
        let request = CaptureRequest::builder(CaptureMode::Graphical)
            .whole_desktop()
            .build();
        assert_eq!(
            CaptureTarget::for_request(&request),
            CaptureTarget::Desktop { selection: None }
        );
    }

    #[test]
    fn portal_only_replaces_uncropped_or_interactive_targets() {
        let rect = Rect::new(5, 5, 100, 100).unwrap();
        assert_eq!(
            portal_fallback(CaptureTarget::Desktop { selection: None }),
            Some(PortalMode::Immediate)
        );
        assert_eq!(
            portal_fallback(CaptureTarget::Interactive { selection: Some(rect) }),
            Some(PortalMode::Interactive)
        );
        assert_eq!(portal_fallback(CaptureTarget::Chooser), Some(PortalMode::Interactive));
        assert_eq!(
            portal_fallback(CaptureTarget::Desktop { selection: Some(rect) }),
            None
        );
        assert_eq!(
            portal_fallback(CaptureTarget::Screen {
                target: ScreenTarget::Index(1),
                selection: None
            }),
            None
        );
    }

    struct NoCompositor;

    impl ScreenLayout for NoCompositor {
        fn screens(&self) -> Result<Vec<crate::capture::screens::Screen>, CaptureError> {
            Err(CaptureError::ImageError("Failed to run swaymsg -t get_outputs -r".into()))
        }
    }

    #[tokio::test]
    async fn screen_capture_without_layout_fails_instead_of_grabbing_everything() {
        let target = CaptureTarget::Screen {
            target: ScreenTarget::Index(1),
            selection: None,
        };
        match capture_image(target, &NoCompositor).await {
            Err(CaptureError::ImageError(message)) => {
                assert!(message.contains("swaymsg"), "{message}");
                assert!(message.contains("cannot capture a single screen"), "{message}");
            }
            other => panic!("unexpected result: {:?}", other.map(|image| image.selection)),
        }
    }
}
