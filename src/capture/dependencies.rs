use std::io::{self, Write};
use std::{path::Path, path::PathBuf, sync::Arc};

use async_trait::async_trait;

use crate::capture::{
    clipboard,
    file::{self, FileSaveConfig},
    screens::{FallbackLayout, ScreenLayout},
    sources::{self, CaptureTarget, CapturedImage},
    types::CaptureError,
};
use crate::util::Rect;

/// Abstraction over how image data is acquired.
#[async_trait]
pub trait CaptureSource: Send + Sync {
    async fn capture(&self, target: CaptureTarget) -> Result<CapturedImage, CaptureError>;
}

/// Abstraction over file saving for captured screenshots.
pub trait CaptureFileSaver: Send + Sync {
    fn save(
        &self,
        image_data: &[u8],
        target: Option<&Path>,
        config: &FileSaveConfig,
    ) -> Result<PathBuf, CaptureError>;
}

/// Abstraction over copying screenshots to the clipboard.
pub trait CaptureClipboard: Send + Sync {
    fn copy(&self, image_data: &[u8]) -> Result<(), CaptureError>;
}

/// Where `--raw` image bytes and `--print-geometry` lines are written.
pub trait CaptureOutput: Send + Sync {
    fn write_raw(&self, image_data: &[u8]) -> io::Result<()>;
    fn write_geometry(&self, geometry: Rect) -> io::Result<()>;
}

/// Bundle of dependencies used by the capture pipeline. Each component can be mocked in tests.
#[derive(Clone)]
pub struct CaptureDependencies {
    pub source: Arc<dyn CaptureSource>,
    pub saver: Arc<dyn CaptureFileSaver>,
    pub clipboard: Arc<dyn CaptureClipboard>,
    pub output: Arc<dyn CaptureOutput>,
}

impl CaptureDependencies {
    pub fn with_layout(layout: Arc<dyn ScreenLayout>) -> Self {
        Self {
            source: Arc::new(DefaultCaptureSource { layout }),
            saver: Arc::new(DefaultFileSaver),
            clipboard: Arc::new(DefaultClipboard),
            output: Arc::new(StdoutOutput),
        }
    }
}

impl Default for CaptureDependencies {
    fn default() -> Self {
        Self::with_layout(Arc::new(FallbackLayout::compositor()))
    }
}

struct DefaultCaptureSource {
    layout: Arc<dyn ScreenLayout>,
}
struct DefaultFileSaver;
struct DefaultClipboard;
struct StdoutOutput;

#[async_trait]
impl CaptureSource for DefaultCaptureSource {
    async fn capture(&self, target: CaptureTarget) -> Result<CapturedImage, CaptureError> {
        sources::capture_image(target, self.layout.as_ref()).await
    }
}

impl CaptureFileSaver for DefaultFileSaver {
    fn save(
        &self,
        image_data: &[u8],
        target: Option<&Path>,
        config: &FileSaveConfig,
    ) -> Result<PathBuf, CaptureError> {
        file::save_screenshot(image_data, target, config)
    }
}

impl CaptureClipboard for DefaultClipboard {
    fn copy(&self, image_data: &[u8]) -> Result<(), CaptureError> {
        clipboard::copy_to_clipboard(image_data)
    }
}

impl CaptureOutput for StdoutOutput {
    fn write_raw(&self, image_data: &[u8]) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(image_data)?;
        stdout.flush()
    }

    fn write_geometry(&self, geometry: Rect) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{geometry}")?;
        stdout.flush()
    }
}
