//! Process-wide application context.
//!
//! Built once at startup and passed by reference to whatever needs the
//! configuration, the async runtime, or the desktop collaborators.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::capture::screens::{FallbackLayout, ScreenLayout};
use crate::capture::state::LastRegionStore;
use crate::capture::{CaptureDependencies, CaptureEngine, PortalEngine};
use crate::config::Config;
use crate::instance::InstanceGuard;
use crate::notification::{DesktopNotifier, Notifier};
use crate::orchestrator::{CaptureOrchestrator, ExitPolicy};

pub const APP_NAME: &str = "shotwire";
pub const APP_ID: &str = "org.shotwire.Shotwire";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_HASH: &str = env!("SHOTWIRE_GIT_HASH");

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// `0.3.0 (abc1234)`.
pub fn long_version() -> &'static str {
    static LONG: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    LONG.get_or_init(|| format!("{VERSION} ({GIT_HASH})"))
}

pub struct AppContext {
    pub config: Config,
    pub notifier: Arc<dyn Notifier>,
    pub screens: Arc<dyn ScreenLayout>,
    pub last_region: LastRegionStore,
    runtime: tokio::runtime::Runtime,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("shotwire-rt")
            .enable_all()
            .build()
            .context("Failed to create Tokio runtime")?;
        let notifier = Arc::new(DesktopNotifier::new(runtime.handle().clone()));
        Ok(Self {
            config,
            notifier,
            screens: Arc::new(FallbackLayout::compositor()),
            last_region: LastRegionStore::user_default(),
            runtime,
        })
    }

    pub fn runtime(&self) -> &tokio::runtime::Handle {
        self.runtime.handle()
    }

    pub fn engine(&self) -> Arc<dyn CaptureEngine> {
        let engine = PortalEngine::new(
            self.runtime().clone(),
            CaptureDependencies::with_layout(Arc::clone(&self.screens)),
            self.config.file_save_config(),
            self.last_region.clone(),
            Arc::clone(&self.notifier),
        )
        .notify_saves(self.config.general.show_desktop_notification);
        Arc::new(engine)
    }

    pub fn orchestrator(&self, policy: ExitPolicy) -> CaptureOrchestrator {
        CaptureOrchestrator::new(self.engine(), Arc::clone(&self.notifier), policy)
            .show_abort_notification(self.config.general.show_abort_notification)
    }

    /// Guard for GUI captures, keyed `<app-id>-<version>`.
    pub fn gui_instance_guard(&self) -> InstanceGuard {
        InstanceGuard::for_app(APP_ID, VERSION)
    }

    /// Guard that keeps a single background instance per session.
    pub fn daemon_instance_guard(&self) -> InstanceGuard {
        InstanceGuard::for_app(APP_ID, "daemon")
    }

    /// Deliver pending notifications and stop background tasks.
    pub fn shutdown(self) {
        self.notifier.flush();
        self.runtime.shutdown_timeout(SHUTDOWN_TIMEOUT);
    }
}
