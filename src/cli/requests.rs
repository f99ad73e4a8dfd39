//! Turn validated subcommand arguments into capture requests.
//!
//! A default save is added when no other output was asked for, so a capture
//! never finishes without producing something. `gui` only does this with
//! `--accept-on-select`.

use std::path::{Path, PathBuf};

use crate::capture::screens::ScreenLayout;
use crate::capture::state::LastRegionStore;
use crate::capture::{
    CaptureMode, CaptureRequest, CaptureRequestBuilder, CaptureTask, Region, ScreenTarget,
};

use super::{CliError, FullArgs, GuiArgs, ScreenArgs};

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Seeds the request with `region`. `all` still works when the monitor layout
/// cannot be queried: the whole desktop is captured without a crop.
fn with_region(
    builder: CaptureRequestBuilder,
    region: &Region,
    screens: &dyn ScreenLayout,
) -> Result<CaptureRequestBuilder, CliError> {
    match region.resolve(screens) {
        Ok(rect) => Ok(builder.initial_selection(rect)),
        Err(source) if *region == Region::All => {
            log::debug!("Monitor layout unavailable ({}); capturing every monitor", source);
            Ok(builder.whole_desktop())
        }
        Err(source) => Err(CliError::RegionUnresolved {
            region: *region,
            source,
        }),
    }
}

fn base(mode: CaptureMode, delay: Option<u64>) -> CaptureRequestBuilder {
    CaptureRequest::builder(mode).delay_ms(delay.unwrap_or(0))
}

pub fn gui_request(
    args: &GuiArgs,
    screens: &dyn ScreenLayout,
    last_region: &LastRegionStore,
) -> Result<CaptureRequest, CliError> {
    let path = args.output.path.as_deref().map(absolute);
    let mut builder = base(CaptureMode::Graphical, args.output.delay);

    if let Some(region) = &args.output.region {
        builder = with_region(builder, region, screens)?;
    } else if args.last_region == Some(true) {
        match last_region.load() {
            Some(rect) => builder = builder.initial_selection(rect),
            None => log::warn!("No previous region recorded; starting a fresh selection"),
        }
    }

    if args.output.clipboard {
        builder = builder.task(CaptureTask::Copy);
    }
    if args.output.raw {
        builder = builder.task(CaptureTask::PrintRaw);
    }
    if path.is_some() {
        builder = builder.save_to(path);
    }
    if args.print_geometry {
        builder = builder.task(CaptureTask::PrintGeometry);
    }
    if args.pin {
        builder = builder.task(CaptureTask::Pin);
    }
    if args.output.upload {
        builder = builder.task(CaptureTask::Upload);
    }
    if args.accept_on_select {
        builder = builder.task(CaptureTask::AcceptOnSelect);
        if !builder.has_output_task() {
            builder = builder.save_to(None);
        }
    }
    Ok(builder.build())
}

pub fn full_request(args: &FullArgs, screens: &dyn ScreenLayout) -> Result<CaptureRequest, CliError> {
    let path = args.output.path.as_deref().map(absolute);
    let mut builder = base(CaptureMode::FullScreen, args.output.delay);

    if let Some(region) = &args.output.region {
        builder = with_region(builder, region, screens)?;
    }
    if args.output.clipboard {
        builder = builder.task(CaptureTask::Copy);
    }
    if path.is_some() {
        builder = builder.save_to(path);
    }
    if args.output.raw {
        builder = builder.task(CaptureTask::PrintRaw);
    }
    if args.output.upload {
        builder = builder.task(CaptureTask::Upload);
    }
    if !builder.has_output_task() {
        builder = builder.save_to(None);
    }
    Ok(builder.build())
}

pub fn screen_request(
    args: &ScreenArgs,
    screens: &dyn ScreenLayout,
) -> Result<CaptureRequest, CliError> {
    let target = args
        .number
        .map_or(ScreenTarget::UnderCursor, ScreenTarget::Index);
    let path = args.output.path.as_deref().map(absolute);
    let mut builder = base(CaptureMode::Screen(target), args.output.delay);

    if let Some(region) = &args.output.region {
        if region.is_screen() {
            return Err(CliError::UnsupportedRegion);
        }
        builder = with_region(builder, region, screens)?;
    }
    if args.output.clipboard {
        builder = builder.task(CaptureTask::Copy);
    }
    if args.output.raw {
        builder = builder.task(CaptureTask::PrintRaw);
    }
    if path.is_some() {
        builder = builder.save_to(path);
    }
    if args.pin {
        builder = builder.task(CaptureTask::Pin);
    }
    if args.output.upload {
        builder = builder.task(CaptureTask::Upload);
    }
    if !builder.has_output_task() {
        builder = builder.save_to(None);
    }
    Ok(builder.build())
}
