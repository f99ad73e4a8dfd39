//! Command-line surface and dispatch.
//!
//! Every exit code the binary returns is decided here.

mod config_cmd;
pub mod requests;
pub mod validators;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand};
use log::{debug, warn};
use thiserror::Error;

use crate::app::{APP_NAME, AppContext, long_version};
use crate::capture::{CaptureError, CaptureRequest, Region, next_request_id};
use crate::color::Color;
use crate::config::Config;
use crate::daemon;
use crate::event_loop::EventLoop;
use crate::orchestrator::{ExitPolicy, request_capture_and_wait, run_until_outcome};

pub use requests::{full_request, gui_request, screen_request};

const HELP_HINT: &str = "See shotwire --help.";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    Validation(String),

    #[error("The 'screen' command does not support '--region screen<N>'.")]
    UnsupportedRegion,

    #[error("Could not resolve region '{region}': {source}")]
    RegionUnresolved {
        region: Region,
        #[source]
        source: CaptureError,
    },
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> Self {
        let message = err.render().to_string().trim_end().to_string();
        match err.kind() {
            ErrorKind::ValueValidation | ErrorKind::InvalidValue => CliError::Validation(message),
            _ => CliError::Parse(message),
        }
    }
}

/// Powerful yet simple to use screenshot software.
///
/// Without a subcommand, starts the background instance with its tray icon
/// and D-Bus interface.
#[derive(Parser, Debug)]
#[command(
    name = "shotwire",
    version = long_version(),
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a manual capture in GUI mode
    Gui(GuiArgs),
    /// Capture screenshot of all monitors at the same time
    Full(FullArgs),
    /// Capture a screenshot of the specified monitor
    Screen(ScreenArgs),
    /// Open the capture launcher
    Launcher,
    /// Configure shotwire
    Config(ConfigArgs),
}

/// Options shared by every capture subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Existing directory or new file to save to
    #[arg(short, long, value_name = "path", value_parser = validators::path)]
    pub path: Option<PathBuf>,

    /// Save the capture to the clipboard
    #[arg(short, long)]
    pub clipboard: bool,

    /// Delay time in milliseconds
    #[arg(
        short,
        long,
        value_name = "milliseconds",
        allow_negative_numbers = true,
        value_parser = validators::delay
    )]
    pub delay: Option<u64>,

    /// Screenshot region to select
    #[arg(long, value_name = "WxH+X+Y or string", value_parser = validators::region)]
    pub region: Option<Region>,

    /// Print raw PNG capture
    #[arg(short, long)]
    pub raw: bool,

    /// Upload screenshot
    #[arg(short, long)]
    pub upload: bool,
}

#[derive(Args, Debug, Clone)]
pub struct GuiArgs {
    #[command(flatten)]
    pub output: OutputArgs,

    /// Repeat screenshot with previously selected region
    #[arg(long, value_name = "bool", value_parser = validators::boolean)]
    pub last_region: Option<bool>,

    /// Print geometry of the selection in the format WxH+X+Y. Does nothing if raw is specified
    #[arg(short = 'g', long)]
    pub print_geometry: bool,

    /// Pin the capture to the screen
    #[arg(long)]
    pub pin: bool,

    /// Accept capture as soon as a selection is made
    #[arg(short = 's', long)]
    pub accept_on_select: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FullArgs {
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ScreenArgs {
    /// Define the screen to capture (starting from 0), default: screen containing the cursor
    #[arg(
        short,
        long,
        value_name = "Screen number",
        allow_negative_numbers = true,
        value_parser = validators::screen_number
    )]
    pub number: Option<u32>,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Pin the capture to the screen
    #[arg(long)]
    pub pin: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Enable or disable run at startup
    #[arg(short, long, value_name = "bool", value_parser = validators::boolean)]
    pub autostart: Option<bool>,

    /// Enable or disable the notifications
    #[arg(short, long, value_name = "bool", value_parser = validators::boolean)]
    pub notifications: Option<bool>,

    /// Set the filename pattern
    #[arg(short, long, value_name = "pattern")]
    pub filename: Option<String>,

    /// Enable or disable the trayicon
    #[arg(short, long, value_name = "bool", value_parser = validators::boolean)]
    pub trayicon: Option<bool>,

    /// Show the help message in the capture mode
    #[arg(short, long, value_name = "bool", value_parser = validators::boolean)]
    pub showhelp: Option<bool>,

    /// Define the main UI color
    #[arg(short, long, value_name = "color-code", value_parser = validators::color)]
    pub maincolor: Option<Color>,

    /// Define the contrast UI color
    #[arg(short = 'k', long, value_name = "color-code", value_parser = validators::color)]
    pub contrastcolor: Option<Color>,

    /// Check the configuration for errors
    #[arg(long)]
    pub check: bool,
}

/// Parse the process arguments and run the selected mode.
pub fn run() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return ExitCode::from(report_parse_error(err)),
    };
    debug!("{:?}", cli);

    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{APP_NAME}: {err:#}");
            1
        }
    };
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn report_parse_error(err: clap::Error) -> u8 {
    if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        if let Err(e) = err.print() {
            warn!("Failed to print help: {}", e);
        }
        return 0;
    }
    report_cli_error(&CliError::from(err));
    1
}

fn report_cli_error(err: &CliError) {
    eprintln!("{err}");
    eprintln!("{HELP_HINT}");
}

fn dispatch(cli: Cli) -> Result<i32> {
    match cli.command {
        None => with_context(daemon::run),
        Some(Command::Config(args)) => config_cmd::run(&args),
        Some(Command::Launcher) => with_context(launcher),
        Some(Command::Gui(args)) => with_context(|ctx| gui(ctx, &args)),
        Some(Command::Full(args)) => with_context(|ctx| {
            match full_request(&args, ctx.screens.as_ref()) {
                Ok(request) => capture(ctx, request, EventLoop::new()),
                Err(err) => report_request_error(&err),
            }
        }),
        Some(Command::Screen(args)) => with_context(|ctx| {
            match screen_request(&args, ctx.screens.as_ref()) {
                Ok(request) => capture(ctx, request, EventLoop::new()),
                Err(err) => report_request_error(&err),
            }
        }),
    }
}

/// Build the application context, run `mode`, then shut the context down.
fn with_context(mode: impl FnOnce(&AppContext) -> i32) -> Result<i32> {
    let ctx = AppContext::new(Config::load_or_default())?;
    let code = mode(&ctx);
    ctx.shutdown();
    Ok(code)
}

fn gui(ctx: &AppContext, args: &GuiArgs) -> i32 {
    let allow_multiple = ctx.config.general.allow_multiple_gui_instances;
    let token = match ctx.gui_instance_guard().acquire(allow_multiple) {
        Ok(token) => token,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let request = match gui_request(args, ctx.screens.as_ref(), &ctx.last_region) {
        Ok(request) => request,
        Err(err) => {
            token.release();
            return report_request_error(&err);
        }
    };

    let mut event_loop = EventLoop::new();
    event_loop.on_about_to_quit(move || token.release());
    capture(ctx, request, event_loop)
}

/// Reports a request that could not be built.
fn report_request_error(err: &CliError) -> i32 {
    report_cli_error(err);
    1
}

/// Submit a one-shot capture and wait for its outcome.
fn capture(ctx: &AppContext, request: CaptureRequest, mut event_loop: EventLoop) -> i32 {
    if let Err(e) = event_loop.install_signal_handlers() {
        warn!("{:#}", e);
    }
    request_capture_and_wait(ctx.orchestrator(ExitPolicy::OneShot), event_loop, request)
}

fn launcher(ctx: &AppContext) -> i32 {
    let mut event_loop = EventLoop::new();
    if let Err(e) = event_loop.install_signal_handlers() {
        warn!("{:#}", e);
    }
    run_until_outcome(
        ctx.orchestrator(ExitPolicy::OneShot),
        event_loop,
        |orchestrator, sender| orchestrator.open_launcher(next_request_id(), sender),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("shotwire").chain(args.iter().copied()))
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_selects_background_instance() {
        assert!(parse(&[]).unwrap().command.is_none());
    }

    #[test]
    fn help_and_version_short_circuit() {
        let err = parse(&["--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        let err = parse(&["gui", "--version"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn options_are_scoped_to_their_subcommand() {
        let err = parse(&["full", "--pin"]).unwrap_err();
        assert!(matches!(CliError::from(err), CliError::Parse(_)));
        assert!(parse(&["launcher", "-c"]).is_err());
        assert!(parse(&["config", "--clipboard"]).is_err());
    }

    #[test]
    fn subcommands_are_exclusive() {
        assert!(parse(&["gui", "full"]).is_err());
    }

    #[test]
    fn negative_delay_is_a_validation_error() {
        let err = CliError::from(parse(&["full", "--delay", "-5"]).unwrap_err());
        match err {
            CliError::Validation(message) => {
                assert!(message.contains(validators::DELAY_ERROR), "{message}")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn negative_screen_number_is_rejected() {
        let err = CliError::from(parse(&["screen", "-n", "-1"]).unwrap_err());
        assert!(matches!(err, CliError::Validation(m) if m.contains(validators::SCREEN_NUMBER_ERROR)));
    }

    #[test]
    fn translucent_main_color_is_rejected() {
        let err = CliError::from(parse(&["config", "--maincolor", "#80FF0000"]).unwrap_err());
        assert!(matches!(err, CliError::Validation(m) if m.contains("Invalid color")));
    }

    #[test]
    fn boolean_options_need_literal_values() {
        let err = CliError::from(parse(&["config", "--trayicon", "yes"]).unwrap_err());
        assert!(matches!(err, CliError::Validation(m) if m.contains(validators::BOOLEAN_ERROR)));
    }

    #[test]
    fn unsupported_region_message() {
        assert_eq!(
            CliError::UnsupportedRegion.to_string(),
            "The 'screen' command does not support '--region screen<N>'."
        );
    }
}
