mod archive;
mod args;
mod cache;
mod colors;
mod config;
mod error;
#[cfg(test)]
mod fixtures;
mod installer;
mod pack;
mod publish;
mod source;
mod vendor;
mod version;

use crate::args::Args;
use crate::colors::*;
use crate::config::Settings;
use crate::installer::Installer;
use crate::pack::Unpack200;
use crate::publish::ProcessPublisher;
use crate::source::HttpDownloader;
use crate::version::Version;
use clap::Parser;
use std::path::{self, PathBuf};
use std::time::{Duration, Instant};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::{level_filters::*, *};
use tracing_subscriber::EnvFilter;

// Exit code used in case there were no errors.
#[doc(hidden)]
const EXIT_OK: i32 = 0;

// Exit code used in case of errors.
#[doc(hidden)]
const EXIT_NOK: i32 = 1;

/// Main entry point for the application.
fn main() {
    // enable ansi support to use colorised/styled output
    #[cfg(windows)]
    let _ = nu_ansi_term::enable_ansi_support();

    // delegate
    if let Err(err) = internal_main() {
        let err_str = FAILURE_COLOR.paint(format!("{err:#}"));
        eprintln!("Failed to set up JDK!\r\n\t{err_str}");
        std::process::exit(EXIT_NOK);
    } else {
        std::process::exit(EXIT_OK);
    }
}

// Internal main entry point for the application.
#[doc(hidden)]
fn internal_main() -> anyhow::Result<()> {
    // remember start date/time
    let start = Instant::now();

    // parse arguments
    let args = Args::parse();

    // print some information
    if !args.quiet || args.version {
        print_info();
    }

    // stop here in case only the version was requested
    let Some(request) = args.request().filter(|_| !args.version) else {
        return Ok(());
    };

    // init tracing
    init_tracing(&args);

    // print parsed arguments
    trace!("arguments: {args:#?}");

    // load settings
    let config_path = args.config.as_ref().map(PathBuf::from);
    let config_path = config_path.map(|config_path| path::absolute(&config_path).unwrap_or(config_path));
    if let Some(config_path) = &config_path {
        println!("Using configuration from {}.", PATH_COLOR.paint(config_path.to_string_lossy()));
    }
    let settings = Settings::load(config_path.as_deref())?;
    debug!(?settings);

    // install
    let version = JDK_COLOR.paint(&request.version);
    let arch = JDK_COLOR.paint(&request.arch);
    if !args.quiet {
        println!("Setting up JDK {version} ({arch})");
    }
    let downloader = HttpDownloader;
    let publisher = ProcessPublisher::new(&settings);
    let installer = Installer::new(&settings, &downloader, &Unpack200, &publisher);
    let path = installer.install(&request)?;
    let path = PATH_COLOR.paint(path.to_string_lossy());
    let ready = READY_COLOR.paint("available");
    println!("JDK {version} ({arch}) {ready} at {path}");

    // print some statistics
    if !args.quiet {
        let elapsed = start.elapsed();
        println!("Total time: {}", format_elapsed(elapsed));
        let now = OffsetDateTime::now_local()?;
        println!("Finished at: {}", format_now(now));
    }

    Ok(())
}

// Formats the elapsed time with a resolution of seconds.
#[doc(hidden)]
fn format_elapsed(elapsed: Duration) -> String {
    // null out everything below seconds
    let elapsed = Duration::from_secs(elapsed.as_secs());

    // format the remaining duration
    humantime::format_duration(elapsed).to_string()
}

// Formats the given date/time in the local offset.
#[doc(hidden)]
fn format_now(now: OffsetDateTime) -> String {
    // define format
    const FORMAT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory][offset_minute]");

    // local offset or UTC
    let offset = UtcOffset::current_local_offset();
    let offset = offset.unwrap_or(UtcOffset::UTC);
    trace!(?offset);

    // format
    let now = now.to_offset(offset);
    now.format(&FORMAT).unwrap_or(now.to_string())
}

// Prints some information (version, path of executable, etc.).
#[doc(hidden)]
fn print_info() {
    let version = Version::default();
    if let Ok(exe) = std::env::current_exe() {
        let exe = PATH_COLOR.paint(exe.to_string_lossy());
        println!("{version} [{exe}]");
    } else {
        println!("{version}");
    }
}

// Initialises the tracing framework based on given command line arguments.
#[doc(hidden)]
fn init_tracing(args: &Args) {
    // We are falling back to printing all logs at error-level or above
    // if neither -v nor the RUST_LOG environment variable has been given.
    let level_filter = match args.verbose {
        0 => LevelFilter::ERROR.into(),
        1 => LevelFilter::WARN.into(),
        2 => LevelFilter::INFO.into(),
        3 => LevelFilter::DEBUG.into(),
        _ => LevelFilter::TRACE.into(),
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level_filter);
    tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(std::io::stderr).init();
}
