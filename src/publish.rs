//! Publishing.
//!
//! This module contains the code that exposes the installed JDK to the invoking process and the later steps
//! of the build.

use crate::config::Settings;
use crate::error::InstallError;
use std::cell::RefCell;
use std::env;
use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace};

/// The target that additionally puts the `bin` directory of the JDK on the path.
pub(crate) const JAVA_HOME: &str = "JAVA_HOME";

/// Separator of the target names.
pub(crate) const TARGET_SEPARATOR: char = ';';

// Name of the executable search path variable.
#[doc(hidden)]
const PATH: &str = "PATH";

/// Trait for publishers of environment bindings.
pub(crate) trait Publisher {
    /// Exports the variable for the current process and everything that runs after it.
    fn export_variable(&self, name: &str, value: &str) -> io::Result<()>;

    /// Prepends the directory to the executable search path.
    fn add_path(&self, dir: &Path) -> io::Result<()>;
}

/// Binds every non-empty name of the `;`-separated targets to the installation path.
#[instrument(level = "trace", skip(publisher))]
pub(crate) fn bind_targets(targets: &str, path: &Path, publisher: &dyn Publisher) -> Result<(), InstallError> {
    for target in targets.split(TARGET_SEPARATOR).filter(|target| !target.is_empty()) {
        bind(target, path, publisher)?;
    }

    Ok(())
}

/// Binds the target to the installation path.
///
/// Only the literal name `JAVA_HOME` (case-sensitive) also puts `<path>/bin` on the search path.
pub(crate) fn bind(target: &str, path: &Path, publisher: &dyn Publisher) -> Result<(), InstallError> {
    if target == JAVA_HOME {
        publisher.add_path(&path.join("bin"))?;
    }

    debug!(target, path = %path.display(), "exporting");
    publisher.export_variable(target, &path.to_string_lossy())?;

    Ok(())
}

/// [`Publisher`] implementation for the current process and the build runner.
///
/// Variables and paths are applied to the process environment. If the runner provides files for them, they are
/// appended there, otherwise the corresponding workflow commands are written to `commands` (stdout by default).
#[derive(Debug)]
pub(crate) struct ProcessPublisher<W: Write = io::Stdout> {
    commands: RefCell<W>,
    env_file: Option<PathBuf>,
    path_file: Option<PathBuf>,
}

impl ProcessPublisher {
    /// Creates a new `ProcessPublisher` for the files named in the settings.
    pub(crate) fn new(settings: &Settings) -> Self {
        Self::with_commands(settings, io::stdout())
    }
}

impl<W: Write> ProcessPublisher<W> {
    /// Creates a new `ProcessPublisher` that writes workflow commands to the given writer.
    pub(crate) fn with_commands(settings: &Settings, commands: W) -> Self {
        Self {
            commands: RefCell::new(commands),
            env_file: settings.env_file.clone(),
            path_file: settings.path_file.clone(),
        }
    }

    // Appends the line to the file if there is one, otherwise emits the workflow command.
    fn emit(&self, file: Option<&Path>, line: &str, command: &str) -> io::Result<()> {
        match file {
            Some(file) => append_line(file, line),
            None => writeln!(self.commands.borrow_mut(), "{command}"),
        }
    }
}

impl<W: Write> Publisher for ProcessPublisher<W> {
    fn export_variable(&self, name: &str, value: &str) -> io::Result<()> {
        // SAFETY: publishing happens at the very end of the run, no other thread is alive at that point.
        unsafe { env::set_var(name, value) };

        let line = format!("{name}={value}");
        self.emit(self.env_file.as_deref(), &line, &format!("::set-env name={name}::{value}"))
    }

    fn add_path(&self, dir: &Path) -> io::Result<()> {
        if let Some(path) = prepend_path(env::var_os(PATH), dir)? {
            // SAFETY: see `export_variable`.
            unsafe { env::set_var(PATH, path) };
        }

        let line = dir.to_string_lossy();
        self.emit(self.path_file.as_deref(), &line, &format!("::add-path::{line}"))
    }
}

// Returns the search path with `dir` in front, or `None` if it already contains `dir`.
#[doc(hidden)]
fn prepend_path(current: Option<OsString>, dir: &Path) -> io::Result<Option<OsString>> {
    let entries: Vec<PathBuf> = current.as_deref().map(|path| env::split_paths(path).collect()).unwrap_or_default();
    if entries.iter().any(|entry| entry == dir) {
        trace!(dir = %dir.display(), "already on path");
        return Ok(None);
    }

    let path = env::join_paths(std::iter::once(dir.to_path_buf()).chain(entries)).map_err(io::Error::other)?;

    Ok(Some(path))
}

// Appends the line to the given file.
#[doc(hidden)]
fn append_line(file: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(file)?;
    writeln!(file, "{line}")
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::fixtures::{RecordingPublisher, settings};
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;
    use test_log::test;

    #[test]
    fn java_home_and_other_target() {
        let publisher = RecordingPublisher::default();
        let path = Path::new("/opt/jdk");
        bind_targets("JAVA_HOME;FOO", path, &publisher).unwrap();

        let variables = publisher.variables.borrow();
        assert_eq!(variables.len(), 2);
        assert!(variables.contains(&("JAVA_HOME".to_string(), "/opt/jdk".to_string())));
        assert!(variables.contains(&("FOO".to_string(), "/opt/jdk".to_string())));
        assert_eq!(publisher.paths.borrow().as_slice(), [path.join("bin")]);
    }

    #[test]
    fn empty_targets_are_skipped() {
        let publisher = RecordingPublisher::default();
        bind_targets(";JAVA_HOME_12_X64;;", Path::new("/opt/jdk"), &publisher).unwrap();

        let variables = publisher.variables.borrow();
        assert_eq!(variables.as_slice(), [("JAVA_HOME_12_X64".to_string(), "/opt/jdk".to_string())]);
        assert!(publisher.paths.borrow().is_empty());
    }

    #[test]
    fn java_home_match_is_exact() {
        let publisher = RecordingPublisher::default();
        bind_targets("java_home; JAVA_HOME;JAVA_HOME_8", Path::new("/opt/jdk"), &publisher).unwrap();

        assert_eq!(publisher.variables.borrow().len(), 3);
        assert!(publisher.paths.borrow().is_empty());
    }

    #[test]
    fn publisher_failure_propagates() {
        let publisher = RecordingPublisher::default();
        publisher.fail.set(true);
        let result = bind_targets("FOO", Path::new("/opt/jdk"), &publisher);

        assert!(matches!(result, Err(InstallError::Io(_))));
    }

    // Returns how often `dir` is on the search path of this process.
    fn path_count(dir: &Path) -> usize {
        let path = env::var_os(PATH).unwrap_or_default();
        env::split_paths(&path).filter(|entry| entry == dir).count()
    }

    #[test]
    #[serial]
    fn process_publisher_writes_runner_files() {
        let tempdir = tempdir().unwrap();
        let mut settings = settings(tempdir.path());
        settings.env_file = Some(tempdir.path().join("github_env"));
        settings.path_file = Some(tempdir.path().join("github_path"));
        let jdk = tempdir.path().join("jdk-12");
        let bin = jdk.join("bin");
        let jdk_str = jdk.to_string_lossy().to_string();

        let publisher = ProcessPublisher::with_commands(&settings, Vec::new());
        bind_targets("JAVA_HOME;FOO", &jdk, &publisher).unwrap();
        bind_targets("JAVA_HOME", &jdk, &publisher).unwrap();

        let env_file = fs::read_to_string(tempdir.path().join("github_env")).unwrap();
        assert_eq!(env_file, format!("JAVA_HOME={jdk_str}\nFOO={jdk_str}\nJAVA_HOME={jdk_str}\n"));
        let path_file = fs::read_to_string(tempdir.path().join("github_path")).unwrap();
        let bin_str = bin.to_string_lossy();
        assert_eq!(path_file, format!("{bin_str}\n{bin_str}\n"));
        assert!(publisher.commands.borrow().is_empty());

        assert_eq!(env::var("JAVA_HOME").unwrap(), jdk_str);
        assert_eq!(env::var("FOO").unwrap(), jdk_str);
        assert_eq!(path_count(&bin), 1);
    }

    #[test]
    #[serial]
    fn process_publisher_writes_workflow_commands() {
        let tempdir = tempdir().unwrap();
        let settings = settings(tempdir.path());
        let jdk = tempdir.path().join("jdk-8");
        let bin = jdk.join("bin");

        let publisher = ProcessPublisher::with_commands(&settings, Vec::new());
        bind_targets("JAVA_HOME;FOO", &jdk, &publisher).unwrap();

        let commands = String::from_utf8(publisher.commands.borrow().clone()).unwrap();
        let expected = format!(
            "::add-path::{bin}\n::set-env name=JAVA_HOME::{jdk}\n::set-env name=FOO::{jdk}\n",
            bin = bin.display(),
            jdk = jdk.display()
        );
        assert_eq!(commands, expected);
        assert_eq!(path_count(&bin), 1);
        assert!(!tempdir.path().join("github_env").exists());
    }

    #[test]
    fn prepend_to_path() {
        let dir = PathBuf::from("/opt/jdk/bin");
        let current = env::join_paths(["/usr/bin", "/bin"]).unwrap();
        let path = prepend_path(Some(current), &dir).unwrap().unwrap();

        let entries: Vec<PathBuf> = env::split_paths(&path).collect();
        assert_eq!(entries, [PathBuf::from("/opt/jdk/bin"), PathBuf::from("/usr/bin"), PathBuf::from("/bin")]);
    }

    #[test]
    fn prepend_to_empty_path() {
        let dir = PathBuf::from("/opt/jdk/bin");
        let path = prepend_path(None, &dir).unwrap().unwrap();
        assert_eq!(path, OsString::from("/opt/jdk/bin"));
    }

    #[test]
    fn prepend_only_once() {
        let dir = PathBuf::from("/opt/jdk/bin");
        let current = env::join_paths(["/usr/bin", "/opt/jdk/bin"]).unwrap();
        assert_eq!(prepend_path(Some(current), &dir).unwrap(), None);
    }

    #[test]
    fn append_lines() {
        let tempdir = tempdir().unwrap();
        let file = tempdir.path().join("env");
        append_line(&file, "JAVA_HOME=/opt/jdk").unwrap();
        append_line(&file, "FOO=/opt/jdk").unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "JAVA_HOME=/opt/jdk\nFOO=/opt/jdk\n");
    }
}
