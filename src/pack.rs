//! Pack files.
//!
//! Older JDKs ship parts of their class libraries as `.pack` files that need to be expanded into jars
//! with the `unpack200` tool of the very same JDK.

use crate::error::InstallError;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, instrument, trace};
use walkdir::WalkDir;

// Name of the unpack tool.
#[cfg(windows)]
#[doc(hidden)]
const UNPACK200_EXE: &str = "unpack200.exe";

// Name of the unpack tool.
#[cfg(not(windows))]
#[doc(hidden)]
const UNPACK200_EXE: &str = "unpack200";

// Additional arguments for the unpack tool.
#[cfg(windows)]
#[doc(hidden)]
const UNPACK200_ARGS: &[&str] = &["-r", "-v", "-l", ""];

// Additional arguments for the unpack tool.
#[cfg(not(windows))]
#[doc(hidden)]
const UNPACK200_ARGS: &[&str] = &[];

/// Trait for tools that expand a single pack file into a jar.
pub(crate) trait PackTool {
    /// Expands `pack` into `jar` using the tools found in `bin`.
    fn unpack(&self, bin: &Path, pack: &Path, jar: &Path) -> Result<(), InstallError>;
}

/// [`PackTool`] implementation that runs the `unpack200` executable of the JDK.
#[derive(Debug)]
pub(crate) struct Unpack200;

impl PackTool for Unpack200 {
    #[instrument(level = "trace", skip(self))]
    fn unpack(&self, bin: &Path, pack: &Path, jar: &Path) -> Result<(), InstallError> {
        let status = Command::new(bin.join(UNPACK200_EXE))
            .args(UNPACK200_ARGS)
            .arg(pack)
            .arg(jar)
            .stdin(Stdio::null()) // disconnect from process
            .status()
            .map_err(|source| InstallError::Unpack {
                path: pack.to_path_buf(),
                source,
            })?;
        trace!(?status);

        if !status.success() {
            return Err(InstallError::Unpack {
                path: pack.to_path_buf(),
                source: io::Error::other(format!("{UNPACK200_EXE} exited with {status}")),
            });
        }

        Ok(())
    }
}

/// Expands every `.pack` file below `root` into a sibling `.jar` file.
///
/// The pack files are left in place. A missing `root` is not an error. Returns the number of expanded files.
#[instrument(level = "trace", skip(tool))]
pub(crate) fn unpack_all(root: &Path, bin: &Path, tool: &dyn PackTool) -> Result<usize, InstallError> {
    if root.symlink_metadata().is_err() {
        trace!(root = %root.display(), "nothing to unpack");
        return Ok(0);
    }

    let mut count = 0;
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() || !is_pack(entry.path()) {
            continue;
        }

        let pack = entry.path();
        let jar = pack.with_extension("jar");
        debug!(pack = %pack.display(), "unpacking");
        tool.unpack(bin, pack, &jar)?;
        count += 1;
    }

    Ok(count)
}

// Whether the given path names a pack file.
#[doc(hidden)]
fn is_pack(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pack"))
}
