//! Colors of the console output.

use nu_ansi_term::Color;

/// Used for the message of a failed setup.
pub(crate) const FAILURE_COLOR: Color = Color::Red;

/// Used for the JDK version and architecture.
pub(crate) const JDK_COLOR: Color = Color::Cyan;

/// Used for the line announcing the installed JDK.
pub(crate) const READY_COLOR: Color = Color::Green;

/// Used for files and directories.
pub(crate) const PATH_COLOR: Color = Color::LightBlue;
