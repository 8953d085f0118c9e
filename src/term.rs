//! Terminal capability and geometry probes.

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::IsTerminal;

/// What the output stream supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub interactive: bool,
    /// Colors and markdown rendering
    pub color: bool,
}

impl Capabilities {
    /// `NO_COLOR` set to anything non-empty disables color, as does a non-terminal stream.
    pub fn from_parts(is_terminal: bool, no_color: Option<OsString>) -> Self {
        let no_color = no_color.is_some_and(|v| !v.is_empty());
        Self {
            interactive: is_terminal,
            color: is_terminal && !no_color,
        }
    }
}

/// Probe stdout.
pub fn probe() -> Capabilities {
    Capabilities::from_parts(
        std::io::stdout().is_terminal(),
        std::env::var_os("NO_COLOR"),
    )
}

/// Current (columns, rows)
pub fn terminal_size() -> Result<(u16, u16)> {
    crossterm::terminal::size().context("failed to read terminal size")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_capabilities() {
        assert_eq!(
            Capabilities::from_parts(true, None),
            Capabilities {
                interactive: true,
                color: true
            }
        );
        assert!(!Capabilities::from_parts(true, Some("1".into())).color);
        assert!(Capabilities::from_parts(true, Some("".into())).color);
        assert_eq!(
            Capabilities::from_parts(false, None),
            Capabilities {
                interactive: false,
                color: false
            }
        );
    }

    #[test]
    #[serial]
    fn test_probe_honours_no_color() {
        let orig = std::env::var_os("NO_COLOR");
        std::env::set_var("NO_COLOR", "1");
        assert!(!probe().color);
        match orig {
            Some(v) => std::env::set_var("NO_COLOR", v),
            None => std::env::remove_var("NO_COLOR"),
        }
    }
}
