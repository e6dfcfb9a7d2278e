//! Editor commands.
//!
//! `EditorCommand` names a semantic operation, decoupled from how it is
//! triggered (toolbar, keyboard shortcut, CLI). Node-level commands are routed
//! to the command handler of the selected node's type.

use std::fmt;
use std::str::FromStr;

/// All commands the editor understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    // === Media ===
    /// Set the selected media node's dimensions.
    Resize {
        width: Option<u32>,
        height: Option<u32>,
    },

    /// Float the selected media node right at half width.
    AlignRight,

    /// Float the selected media node left at half width.
    AlignLeft,

    /// Stretch the selected media node across the full width.
    AlignFullWidth,

    /// Clear any layout class.
    AlignCenter,

    /// Fetch the selected media node's resource and save it locally.
    DownloadResource,

    /// Remove the selected media node.
    DeleteMedia,

    /// Replace the selected media node's caption (its alt text).
    SetAlt(String),

    // === History ===
    /// Undo the last change.
    Undo,

    /// Redo the last undone change.
    Redo,
}

impl EditorCommand {
    /// Stable command name, as used by the CLI and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "resize",
            Self::AlignRight => "alignRight",
            Self::AlignLeft => "alignLeft",
            Self::AlignFullWidth => "alignFullWidth",
            Self::AlignCenter => "alignCenter",
            Self::DownloadResource => "downloadImage",
            Self::DeleteMedia => "deleteImage",
            Self::SetAlt(_) => "setAlt",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }

    /// Whether this command edits the document through a transaction.
    pub fn is_transactional(&self) -> bool {
        !matches!(self, Self::DownloadResource | Self::Undo | Self::Redo)
    }
}

impl fmt::Display for EditorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command `{0}`")]
pub struct UnknownCommand(pub String);

/// Parses argument-free commands by name.
impl FromStr for EditorCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "alignRight" | "right" => Self::AlignRight,
            "alignLeft" | "left" => Self::AlignLeft,
            "alignFullWidth" | "full-width" => Self::AlignFullWidth,
            "alignCenter" | "center" => Self::AlignCenter,
            "downloadImage" => Self::DownloadResource,
            "deleteImage" => Self::DeleteMedia,
            "undo" => Self::Undo,
            "redo" => Self::Redo,
            other => return Err(UnknownCommand(other.to_owned())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_by_name() {
        assert_eq!("alignRight".parse(), Ok(EditorCommand::AlignRight));
        assert_eq!("full-width".parse(), Ok(EditorCommand::AlignFullWidth));
        assert_eq!(
            "explode".parse::<EditorCommand>(),
            Err(UnknownCommand("explode".into()))
        );
    }

    #[test]
    fn test_transactional() {
        assert!(EditorCommand::AlignCenter.is_transactional());
        assert!(EditorCommand::SetAlt("x".into()).is_transactional());
        assert!(!EditorCommand::DownloadResource.is_transactional());
        assert!(!EditorCommand::Undo.is_transactional());
    }
}
