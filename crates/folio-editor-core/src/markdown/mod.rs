//! Markdown import and export.
//!
//! Import runs pulldown-cmark and adapts its event stream into
//! [`MarkdownToken`]s that node types consume through their parse rules.
//! Export walks the tree and lets each node type write itself.

pub mod export;
pub mod import;
mod token;

pub use export::{MarkdownSerializer, esc};
pub use import::MarkdownParser;
pub use token::MarkdownToken;
