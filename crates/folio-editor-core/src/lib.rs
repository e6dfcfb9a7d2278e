//! folio-editor-core: a schema-driven rich-document model.
//!
//! This crate provides:
//! - `Schema` - the node type registry, built from `NodeKind` descriptors
//! - `Node` - immutable, structurally shared document trees
//! - markdown and element-tree import/export, driven by per-type rules
//! - `Transaction`/`EditorState` - versioned edits under a selection
//! - media commands, input rules and undo history, wrapped up in `Editor`

pub mod actions;
pub mod dom;
pub mod editor;
pub mod error;
pub mod execute;
pub mod input_rules;
pub mod markdown;
pub mod node;
pub mod nodes;
pub mod presence;
pub mod resource;
pub mod schema;
pub mod state;
pub mod title_attrs;
pub mod transform;
pub mod types;
pub mod undo;
pub mod value;

pub use actions::{EditorCommand, UnknownCommand};
pub use dom::{DomNode, DomParser, Element};
pub use editor::Editor;
pub use error::{ResourceError, SchemaError, StepError};
pub use execute::execute_command;
pub use input_rules::{InputMatch, InputRule, handle_text_input};
pub use markdown::{MarkdownParser, MarkdownSerializer};
pub use node::{Node, ResolvedPos};
pub use nodes::{NodeKind, default_schema, simple_schema};
pub use presence::{TypingSignal, TypingThrottle};
#[cfg(feature = "http")]
pub use resource::HttpExporter;
pub use resource::{FetchedResource, ResourceExporter, SavedResource, export_resource};
pub use schema::{NodeTypeSpec, Schema};
pub use smol_str::SmolStr;
pub use state::EditorState;
pub use title_attrs::{TitleAttributes, parse_title_attribute};
pub use transform::{Step, Transaction};
pub use types::{Affinity, NodeSelection, Selection, StepMap, TextSelection};
pub use undo::{UndoManager, UndoableState};
pub use value::{AttrMap, Value};
