use miette::Diagnostic;
use smol_str::SmolStr;
use thiserror::Error;

use crate::value::Value;

/// Errors raised while defining a schema or constructing nodes against it.
///
/// These are programmer / schema-definition errors. Importers never surface
/// them; they fall back to attribute defaults instead.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum SchemaError {
    #[error("node type `{0}` is already registered")]
    #[diagnostic(code(folio::schema::duplicate_type))]
    DuplicateType(SmolStr),

    #[error("unknown node type `{0}`")]
    #[diagnostic(code(folio::schema::unknown_type))]
    UnknownType(SmolStr),

    #[error("mark type `{0}` is already registered")]
    #[diagnostic(code(folio::schema::duplicate_mark))]
    DuplicateMark(SmolStr),

    #[error("unknown mark type `{0}`")]
    #[diagnostic(code(folio::schema::unknown_mark))]
    UnknownMark(SmolStr),

    #[error("invalid value {value} for attribute `{attr}` of `{node_type}`")]
    #[diagnostic(code(folio::schema::invalid_attribute))]
    InvalidAttribute {
        node_type: SmolStr,
        attr: SmolStr,
        value: Value,
    },

    #[error("attribute `{attr}` of `{node_type}` has no default and was not supplied")]
    #[diagnostic(code(folio::schema::missing_attribute))]
    MissingAttribute { node_type: SmolStr, attr: SmolStr },

    #[error("invalid content for `{node_type}`: {reason}")]
    #[diagnostic(code(folio::schema::invalid_content))]
    InvalidContent { node_type: SmolStr, reason: String },

    #[error("mark `{mark}` is not allowed inside `{node_type}`")]
    #[diagnostic(code(folio::schema::mark_not_allowed))]
    MarkNotAllowed { node_type: SmolStr, mark: SmolStr },

    #[error("invalid content expression {expr:?}: {reason}")]
    #[diagnostic(
        code(folio::schema::content_expression),
        help("expressions are sequences of names or (a | b) groups, optionally followed by *, + or ?")
    )]
    InvalidContentExpression { expr: String, reason: String },

    #[error("text nodes must not be empty")]
    #[diagnostic(code(folio::schema::empty_text))]
    EmptyText,
}

/// Errors raised when a step cannot be applied to a document.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum StepError {
    #[error("position {pos} is outside the document (content size {size})")]
    #[diagnostic(code(folio::step::out_of_range))]
    PositionOutOfRange { pos: usize, size: usize },

    #[error("no node starts at position {0}")]
    #[diagnostic(code(folio::step::no_node))]
    NoNodeAt(usize),

    #[error("range {from}..{to} does not lie within a single parent node")]
    #[diagnostic(code(folio::step::crosses_boundary))]
    CrossesBoundary { from: usize, to: usize },

    #[error("transaction was built against a different document version")]
    #[diagnostic(code(folio::step::stale_transaction))]
    StaleTransaction,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),
}

/// Errors raised by the asynchronous resource download.
#[derive(Debug, Error, Diagnostic)]
pub enum ResourceError {
    #[error("media node has no source to download")]
    #[diagnostic(code(folio::resource::empty_source))]
    EmptySource,

    #[error("failed to fetch {src}")]
    #[diagnostic(code(folio::resource::fetch))]
    Fetch {
        src: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to set up the HTTP client")]
    #[diagnostic(code(folio::resource::client))]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("fetching {src} returned HTTP {status}")]
    #[diagnostic(code(folio::resource::status))]
    Status { src: String, status: u16 },

    #[error("failed to save {filename}")]
    #[diagnostic(code(folio::resource::save))]
    Save {
        filename: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
