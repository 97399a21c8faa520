use serde_json::Value;
use thiserror::Error;

/// Construction-time failures. A prompt that hits one of these never exists.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("a name must be provided for anonymous prompt functions")]
    UnnamedFunction,

    #[error("cannot derive a schema for `{0}`: parameters are not declared")]
    UndeclaredParameters(String),
}

/// Failures raised by a prompt function, or by the argument validator that
/// guards it, while handling a call.
#[derive(Error, Debug)]
pub enum FunctionError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}

/// A mapping that does not validate as either message shape.
#[derive(Error, Debug)]
pub enum ShapeError {
    #[error("role must be \"user\" or \"assistant\"")]
    InvalidRole,

    #[error("message has no content field")]
    MissingContent,

    #[error("content is not a string or a known content payload: {0}")]
    InvalidContent(String),
}

/// A returned element that no coercion rule could absorb.
#[derive(Error, Debug)]
#[error("could not convert prompt result to message: {element}")]
pub struct ConversionError {
    pub element: Value,
    #[source]
    pub source: serde_json::Error,
}

/// The specific cause nested inside a [`RenderError`].
#[derive(Error, Debug)]
pub enum RenderFailure {
    #[error("missing required arguments: {}", .missing.join(", "))]
    MissingArguments { missing: Vec<String> },

    #[error(transparent)]
    Function(#[from] FunctionError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Render-time failure, always tagged with the name of the prompt so
/// callers holding many templates can localize the fault.
#[derive(Error, Debug)]
#[error("error rendering prompt `{prompt}`: {source}")]
pub struct RenderError {
    pub prompt: String,
    #[source]
    pub source: RenderFailure,
}
