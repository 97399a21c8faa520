use std::fmt;
use std::future::Future;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{Map, Value};

use crate::errors::FunctionError;
use crate::models::message::Message;
use crate::schema::{FunctionSchema, Property};

/// A single value handed back by a prompt function, classified by shape.
///
/// The closed set of variants fixes the coercion order: messages pass
/// through, records are validated against the message shapes, strings become
/// user text, and everything else falls back to its JSON encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RawItem {
    Message(Message),
    Record(Map<String, Value>),
    Text(String),
    Other(Value),
}

/// The raw return of a prompt function: one item or an ordered sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Single(RawItem),
    Sequence(Vec<RawItem>),
}

impl RawValue {
    /// Normalize to an ordered sequence; a single value becomes one element.
    pub fn into_items(self) -> Vec<RawItem> {
        match self {
            RawValue::Single(item) => vec![item],
            RawValue::Sequence(items) => items,
        }
    }
}

impl From<Message> for RawItem {
    fn from(message: Message) -> Self {
        RawItem::Message(message)
    }
}

impl From<&str> for RawItem {
    fn from(text: &str) -> Self {
        RawItem::Text(text.to_string())
    }
}

impl From<String> for RawItem {
    fn from(text: String) -> Self {
        RawItem::Text(text)
    }
}

impl From<Value> for RawItem {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(record) => RawItem::Record(record),
            Value::String(text) => RawItem::Text(text),
            other => RawItem::Other(other),
        }
    }
}

impl From<RawItem> for RawValue {
    fn from(item: RawItem) -> Self {
        RawValue::Single(item)
    }
}

impl From<Message> for RawValue {
    fn from(message: Message) -> Self {
        RawValue::Single(RawItem::Message(message))
    }
}

impl From<&str> for RawValue {
    fn from(text: &str) -> Self {
        RawValue::Single(RawItem::Text(text.to_string()))
    }
}

impl From<String> for RawValue {
    fn from(text: String) -> Self {
        RawValue::Single(RawItem::Text(text))
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        RawValue::Single(value.into())
    }
}

impl From<Vec<Message>> for RawValue {
    fn from(messages: Vec<Message>) -> Self {
        RawValue::Sequence(messages.into_iter().map(RawItem::Message).collect())
    }
}

impl From<Vec<RawItem>> for RawValue {
    fn from(items: Vec<RawItem>) -> Self {
        RawValue::Sequence(items)
    }
}

/// A callable that a prompt template wraps.
///
/// Implementations may be synchronous or suspend internally; `call` is the
/// single await point of a render. An implementation that declares no
/// parameters counts as untyped and cannot have a schema derived for it.
#[async_trait]
pub trait PromptFn: Send + Sync {
    /// Intrinsic name of the callable; `None` for anonymous functions.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Documentation string attached to the callable.
    fn doc(&self) -> Option<&str> {
        None
    }

    /// Declared parameter typing, if the callable provides one.
    fn parameters(&self) -> Option<&FunctionSchema> {
        None
    }

    /// Invoke the callable with a JSON argument map.
    async fn call(&self, args: Map<String, Value>) -> Result<RawValue, FunctionError>;
}

type Handler =
    Box<dyn Fn(Map<String, Value>) -> BoxFuture<'static, Result<RawValue, FunctionError>> + Send + Sync>;

/// Closure-backed [`PromptFn`] for declaring prompt functions without a
/// hand-written trait impl.
///
/// ```ignore
/// let greet = FunctionDef::new(|_args| async { Ok::<_, FunctionError>("hello") })
///     .named("greet")
///     .documented("Greets the caller")
///     .no_parameters();
/// ```
pub struct FunctionDef {
    name: Option<String>,
    doc: Option<String>,
    schema: Option<FunctionSchema>,
    handler: Handler,
}

impl FunctionDef {
    pub fn new<F, Fut, T>(handler: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, FunctionError>> + Send + 'static,
        T: Into<RawValue>,
    {
        FunctionDef {
            name: None,
            doc: None,
            schema: None,
            handler: Box::new(move |args| {
                let fut = handler(args);
                Box::pin(async move { fut.await.map(Into::into) })
            }),
        }
    }

    pub fn named<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn documented<S: Into<String>>(mut self, doc: S) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Declare one parameter. Declaration order is the order arguments are
    /// listed in.
    pub fn parameter(mut self, name: &str, description: Option<&str>, required: bool) -> Self {
        let schema = self.schema.get_or_insert_with(FunctionSchema::default);
        schema.properties.push(Property {
            name: name.to_string(),
            description: description.map(str::to_string),
        });
        if required {
            schema.required.insert(name.to_string());
        }
        self
    }

    /// Declare that the function takes no parameters. An empty declaration
    /// still counts as typed; leaving parameters undeclared does not.
    pub fn no_parameters(mut self) -> Self {
        self.schema.get_or_insert_with(FunctionSchema::default);
        self
    }
}

impl fmt::Debug for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDef")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PromptFn for FunctionDef {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    fn parameters(&self) -> Option<&FunctionSchema> {
        self.schema.as_ref()
    }

    async fn call(&self, args: Map<String, Value>) -> Result<RawValue, FunctionError> {
        (self.handler)(args).await
    }
}
