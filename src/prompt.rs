use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ConfigurationError, ConversionError, RenderError, RenderFailure};
use crate::function::{PromptFn, RawItem};
use crate::models::message::Message;
use crate::schema::{DeclaredSchemaDeriver, SchemaDeriver, ValidatedFn};

/// An argument a prompt template accepts, for listing and introspection.
/// Describes the argument; validation happens in the call wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptArgument {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
}

/// A prompt template: a named, schema-described callable whose result is
/// rendered into an ordered sequence of [`Message`]s.
///
/// Immutable after construction, so concurrent renders share no mutable
/// state. Serializes without its callable.
#[derive(Serialize)]
pub struct Prompt {
    pub name: String,
    pub description: String,
    pub arguments: Vec<PromptArgument>,
    #[serde(skip)]
    function: Arc<dyn PromptFn>,
}

impl Prompt {
    /// Create a prompt from a callable, deriving the argument schema from
    /// the typing the callable declares.
    pub fn from_function(
        function: Arc<dyn PromptFn>,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        Self::from_function_with(function, &DeclaredSchemaDeriver, name, description)
    }

    /// Create a prompt with an explicit schema deriver.
    ///
    /// The schema is derived exactly once, here; derivation failure is
    /// propagated and the prompt never exists. The callable is stored behind
    /// an argument-validating wrapper and is not invoked during construction.
    pub fn from_function_with(
        function: Arc<dyn PromptFn>,
        deriver: &dyn SchemaDeriver,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Self, ConfigurationError> {
        let name = name
            .map(str::to_string)
            .or_else(|| function.name().map(str::to_string))
            .ok_or(ConfigurationError::UnnamedFunction)?;

        let schema = deriver.derive_schema(function.as_ref())?;

        let arguments = schema
            .properties
            .iter()
            .map(|property| PromptArgument {
                name: property.name.clone(),
                description: property.description.clone(),
                required: schema.required.contains(&property.name),
            })
            .collect();

        let description = description
            .map(str::to_string)
            .or_else(|| function.doc().map(str::to_string))
            .unwrap_or_default();

        let function: Arc<dyn PromptFn> = Arc::new(ValidatedFn::new(function, schema));

        Ok(Prompt {
            name,
            description,
            arguments,
            function,
        })
    }

    /// Render the prompt with the supplied arguments.
    ///
    /// Checks required arguments, invokes the callable (the single await
    /// point), then coerces each returned element into a [`Message`]. Yields
    /// either the full message list or a [`RenderError`] tagged with this
    /// prompt's name; a partial list is never returned.
    pub async fn render(
        &self,
        arguments: Option<Map<String, Value>>,
    ) -> Result<Vec<Message>, RenderError> {
        let provided = arguments.unwrap_or_default();

        let mut missing: Vec<String> = self
            .arguments
            .iter()
            .filter(|arg| arg.required && !provided.contains_key(&arg.name))
            .map(|arg| arg.name.clone())
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(self.fail(RenderFailure::MissingArguments { missing }));
        }

        let raw = self
            .function
            .call(provided)
            .await
            .map_err(|e| self.fail(e.into()))?;

        let mut messages = Vec::new();
        for item in raw.into_items() {
            messages.push(coerce(item).map_err(|e| self.fail(e.into()))?);
        }
        Ok(messages)
    }

    fn fail(&self, source: RenderFailure) -> RenderError {
        RenderError {
            prompt: self.name.clone(),
            source,
        }
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prompt")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// Coerce one returned element into a message.
///
/// Rule order is fixed: messages pass through, records are validated as a
/// message shape, strings become user text, and anything else (including a
/// record that fails validation) falls back to its canonical JSON encoding
/// wrapped as user text. The permissive fallback for near-miss records
/// mirrors the original engine's behavior and is kept deliberately.
fn coerce(item: RawItem) -> Result<Message, ConversionError> {
    match item {
        RawItem::Message(message) => Ok(message),
        RawItem::Record(record) => match Message::from_record(&record) {
            Ok(message) => Ok(message),
            Err(_) => json_fallback(Value::Object(record)),
        },
        RawItem::Text(text) => Ok(Message::user(text)),
        RawItem::Other(value) => json_fallback(value),
    }
}

fn json_fallback(value: Value) -> Result<Message, ConversionError> {
    match serde_json::to_string(&value) {
        Ok(text) => Ok(Message::user(text)),
        Err(source) => Err(ConversionError {
            element: value,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::content::Content;
    use crate::models::role::Role;
    use serde_json::json;

    #[test]
    fn message_elements_pass_through_unchanged() {
        let message = Message::assistant("ok");
        assert_eq!(coerce(RawItem::Message(message.clone())).unwrap(), message);
    }

    #[test]
    fn valid_record_becomes_typed_message() {
        let record = json!({"role": "assistant", "content": "ok"})
            .as_object()
            .unwrap()
            .clone();
        let message = coerce(RawItem::Record(record)).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, Content::text("ok"));
    }

    #[test]
    fn near_miss_record_falls_back_to_json() {
        // A misspelled role is absorbed by the fallback, not rejected.
        let record = json!({"role": "asistant", "content": "ok"})
            .as_object()
            .unwrap()
            .clone();
        let message = coerce(RawItem::Record(record)).unwrap();
        assert_eq!(message.role, Role::User);
        assert_eq!(
            message.content.as_text(),
            Some(r#"{"content":"ok","role":"asistant"}"#)
        );
    }

    #[test]
    fn scalar_falls_back_to_json() {
        let message = coerce(RawItem::Other(json!(42))).unwrap();
        assert_eq!(message, Message::user("42"));
    }
}
