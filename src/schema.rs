use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ConfigurationError, FunctionError};
use crate::function::{PromptFn, RawValue};

/// One declared parameter of a prompt function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Parameter schema derived for a prompt function.
///
/// `properties` keeps declaration order; that order flows through to the
/// argument list a prompt exposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub properties: Vec<Property>,
    pub required: HashSet<String>,
}

impl FunctionSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: &str, description: Option<&str>, required: bool) -> Self {
        self.properties.push(Property {
            name: name.to_string(),
            description: description.map(str::to_string),
        });
        if required {
            self.required.insert(name.to_string());
        }
        self
    }
}

/// Capability that derives a parameter schema from a callable.
///
/// Kept as a trait so the engine itself stays reflection-free; tests inject
/// mock derivers that produce arbitrary schemas.
pub trait SchemaDeriver: Send + Sync {
    fn derive_schema(&self, function: &dyn PromptFn) -> Result<FunctionSchema, ConfigurationError>;
}

/// Default deriver: reads the typing the callable itself declares. A
/// callable that declares nothing fails derivation outright.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclaredSchemaDeriver;

impl SchemaDeriver for DeclaredSchemaDeriver {
    fn derive_schema(&self, function: &dyn PromptFn) -> Result<FunctionSchema, ConfigurationError> {
        function.parameters().cloned().ok_or_else(|| {
            ConfigurationError::UndeclaredParameters(
                function.name().unwrap_or("<anonymous>").to_string(),
            )
        })
    }
}

/// Wrapper that checks arguments against the derived schema on every call
/// before delegating to the inner callable. Prompts store only this wrapped
/// form, so the raw callable is never invoked directly.
pub(crate) struct ValidatedFn {
    inner: Arc<dyn PromptFn>,
    schema: FunctionSchema,
}

impl ValidatedFn {
    pub(crate) fn new(inner: Arc<dyn PromptFn>, schema: FunctionSchema) -> Self {
        ValidatedFn { inner, schema }
    }

    fn check(&self, args: &Map<String, Value>) -> Result<(), FunctionError> {
        let unknown: Vec<&str> = args
            .keys()
            .filter(|key| !self.schema.properties.iter().any(|p| &p.name == *key))
            .map(String::as_str)
            .collect();
        if !unknown.is_empty() {
            return Err(FunctionError::InvalidArguments(format!(
                "unexpected arguments: {}",
                unknown.join(", ")
            )));
        }

        let mut missing: Vec<&str> = self
            .schema
            .required
            .iter()
            .filter(|name| !args.contains_key(*name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(FunctionError::InvalidArguments(format!(
                "missing arguments: {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl PromptFn for ValidatedFn {
    fn name(&self) -> Option<&str> {
        self.inner.name()
    }

    fn doc(&self) -> Option<&str> {
        self.inner.doc()
    }

    fn parameters(&self) -> Option<&FunctionSchema> {
        Some(&self.schema)
    }

    async fn call(&self, args: Map<String, Value>) -> Result<RawValue, FunctionError> {
        self.check(&args)?;
        self.inner.call(args).await
    }
}
