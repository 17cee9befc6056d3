//! Tool descriptors and the registry the dispatcher resolves calls against.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use rmcp::{
    handler::server::common::schema_for_type,
    model::{JsonObject, Tool, ToolAnnotations},
};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::{dispatcher::ToolContext, types::ToolError};

/// Typed arguments of one tool; the JSON schema is derived from the type.
pub trait ToolArguments: DeserializeOwned + JsonSchema + Send + 'static {
    /// Range and content checks that the schema cannot express.
    fn validate(&self) -> Result<(), ToolError> {
        Ok(())
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync + 'static {
    type Arguments: ToolArguments;

    async fn call(&self, context: &ToolContext, arguments: Self::Arguments) -> Result<Value, ToolError>;
}

/// Parses raw call arguments into `A`.
///
/// Required fields come from the derived schema; an absent or `null` value is
/// a missing parameter. Type mismatches and failed [`ToolArguments::validate`]
/// checks are invalid parameters.
pub fn parse_arguments<A: ToolArguments>(arguments: JsonObject) -> Result<A, ToolError> {
    let schema = schema_for_type::<A>();
    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for parameter in required.iter().filter_map(Value::as_str) {
            if arguments.get(parameter).is_none_or(Value::is_null) {
                return Err(ToolError::missing_parameter(parameter));
            }
        }
    }
    let parsed: A = serde_json::from_value(Value::Object(arguments))
        .map_err(|error| ToolError::invalid_parameter("arguments", error.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

trait ErasedHandler: Send + Sync {
    fn prepare<'a>(&'a self, context: &'a ToolContext, arguments: JsonObject) -> Result<BoxFuture<'a, Result<Value, ToolError>>, ToolError>;
}

struct TypedHandler<H>(H);

impl<H: ToolHandler> ErasedHandler for TypedHandler<H> {
    fn prepare<'a>(&'a self, context: &'a ToolContext, arguments: JsonObject) -> Result<BoxFuture<'a, Result<Value, ToolError>>, ToolError> {
        let arguments = parse_arguments::<H::Arguments>(arguments)?;
        Ok(self.0.call(context, arguments))
    }
}

/// A tool as advertised to clients, bound to its handler.
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    input_schema: Arc<JsonObject>,
    annotations: ToolAnnotations,
    handler: Arc<dyn ErasedHandler>,
}

impl ToolDescriptor {
    pub fn new<H: ToolHandler>(name: impl Into<String>, description: impl Into<String>, handler: H) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: schema_for_type::<H::Arguments>(),
            annotations: ToolAnnotations::default(),
            handler: Arc::new(TypedHandler(handler)),
        }
    }

    pub fn annotate(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &JsonObject {
        &self.input_schema
    }

    pub fn annotations(&self) -> &ToolAnnotations {
        &self.annotations
    }

    pub fn to_tool(&self) -> Tool {
        Tool::new(self.name.clone(), self.description.clone(), Arc::clone(&self.input_schema)).annotate(self.annotations.clone())
    }

    /// Validates `arguments` and returns the handler future without polling it.
    pub(crate) fn prepare<'a>(
        &'a self,
        context: &'a ToolContext,
        arguments: JsonObject,
    ) -> Result<BoxFuture<'a, Result<Value, ToolError>>, ToolError> {
        self.handler.prepare(context, arguments)
    }
}

impl PartialEq for ToolDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.input_schema == other.input_schema
            && self.annotations == other.annotations
            && Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("annotations", &self.annotations)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("tool '{name}' is already registered")]
    Duplicate { name: String },

    #[error("tool '{name}' is not registered")]
    NotFound { name: String },
}

/// Tools in registration order, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: IndexMap<String, ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), RegistryError> {
        if self.tools.contains_key(descriptor.name()) {
            return Err(RegistryError::Duplicate {
                name: descriptor.name().to_string(),
            });
        }
        self.tools.insert(descriptor.name().to_string(), descriptor);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&ToolDescriptor, RegistryError> {
        self.tools.get(name).ok_or_else(|| RegistryError::NotFound { name: name.to_string() })
    }

    pub fn list(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    /// Descriptors in the shape `tools/list` returns.
    pub fn tools(&self) -> Vec<Tool> {
        self.list().map(ToolDescriptor::to_tool).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
