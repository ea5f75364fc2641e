//! Tool abstractions for the unified LLM interface.
//!
//! Tools are declared to providers as [`ToolDefinition`]s (name, description,
//! JSON schema) and come back from the model as [`ToolCall`]s. Executable
//! tools implement the [`Tool`] trait and live in a [`ToolRegistry`]; an
//! opt-in process-wide registry is available behind [`init_global`] /
//! [`global`] for applications that want one.

use crate::{Error, Result};
use async_trait::async_trait;
use compact_str::CompactString;
use schemars::Schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// A tool declared to the model.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolDefinition {
    /// The tool type (currently always "function")
    #[serde(rename = "type")]
    pub kind: CompactString,

    /// The function declaration
    pub function: ToolFunctionDef,
}

impl ToolDefinition {
    /// Create a function tool definition.
    pub fn function(
        name: impl Into<CompactString>,
        description: impl Into<String>,
        parameters: Schema,
    ) -> Self {
        Self {
            kind: "function".into(),
            function: ToolFunctionDef {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

/// A function declaration within a tool definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolFunctionDef {
    /// The name the model uses to call the function
    pub name: CompactString,

    /// What the function does, for model selection
    pub description: String,

    /// JSON schema of the function arguments
    pub parameters: Schema,
}

/// A tool call made by the model
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolCall {
    /// The ID of the tool call
    #[serde(default, skip_serializing_if = "CompactString::is_empty")]
    pub id: CompactString,

    /// The index of the tool call (used in streaming)
    #[serde(default, skip_serializing)]
    pub index: u32,

    /// The type of tool (currently only "function")
    #[serde(default, rename = "type")]
    pub call_type: CompactString,

    /// The function to call
    pub function: FunctionCall,
}

impl ToolCall {
    /// Merge a streaming delta into this tool call.
    pub fn merge(&mut self, call: &Self) {
        if !call.id.is_empty() {
            self.id = call.id.clone();
        }
        if !call.call_type.is_empty() {
            self.call_type = call.call_type.clone();
        }
        if !call.function.name.is_empty() {
            self.function.name = call.function.name.clone();
        }
        self.function.arguments.push_str(&call.function.arguments);
    }
}

/// A function call within a tool call
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FunctionCall {
    /// The name of the function to call
    #[serde(default, skip_serializing_if = "CompactString::is_empty")]
    pub name: CompactString,

    /// The arguments to pass to the function (JSON string)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub arguments: String,
}

/// Controls which tool is called by the model
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub enum ToolChoice {
    /// Model will not call any tool
    #[serde(rename = "none")]
    None,

    /// Model can pick between generating a message or calling tools
    #[serde(rename = "auto")]
    #[default]
    Auto,

    /// Model must call one or more tools
    #[serde(rename = "required")]
    Required,

    /// Model must call the specified function
    Function(CompactString),
}

impl From<&str> for ToolChoice {
    fn from(value: &str) -> Self {
        ToolChoice::Function(value.into())
    }
}

/// An executable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name the model calls the tool by.
    fn name(&self) -> &str;

    /// What the tool does, shown to the model.
    fn description(&self) -> &str;

    /// JSON schema of the tool arguments.
    fn parameters(&self) -> Schema;

    /// Execute the tool with the given JSON arguments.
    async fn execute(&self, args: Value) -> Result<Value>;
}

/// A registry of executable tools keyed by name.
///
/// Prefer threading a registry value through callers; [`global`] exists for
/// applications that want a single process-wide registry.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<RwLock<BTreeMap<CompactString, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.tools.write().expect("tool registry lock poisoned");
        tools.insert(tool.name().into(), tool);
    }

    /// Remove a tool by name. Returns true if it existed.
    pub fn unregister(&self, name: &str) -> bool {
        let mut tools = self.tools.write().expect("tool registry lock poisoned");
        tools.remove(name).is_some()
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().expect("tool registry lock poisoned");
        tools.get(name).cloned()
    }

    /// Names of all registered tools.
    pub fn names(&self) -> Vec<CompactString> {
        let tools = self.tools.read().expect("tool registry lock poisoned");
        tools.keys().cloned().collect()
    }

    /// Declarations for all registered tools, for a completion request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let tools = self.tools.read().expect("tool registry lock poisoned");
        tools
            .values()
            .map(|t| ToolDefinition::function(t.name(), t.description(), t.parameters()))
            .collect()
    }

    /// Execute a registered tool by name.
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::BadRequest(format!("unknown tool '{name}'")))?;
        tool.execute(args).await
    }

    /// Remove all tools.
    pub fn clear(&self) {
        let mut tools = self.tools.write().expect("tool registry lock poisoned");
        tools.clear();
    }
}

static GLOBAL: RwLock<Option<ToolRegistry>> = RwLock::new(None);

/// Install a process-wide tool registry. Replaces any previous one.
pub fn init_global(registry: ToolRegistry) {
    let mut global = GLOBAL.write().expect("global tool registry lock poisoned");
    *global = Some(registry);
}

/// Get the process-wide tool registry, if one was installed.
pub fn global() -> Option<ToolRegistry> {
    let global = GLOBAL.read().expect("global tool registry lock poisoned");
    global.clone()
}

/// Tear down the process-wide tool registry.
pub fn teardown_global() {
    let mut global = GLOBAL.write().expect("global tool registry lock poisoned");
    *global = None;
}
