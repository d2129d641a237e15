//! Debugger protocol wire types
//!
//! Only the subset of the Chrome DevTools Protocol needed for console capture:
//! the `Runtime.enable` request, the `Runtime.consoleAPICalled` notification and
//! the `RemoteObject` / `StackTrace` shapes it carries.
//!
//! Console payloads are read leniently: a null or ill-typed field degrades to
//! its default, and a bad argument or call frame degrades only itself.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// Method that subscribes the session to runtime notifications
pub const RUNTIME_ENABLE: &str = "Runtime.enable";

/// Notification fired each time the target calls a console function
pub const CONSOLE_API_CALLED: &str = "Runtime.consoleAPICalled";

/// Outbound command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Command {
    pub id: u64,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Command {
    pub fn new(id: u64, method: impl Into<String>) -> Self {
        Command {
            id,
            method: method.into(),
            params: None,
        }
    }

    /// `Runtime.enable` with no parameters
    pub fn runtime_enable(id: u64) -> Self {
        Command::new(id, RUNTIME_ENABLE)
    }
}

/// Any inbound frame: a command response (`id` set) or a notification (`method` set)
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

/// Payload of `Runtime.consoleAPICalled`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleApiCalled {
    /// Console function type (`log`, `warning`, `error`, ...)
    #[serde(
        default,
        rename = "type",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub args: Vec<RemoteValue>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub stack_trace: Option<StackTrace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_context_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

/// Primitive kind of a remote value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueKind {
    Undefined,
    String,
    Number,
    Boolean,
    Symbol,
    Bigint,
    Function,
    Object,
    /// A kind this client does not know about, kept verbatim
    Other(String),
}

impl ValueKind {
    pub fn as_str(&self) -> &str {
        match self {
            ValueKind::Undefined => "undefined",
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Symbol => "symbol",
            ValueKind::Bigint => "bigint",
            ValueKind::Function => "function",
            ValueKind::Object => "object",
            ValueKind::Other(name) => name,
        }
    }
}

impl From<String> for ValueKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "undefined" => ValueKind::Undefined,
            "string" => ValueKind::String,
            "number" => ValueKind::Number,
            "boolean" => ValueKind::Boolean,
            "symbol" => ValueKind::Symbol,
            "bigint" => ValueKind::Bigint,
            "function" => ValueKind::Function,
            "object" => ValueKind::Object,
            _ => ValueKind::Other(s),
        }
    }
}

impl From<ValueKind> for String {
    fn from(kind: ValueKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Refinement of `object` values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectSubtype {
    Null,
    Array,
    Node,
    Regexp,
    Date,
    Map,
    Set,
    Weakmap,
    Weakset,
    Iterator,
    Generator,
    Error,
    Proxy,
    Promise,
    Typedarray,
    Arraybuffer,
    Dataview,
    Other(String),
}

impl ObjectSubtype {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectSubtype::Null => "null",
            ObjectSubtype::Array => "array",
            ObjectSubtype::Node => "node",
            ObjectSubtype::Regexp => "regexp",
            ObjectSubtype::Date => "date",
            ObjectSubtype::Map => "map",
            ObjectSubtype::Set => "set",
            ObjectSubtype::Weakmap => "weakmap",
            ObjectSubtype::Weakset => "weakset",
            ObjectSubtype::Iterator => "iterator",
            ObjectSubtype::Generator => "generator",
            ObjectSubtype::Error => "error",
            ObjectSubtype::Proxy => "proxy",
            ObjectSubtype::Promise => "promise",
            ObjectSubtype::Typedarray => "typedarray",
            ObjectSubtype::Arraybuffer => "arraybuffer",
            ObjectSubtype::Dataview => "dataview",
            ObjectSubtype::Other(name) => name,
        }
    }
}

impl From<String> for ObjectSubtype {
    fn from(s: String) -> Self {
        match s.as_str() {
            "null" => ObjectSubtype::Null,
            "array" => ObjectSubtype::Array,
            "node" => ObjectSubtype::Node,
            "regexp" => ObjectSubtype::Regexp,
            "date" => ObjectSubtype::Date,
            "map" => ObjectSubtype::Map,
            "set" => ObjectSubtype::Set,
            "weakmap" => ObjectSubtype::Weakmap,
            "weakset" => ObjectSubtype::Weakset,
            "iterator" => ObjectSubtype::Iterator,
            "generator" => ObjectSubtype::Generator,
            "error" => ObjectSubtype::Error,
            "proxy" => ObjectSubtype::Proxy,
            "promise" => ObjectSubtype::Promise,
            "typedarray" => ObjectSubtype::Typedarray,
            "arraybuffer" => ObjectSubtype::Arraybuffer,
            "dataview" => ObjectSubtype::Dataview,
            _ => ObjectSubtype::Other(s),
        }
    }
}

impl From<ObjectSubtype> for String {
    fn from(subtype: ObjectSubtype) -> Self {
        subtype.as_str().to_string()
    }
}

impl std::fmt::Display for ObjectSubtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire representation of a JavaScript value passed to a console call
///
/// Remote handles (`objectId`) are carried but never dereferenced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteValue {
    /// Absent when the target omitted `type`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ValueKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<ObjectSubtype>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Literal value; an explicit JSON `null` is kept as `Some(Value::Null)`
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unserializable_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
}

fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// `None` for null or for a value of the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            debug!(error = %e, "Ignoring ill-typed field");
            Ok(None)
        }
    }
}

/// Anything but an array reads as empty; an element that fails to parse
/// becomes `T::default()`
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => {
            debug!(found = %other, "Expected an array");
            Vec::new()
        }
    };
    Ok(items
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).unwrap_or_else(|e| {
                debug!(error = %e, "Substituting default for unreadable element");
                T::default()
            })
        })
        .collect())
}

/// Null reads as `T::default()`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl RemoteValue {
    /// A value with only its kind populated
    pub fn of_kind(kind: ValueKind) -> Self {
        RemoteValue {
            kind: Some(kind),
            ..RemoteValue::default()
        }
    }

    /// Kind name for placeholders; a missing kind reads as `undefined`
    pub fn kind_name(&self) -> &str {
        self.kind.as_ref().map_or("undefined", ValueKind::as_str)
    }

    pub fn object(subtype: ObjectSubtype) -> Self {
        RemoteValue {
            subtype: Some(subtype),
            ..RemoteValue::of_kind(ValueKind::Object)
        }
    }

    pub fn string(text: impl Into<String>) -> Self {
        RemoteValue {
            value: Some(Value::String(text.into())),
            ..RemoteValue::of_kind(ValueKind::String)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_unserializable(mut self, repr: impl Into<String>) -> Self {
        self.unserializable_value = Some(repr.into());
        self
    }
}

/// One frame of a stack trace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    /// Empty (or null on the wire) for anonymous functions
    #[serde(default, deserialize_with = "null_as_default")]
    pub function_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub script_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub line_number: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub column_number: i64,
}

impl CallFrame {
    /// Function name, or `anonymous` when the target reported none
    pub fn display_name(&self) -> &str {
        if self.function_name.is_empty() {
            "anonymous"
        } else {
            &self.function_name
        }
    }
}

/// Call stack captured with a console call, innermost frame first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackTrace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub call_frames: Vec<CallFrame>,
    /// Async parent chain; carried as received, never walked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<StackTrace>>,
}

impl StackTrace {
    pub fn top_frame(&self) -> Option<&CallFrame> {
        self.call_frames.first()
    }
}
