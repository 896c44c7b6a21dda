//! Type-conversion hooks applied while decoding configuration.
//!
//! Configuration files are loosely typed: a byte field is written as base64
//! text, a duration as `"1h30m"`, a list as `"a,b,c"`. Before a value is
//! handed to the destination type, every hook sees it together with the
//! [`Target`] the destination asked for and may rewrite it. Hooks run in
//! order, each receiving the previous hook's output.

use std::fmt;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;

use crate::error::DecodeError;

/// Kind of value the destination type requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// A boolean.
    Bool,
    /// A signed or unsigned integer of any width.
    Integer,
    /// A floating-point number.
    Float,
    /// A string or character.
    Str,
    /// A byte buffer (`serde_bytes::ByteBuf` or `#[serde(with = "serde_bytes")]`).
    Bytes,
    /// A `std::time::Duration`.
    Duration,
    /// A sequence such as `Vec<T>`.
    Sequence,
}

/// A single conversion step.
///
/// Implemented for closures of the shape
/// `Fn(Target, Value) -> Result<Value, DecodeError>`.
pub trait DecodeHook: Send + Sync {
    /// Rewrites `value` for `target`, or returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the value has the right shape for this
    /// hook but cannot be converted.
    fn apply(&self, target: Target, value: Value) -> Result<Value, DecodeError>;
}

impl<F> DecodeHook for F
where
    F: Fn(Target, Value) -> Result<Value, DecodeError> + Send + Sync,
{
    fn apply(&self, target: Target, value: Value) -> Result<Value, DecodeError> {
        self(target, value)
    }
}

/// Decodes base64 strings into byte buffers.
///
/// Strings that are not valid base64 pass through unchanged and are then
/// taken as their UTF-8 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64ToBytes;

impl DecodeHook for Base64ToBytes {
    fn apply(&self, target: Target, value: Value) -> Result<Value, DecodeError> {
        match (target, value) {
            (Target::Bytes, Value::String(text)) => match STANDARD.decode(&text) {
                Ok(bytes) => Ok(Value::Array(bytes.into_iter().map(Value::from).collect())),
                Err(_) => Ok(Value::String(text)),
            },
            (_, other) => Ok(other),
        }
    }
}

/// Parses duration strings such as `"30s"` or `"1h 30m"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToDuration;

impl DecodeHook for StringToDuration {
    fn apply(&self, target: Target, value: Value) -> Result<Value, DecodeError> {
        match (target, value) {
            (Target::Duration, Value::String(text)) => {
                let duration = humantime::parse_duration(&text)
                    .map_err(|e| DecodeError::new(format!("invalid duration '{text}': {e}")))?;
                Ok(duration_value(duration))
            }
            (_, other) => Ok(other),
        }
    }
}

/// Splits strings into sequences on a separator.
///
/// The empty string becomes the empty sequence.
#[derive(Debug, Clone)]
pub struct StringToSequence {
    separator: String,
}

impl StringToSequence {
    /// Creates a hook splitting on `separator`.
    #[must_use]
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl DecodeHook for StringToSequence {
    fn apply(&self, target: Target, value: Value) -> Result<Value, DecodeError> {
        match (target, value) {
            (Target::Sequence, Value::String(text)) => {
                if text.is_empty() {
                    return Ok(Value::Array(Vec::new()));
                }
                Ok(Value::Array(
                    text.split(self.separator.as_str())
                        .map(|item| Value::String(item.to_owned()))
                        .collect(),
                ))
            }
            (_, other) => Ok(other),
        }
    }
}

/// Ordered list of hooks applied as one.
///
/// # Examples
///
/// ```
/// use hostenv::config::{DecodeHooks, StringToSequence, Target};
/// use serde_json::Value;
///
/// let hooks = DecodeHooks::new().with(StringToSequence::new(";"));
/// let value = hooks
///     .apply(Target::Sequence, Value::from("a;b"))
///     .expect("hook should apply");
/// assert_eq!(value, serde_json::json!(["a", "b"]));
/// ```
#[derive(Default)]
pub struct DecodeHooks {
    hooks: Vec<Box<dyn DecodeHook>>,
}

impl DecodeHooks {
    /// An empty hook list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Base64 bytes, durations and comma-separated sequences.
    #[must_use]
    pub fn defaults() -> Self {
        Self::new()
            .with(Base64ToBytes)
            .with(StringToDuration)
            .with(StringToSequence::new(","))
    }

    /// Appends a hook.
    #[must_use]
    pub fn with(mut self, hook: impl DecodeHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Number of hooks in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` when the list holds no hooks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs every hook in order.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a hook.
    pub fn apply(&self, target: Target, value: Value) -> Result<Value, DecodeError> {
        self.hooks
            .iter()
            .try_fold(value, |current, hook| hook.apply(target, current))
    }
}

impl fmt::Debug for DecodeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeHooks")
            .field("len", &self.hooks.len())
            .finish()
    }
}

fn duration_value(duration: Duration) -> Value {
    serde_json::json!({
        "secs": duration.as_secs(),
        "nanos": duration.subsec_nanos(),
    })
}
