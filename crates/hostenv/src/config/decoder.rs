//! Hook-aware deserializer over a parsed configuration tree.
//!
//! Every typed request the destination makes is first passed through the
//! [`DecodeHooks`], then served from the rewritten value.

use serde::de::value::StringDeserializer;
use serde::de::{
    self, DeserializeOwned, DeserializeSeed, Deserializer, IntoDeserializer, MapAccess, SeqAccess,
    Visitor,
};
use serde_json::Value;

use super::hooks::{DecodeHooks, Target};
use crate::error::DecodeError;

const DURATION_NAME: &str = "Duration";
const DURATION_FIELDS: [&str; 2] = ["secs", "nanos"];

/// Decodes `value` into `T`, applying `hooks` to every typed request.
///
/// # Errors
///
/// Returns [`DecodeError`] when a hook fails or the value does not fit `T`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use hostenv::config::{DecodeHooks, decode};
///
/// #[derive(serde::Deserialize)]
/// struct Settings {
///     timeout: Duration,
///     tags: Vec<String>,
/// }
///
/// let value = serde_json::json!({ "timeout": "90s", "tags": "a,b" });
/// let settings: Settings = decode(value, &DecodeHooks::defaults()).expect("decodes");
/// assert_eq!(settings.timeout, Duration::from_secs(90));
/// assert_eq!(settings.tags, ["a", "b"]);
/// ```
pub fn decode<T: DeserializeOwned>(value: Value, hooks: &DecodeHooks) -> Result<T, DecodeError> {
    T::deserialize(HookedDeserializer { value, hooks })
}

struct HookedDeserializer<'h> {
    value: Value,
    hooks: &'h DecodeHooks,
}

impl<'h> HookedDeserializer<'h> {
    fn hooked<'de, V: Visitor<'de>>(
        self,
        target: Target,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        let value = self.hooks.apply(target, self.value)?;
        visit_value(value, self.hooks, visitor)
    }

    fn plain<'de, V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visit_value(self.value, self.hooks, visitor)
    }

    const fn child(hooks: &'h DecodeHooks, value: Value) -> Self {
        Self { value, hooks }
    }
}

fn visit_value<'de, V: Visitor<'de>>(
    value: Value,
    hooks: &DecodeHooks,
    visitor: V,
) -> Result<V::Value, DecodeError> {
    match value {
        Value::Array(items) => {
            let len = items.len();
            let mut access = HookedSeq {
                iter: items.into_iter(),
                hooks,
            };
            let out = visitor.visit_seq(&mut access)?;
            if access.iter.len() == 0 {
                Ok(out)
            } else {
                Err(de::Error::invalid_length(len, &"fewer elements in array"))
            }
        }
        Value::Object(entries) => {
            let len = entries.len();
            let mut access = HookedMap {
                iter: entries.into_iter(),
                pending: None,
                hooks,
            };
            let out = visitor.visit_map(&mut access)?;
            if access.iter.len() == 0 {
                Ok(out)
            } else {
                Err(de::Error::invalid_length(len, &"fewer elements in map"))
            }
        }
        scalar => scalar.deserialize_any(visitor).map_err(de::Error::custom),
    }
}

macro_rules! hooked_requests {
    ($($method:ident => $target:expr),* $(,)?) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
                self.hooked($target, visitor)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for HookedDeserializer<'_> {
    type Error = DecodeError;

    hooked_requests! {
        deserialize_bool => Target::Bool,
        deserialize_i8 => Target::Integer,
        deserialize_i16 => Target::Integer,
        deserialize_i32 => Target::Integer,
        deserialize_i64 => Target::Integer,
        deserialize_i128 => Target::Integer,
        deserialize_u8 => Target::Integer,
        deserialize_u16 => Target::Integer,
        deserialize_u32 => Target::Integer,
        deserialize_u64 => Target::Integer,
        deserialize_u128 => Target::Integer,
        deserialize_f32 => Target::Float,
        deserialize_f64 => Target::Float,
        deserialize_char => Target::Str,
        deserialize_str => Target::Str,
        deserialize_string => Target::Str,
        deserialize_bytes => Target::Bytes,
        deserialize_byte_buf => Target::Bytes,
        deserialize_seq => Target::Sequence,
    }

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.plain(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(Self::child(self.hooks, value)),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.value.deserialize_unit(visitor).map_err(de::Error::custom)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.plain(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.plain(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.plain(visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        if name == DURATION_NAME && fields == DURATION_FIELDS {
            return self.hooked(Target::Duration, visitor);
        }
        self.plain(visitor)
    }

    // Hooks are not applied inside enum payloads.
    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.value
            .deserialize_enum(name, variants, visitor)
            .map_err(de::Error::custom)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.plain(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        drop(self.value);
        visitor.visit_unit()
    }
}

struct HookedSeq<'h> {
    iter: std::vec::IntoIter<Value>,
    hooks: &'h DecodeHooks,
}

impl<'de> SeqAccess<'de> for HookedSeq<'_> {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, Self::Error> {
        self.iter
            .next()
            .map(|value| seed.deserialize(HookedDeserializer::child(self.hooks, value)))
            .transpose()
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct HookedMap<'h> {
    iter: serde_json::map::IntoIter,
    pending: Option<Value>,
    hooks: &'h DecodeHooks,
}

impl<'de> MapAccess<'de> for HookedMap<'_> {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, Self::Error> {
        let Some((key, value)) = self.iter.next() else {
            return Ok(None);
        };
        self.pending = Some(value);
        let key: StringDeserializer<DecodeError> = key.into_deserializer();
        seed.deserialize(key).map(Some)
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(
        &mut self,
        seed: V,
    ) -> Result<V::Value, Self::Error> {
        let value = self
            .pending
            .take()
            .ok_or_else(|| DecodeError::new("map value requested before its key"))?;
        seed.deserialize(HookedDeserializer::child(self.hooks, value))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}
