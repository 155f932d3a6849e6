//! The weakly typed [`Deserializer`] over `serde_json::Value`.

use serde::de::{
    DeserializeSeed, Deserializer, EnumAccess, Error as _, MapAccess, SeqAccess, Unexpected,
    VariantAccess, Visitor,
};
use serde_json::{Map, Value};

use super::DecodeError;
use super::coerce::{self, unexpected};

/// Deserializes one JSON value, coercing it toward whatever the target asks for.
pub(crate) struct WeakDeserializer {
    value: Value,
}

impl WeakDeserializer {
    pub(crate) fn new(value: Value) -> Self {
        Self { value }
    }
}

/// Picks the declared name matching `key`: exact first, then ASCII
/// case-insensitive, then ignoring `_` and `-` as well.
fn resolve_name(key: String, candidates: &'static [&'static str]) -> String {
    if candidates.contains(&key.as_str()) {
        return key;
    }
    candidates
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(&key))
        .or_else(|| {
            candidates
                .iter()
                .find(|candidate| coerce::loose_key_eq(candidate, &key))
        })
        .map(|candidate| (*candidate).to_string())
        .unwrap_or(key)
}

macro_rules! weak_signed {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
                visitor.visit_i64(coerce::to_i64(self.value)?)
            }
        )*
    };
}

macro_rules! weak_unsigned {
    ($($method:ident)*) => {
        $(
            fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
                visitor.visit_u64(coerce::to_u64(self.value)?)
            }
        )*
    };
}

impl<'de> Deserializer<'de> for WeakDeserializer {
    type Error = DecodeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    visitor.visit_u64(u)
                } else if let Some(i) = n.as_i64() {
                    visitor.visit_i64(i)
                } else {
                    visitor.visit_f64(coerce::to_f64(Value::Number(n))?)
                }
            }
            Value::String(s) => visitor.visit_string(s),
            Value::Array(items) => visitor.visit_seq(WeakSeq::new(items)),
            Value::Object(map) => visitor.visit_map(WeakMap::new(map, &[])),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_bool(coerce::to_bool(self.value)?)
    }

    weak_signed! { deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64 deserialize_i128 }
    weak_unsigned! { deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64 deserialize_u128 }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_f64(coerce::to_f64(self.value)?)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_f64(coerce::to_f64(self.value)?)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_string(coerce::to_string(self.value)?)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::String(s) => visitor.visit_byte_buf(s.into_bytes()),
            other => WeakDeserializer::new(other).deserialize_seq(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            other => Err(DecodeError::invalid_type(unexpected(&other), &"nothing")),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_seq(WeakSeq::new(coerce::to_seq(self.value)?))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_map(WeakMap::new(coerce::to_map(self.value)?, &[]))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        visitor.visit_map(WeakMap::new(coerce::to_map(self.value)?, fields))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        let (variant, payload) = match self.value {
            Value::String(s) => (s, None),
            Value::Object(map) => {
                let mut entries = map.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((key, value)), None) => (key, Some(value)),
                    _ => {
                        return Err(DecodeError::invalid_value(
                            Unexpected::Map,
                            &"a map with exactly one variant key",
                        ));
                    }
                }
            }
            other => return Err(DecodeError::invalid_type(unexpected(&other), &"an enum variant")),
        };

        visitor.visit_enum(WeakEnum {
            variant: resolve_name(variant, variants),
            payload,
        })
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DecodeError> {
        visitor.visit_unit()
    }
}

// ─── Sequences ────────────────────────────────────────────────────────────────

struct WeakSeq {
    items: std::vec::IntoIter<Value>,
    index: usize,
}

impl WeakSeq {
    fn new(items: Vec<Value>) -> Self {
        Self {
            items: items.into_iter(),
            index: 0,
        }
    }
}

impl<'de> SeqAccess<'de> for WeakSeq {
    type Error = DecodeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DecodeError> {
        let Some(item) = self.items.next() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        seed.deserialize(WeakDeserializer::new(item))
            .map(Some)
            .map_err(|e| e.within(&format!("[{index}]")))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

// ─── Maps and structs ─────────────────────────────────────────────────────────

struct WeakMap {
    entries: serde_json::map::IntoIter,
    fields: &'static [&'static str],
    pending: Option<(String, Value)>,
}

impl WeakMap {
    fn new(map: Map<String, Value>, fields: &'static [&'static str]) -> Self {
        Self {
            entries: map.into_iter(),
            fields,
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for WeakMap {
    type Error = DecodeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DecodeError> {
        let Some((key, value)) = self.entries.next() else {
            return Ok(None);
        };
        let key = resolve_name(key, self.fields);
        self.pending = Some((key.clone(), value));
        seed.deserialize(WeakDeserializer::new(Value::String(key.clone())))
            .map(Some)
            .map_err(|e| e.within(&key))
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, DecodeError> {
        let (key, value) = self
            .pending
            .take()
            .ok_or_else(|| DecodeError::custom("map value requested before its key"))?;
        seed.deserialize(WeakDeserializer::new(value))
            .map_err(|e| e.within(&key))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}

// ─── Enums ────────────────────────────────────────────────────────────────────

struct WeakEnum {
    variant: String,
    payload: Option<Value>,
}

impl<'de> EnumAccess<'de> for WeakEnum {
    type Error = DecodeError;
    type Variant = WeakVariant;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, WeakVariant), DecodeError> {
        let value = seed.deserialize(WeakDeserializer::new(Value::String(self.variant)))?;
        Ok((
            value,
            WeakVariant {
                payload: self.payload,
            },
        ))
    }
}

struct WeakVariant {
    payload: Option<Value>,
}

impl WeakVariant {
    fn into_payload(self, expected: &'static str) -> Result<Value, DecodeError> {
        self.payload
            .ok_or_else(|| DecodeError::invalid_type(Unexpected::UnitVariant, &expected))
    }
}

impl<'de> VariantAccess<'de> for WeakVariant {
    type Error = DecodeError;

    fn unit_variant(self) -> Result<(), DecodeError> {
        match self.payload {
            None | Some(Value::Null) => Ok(()),
            Some(other) => Err(DecodeError::invalid_type(unexpected(&other), &"a unit variant")),
        }
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, DecodeError> {
        seed.deserialize(WeakDeserializer::new(self.into_payload("a newtype variant")?))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, DecodeError> {
        WeakDeserializer::new(self.into_payload("a tuple variant")?).deserialize_seq(visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        WeakDeserializer::new(self.into_payload("a struct variant")?).deserialize_struct(
            "",
            fields,
            visitor,
        )
    }
}
