//! Weakly typed configuration materialization.
//!
//! Configuration sources feeding the registry are often loosely typed (labels,
//! environment variables, flat key/value stores produce strings for
//! everything), so bags are decoded with permissive rules rather than exact
//! serde matching. This module is the single place those rules live.
//!
//! # Materialization
//!
//! [`materialize`] never edits a configuration in place:
//!
//! 1. the defaults are serialized to a JSON map;
//! 2. the bag is overlaid onto that map. Keys are matched exactly, then ASCII
//!    case-insensitively, then ignoring `_` and `-` too (`trusted_ips` finds
//!    `trustedIPs`); nested maps overlay recursively so unspecified nested
//!    fields keep their defaults; `null` values are skipped;
//! 3. the merged map is deserialized into a new value with the weak rules
//!    below. On error nothing is returned.
//!
//! # Weak rules
//!
//! | Target | Accepted input |
//! |--------|----------------|
//! | struct field | exact key, else case-insensitive key, else the same ignoring `_`/`-`; unknown keys ignored |
//! | enum variant | exact name, else case-insensitive name |
//! | `bool` | bool; number (non-zero is `true`); `1 t T TRUE true True`, `0 f F FALSE false False`, `""` |
//! | integers | number (floats truncate); bool as 1/0; string literal with optional sign and `0x`/`0o`/`0b`/leading-`0` radix; `""` is 0 |
//! | unsigned | as integers, negative values rejected |
//! | floats | number; bool as 1/0; string; `""` is 0 |
//! | string | string; bool as `"1"`/`"0"`; number in decimal |
//! | sequence | sequence; string split on `,` (no trimming, `""` is empty); `{}` is empty; any other value becomes one element |
//! | map | map; `[]` is empty; a sequence of maps is merged |
//!
//! A map or sequence where a scalar is required is an error. Errors carry the
//! path of the offending field, e.g. `'limits.burst': invalid value: ...`.

mod coerce;
mod de;
mod error;

pub use coerce::SEQUENCE_DELIMITER;
pub use error::DecodeError;

use serde::Serialize;
use serde::de::{Deserialize, DeserializeOwned};
use serde_json::{Map, Value};

use crate::plugin::ConfigBag;
use de::WeakDeserializer;

/// Overlays `bag` onto a snapshot of `defaults` and decodes a fresh value.
pub fn materialize<T>(defaults: &T, bag: &ConfigBag) -> Result<T, DecodeError>
where
    T: Serialize + DeserializeOwned,
{
    let mut base = match serde_json::to_value(defaults) {
        Ok(Value::Object(map)) => map,
        Ok(Value::Null) => Map::new(),
        Ok(other) => {
            return Err(DecodeError::Defaults(format!(
                "expected a map, found {}",
                coerce::unexpected(&other)
            )));
        }
        Err(e) => return Err(DecodeError::Defaults(e.to_string())),
    };

    overlay(&mut base, bag.clone());
    from_value(Value::Object(base))
}

/// Decodes `value` into `T` using the weak rules alone, without defaults.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, DecodeError> {
    T::deserialize(WeakDeserializer::new(value))
}

fn overlay(base: &mut Map<String, Value>, bag: Map<String, Value>) {
    for (key, value) in bag {
        if value.is_null() {
            continue;
        }

        let slot = base
            .keys()
            .find(|existing| **existing == key)
            .or_else(|| base.keys().find(|existing| existing.eq_ignore_ascii_case(&key)))
            .or_else(|| base.keys().find(|existing| coerce::loose_key_eq(existing, &key)))
            .cloned()
            .unwrap_or(key);

        let value = match (base.get_mut(&slot), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => {
                overlay(existing, nested);
                continue;
            }
            (_, value) => value,
        };
        base.insert(slot, value);
    }
}
