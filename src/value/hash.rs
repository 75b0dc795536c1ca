//! Stable content digest of a [`Value`].

use std::fmt;

use sha2::{Digest, Sha256};

use super::{canonical_number, Value};

/// SHA-256 digest of a value's canonical encoding.
///
/// Missing, null and every structural kind hash differently. Object keys are
/// hashed in sorted order, so the digest does not depend on insertion order,
/// and numbers are hashed in canonical form (`1.0` and `1` agree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

const TAG_MISSING: u8 = 0;
const TAG_NULL: u8 = 1;
const TAG_STRING: u8 = 2;
const TAG_NUMBER: u8 = 3;
const TAG_BOOLEAN: u8 = 4;
const TAG_ARRAY: u8 = 5;
const TAG_OBJECT: u8 = 6;

impl Value {
    /// Computes the content hash of this value.
    pub fn content_hash(&self) -> ContentHash {
        let mut hasher = Sha256::new();
        feed(&mut hasher, self);
        ContentHash(hasher.finalize().into())
    }
}

fn feed_bytes(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

fn feed(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Missing => hasher.update([TAG_MISSING]),
        Value::Null => hasher.update([TAG_NULL]),
        Value::String(s) => {
            hasher.update([TAG_STRING]);
            feed_bytes(hasher, s.as_bytes());
        }
        Value::Number(n) => {
            hasher.update([TAG_NUMBER]);
            feed_bytes(hasher, canonical_number(n).as_bytes());
        }
        Value::Boolean(b) => hasher.update([TAG_BOOLEAN, u8::from(*b)]),
        Value::Array(items) => {
            hasher.update([TAG_ARRAY]);
            hasher.update((items.len() as u64).to_be_bytes());
            for item in items.iter() {
                feed(hasher, item);
            }
        }
        Value::Object(entries) => {
            hasher.update([TAG_OBJECT]);
            hasher.update((entries.len() as u64).to_be_bytes());
            let mut keys: Vec<&String> = entries.keys().collect();
            keys.sort();
            for key in keys {
                feed_bytes(hasher, key.as_bytes());
                feed(hasher, &entries[key]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueMap;

    #[test]
    fn test_object_hash_ignores_key_order() {
        let mut a = ValueMap::new();
        a.insert("x".to_string(), Value::from(1));
        a.insert("y".to_string(), Value::from("two"));
        let mut b = ValueMap::new();
        b.insert("y".to_string(), Value::from("two"));
        b.insert("x".to_string(), Value::from(1));

        assert_eq!(
            Value::object(a).content_hash(),
            Value::object(b).content_hash()
        );
    }

    #[test]
    fn test_missing_null_and_kinds_differ() {
        let hashes = [
            Value::missing().content_hash(),
            Value::null().content_hash(),
            Value::from("1").content_hash(),
            Value::from(1).content_hash(),
            Value::from(true).content_hash(),
            Value::array(vec![]).content_hash(),
            Value::object(ValueMap::new()).content_hash(),
        ];
        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_numbers_hash_canonically() {
        assert_eq!(
            Value::number("1.0").content_hash(),
            Value::number("1").content_hash()
        );
    }

    #[test]
    fn test_large_integers_hash_distinctly() {
        assert_ne!(
            Value::number("9007199254740992").content_hash(),
            Value::number("9007199254740993").content_hash()
        );
        assert_eq!(
            Value::number("9007199254740993").content_hash(),
            Value::number("9007199254740993.00").content_hash()
        );
    }

    #[test]
    fn test_array_order_matters() {
        let a = Value::array(vec![Value::from(1), Value::from(2)]);
        let b = Value::array(vec![Value::from(2), Value::from(1)]);
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(Value::null().content_hash().to_string().len(), 64);
    }
}
