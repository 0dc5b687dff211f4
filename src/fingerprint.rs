//! Derived-data cache keys of material translations.

use crate::foundation::error::{MaterialError, MaterialResult};
use crate::graph::model::MaterialDef;
use crate::options::TranslatorOptions;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

/// 128-bit key a translated material is cached under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    /// High 64 bits of the digest.
    pub hi: u64,
    /// Low 64 bits of the digest.
    pub lo: u64,
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

/// Key of translating `def` with `options`. Equal inputs give equal keys across runs; object
/// keys are hashed in sorted order so map iteration order never leaks in.
pub fn material_key(def: &MaterialDef, options: &TranslatorOptions) -> MaterialResult<CacheKey> {
    let mut hasher = Xxh3::new();
    for value in [to_value(def)?, to_value(options)?] {
        write_json_value(&mut hasher, &value);
    }
    let digest = hasher.digest128();
    Ok(CacheKey {
        hi: (digest >> 64) as u64,
        lo: digest as u64,
    })
}

fn to_value(value: &impl Serialize) -> MaterialResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| MaterialError::serde(e.to_string()))
}

fn write_json_value(h: &mut Xxh3, v: &serde_json::Value) {
    match v {
        serde_json::Value::Null => h.update(&[0]),
        serde_json::Value::Bool(x) => {
            h.update(&[1, u8::from(*x)]);
        }
        serde_json::Value::Number(n) => {
            h.update(&[2]);
            write_str(h, &n.to_string());
        }
        serde_json::Value::String(s) => {
            h.update(&[3]);
            write_str(h, s);
        }
        serde_json::Value::Array(items) => {
            h.update(&[4]);
            h.update(&(items.len() as u64).to_le_bytes());
            for item in items {
                write_json_value(h, item);
            }
        }
        serde_json::Value::Object(map) => {
            h.update(&[5]);
            let mut keys = map.keys().collect::<Vec<_>>();
            keys.sort();
            h.update(&(keys.len() as u64).to_le_bytes());
            for k in keys {
                write_str(h, k);
                write_json_value(h, &map[k]);
            }
        }
    }
}

fn write_str(h: &mut Xxh3, s: &str) {
    h.update(&(s.len() as u64).to_le_bytes());
    h.update(s.as_bytes());
}

#[cfg(test)]
#[path = "../tests/unit/fingerprint.rs"]
mod tests;
