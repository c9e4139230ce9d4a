// crates/dcp-core/src/ids.rs
//
// Deterministic identifiers: UUID v5 over a fixed namespace, canonical JSON,
// and SHA-256 content hashes. Every document id the builder emits is derived
// through these helpers, so repeated runs collapse to the same documents.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::DcpError;

/// Namespace for every UUID v5 minted by the tools.
pub const DCP_NAMESPACE: Uuid = Uuid::from_u128(0xc6591d1d_27bc_4c94_bd54_1b51f8a2456c);

/// UUID v5 of the UTF-8 bytes of `name` under [`DCP_NAMESPACE`].
pub fn uuid5(name: &str) -> String {
    Uuid::new_v5(&DCP_NAMESPACE, name.as_bytes()).to_string()
}

/// Serialize `value` with lexicographically sorted keys and no insignificant
/// whitespace.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Scalars already serialize compactly and stably.
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Lowercase hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Convert a base64 digest (as cloud stores report md5/crc32c) to lowercase hex.
pub fn base64_to_hex(encoded: &str) -> Result<String, DcpError> {
    STANDARD
        .decode(encoded.trim())
        .map(hex::encode)
        .map_err(|e| DcpError::Validation(format!("Invalid base64 digest {:?}: {}", encoded, e)))
}
