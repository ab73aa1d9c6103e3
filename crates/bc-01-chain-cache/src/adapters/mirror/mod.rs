//! Mirror store adapters and the shared on-disk encoding.
//!
//! The mirror is pretty-printed JSON (2-space indent) mapping the decimal
//! height to the header object.

mod file;
mod memory;

pub use file::JsonFileMirror;
pub use memory::InMemoryMirror;

use crate::domain::errors::MirrorError;
use shared_types::ChainSnapshot;

pub(crate) fn encode(snapshot: &ChainSnapshot) -> Result<String, MirrorError> {
    serde_json::to_string_pretty(snapshot).map_err(|e| MirrorError::Serialization {
        message: e.to_string(),
    })
}

/// Parse mirror content, rejecting entries whose key disagrees with the
/// header's own height.
pub(crate) fn decode(text: &str, location: &str) -> Result<ChainSnapshot, MirrorError> {
    let snapshot: ChainSnapshot =
        serde_json::from_str(text).map_err(|e| MirrorError::Corrupt {
            location: location.to_string(),
            message: e.to_string(),
        })?;

    if let Some((key, header)) = snapshot
        .as_map()
        .iter()
        .find(|(key, header)| **key != header.height)
    {
        return Err(MirrorError::Corrupt {
            location: location.to_string(),
            message: format!("entry {key} holds header for height {}", header.height),
        });
    }

    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::fixtures::header;

    #[test]
    fn test_encode_uses_two_space_indent() {
        let snapshot: ChainSnapshot = [header(1)].into_iter().collect();
        let text = encode(&snapshot).unwrap();
        assert!(text.starts_with("{\n  \"1\": {\n    \""));
    }

    #[test]
    fn test_decode_rejects_mismatched_key() {
        let text = encode(&[header(5)].into_iter().collect()).unwrap();
        let tampered = text.replacen("\"5\":", "\"6\":", 1);
        assert!(matches!(
            decode(&tampered, "test"),
            Err(MirrorError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_file() {
        let text = encode(&(1..4).map(header).collect()).unwrap();
        let truncated = &text[..text.len() / 2];
        assert!(matches!(
            decode(truncated, "test"),
            Err(MirrorError::Corrupt { .. })
        ));
    }
}
