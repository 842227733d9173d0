//! Credential record codec
//!
//! On-disk format: one JSON object per line. Binary fields are base64
//! (standard alphabet, no padding). JSON string escaping keeps any username
//! unambiguous, including ones containing `"` or `}`, so an encoded record
//! never spans more than one line. Usernames must already be in the form
//! enrollment stores: trimmed, without control characters.
//!
//! ```text
//! {"username":"alice","salt":"...","hash":"...","m":19456,"t":10,"p":1,"created_at":1700000000}
//! ```

use base64::{Engine, engine::general_purpose::STANDARD_NO_PAD};
use serde::{Deserialize, Serialize};

use crate::auth::HashParams;
use crate::error::CodecError;
use crate::storage::record::CredentialRecord;

/// Record terminator.
pub const RECORD_TERMINATOR: char = '\n';

#[derive(Serialize, Deserialize)]
struct RecordLine {
    username: String,
    salt: String,
    hash: String,
    #[serde(flatten)]
    params: HashParams,
    created_at: u64,
}

/// Encodes a record as a single line, without the terminator.
pub fn encode(record: &CredentialRecord) -> Result<String, CodecError> {
    let line = RecordLine {
        username: record.username.clone(),
        salt: STANDARD_NO_PAD.encode(&record.salt),
        hash: STANDARD_NO_PAD.encode(&record.hash),
        params: record.params,
        created_at: record.created_at,
    };
    Ok(serde_json::to_string(&line)?)
}

/// Decodes one line (with or without its terminator).
pub fn decode(line: &str) -> Result<CredentialRecord, CodecError> {
    let line = line.strip_suffix(RECORD_TERMINATOR).unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return Err(CodecError::Empty);
    }

    let raw: RecordLine = serde_json::from_str(line)?;

    if raw.username.trim().is_empty() {
        return Err(CodecError::InvalidField {
            field: "username",
            reason: "empty".into(),
        });
    }

    if raw.username.trim() != raw.username || raw.username.chars().any(char::is_control) {
        return Err(CodecError::InvalidField {
            field: "username",
            reason: "not trimmed or contains control characters".into(),
        });
    }

    Ok(CredentialRecord {
        username: raw.username,
        salt: decode_bytes("salt", &raw.salt)?,
        hash: decode_bytes("hash", &raw.hash)?,
        params: raw.params,
        created_at: raw.created_at,
    })
}

fn decode_bytes(field: &'static str, encoded: &str) -> Result<Vec<u8>, CodecError> {
    let bytes = STANDARD_NO_PAD
        .decode(encoded.as_bytes())
        .map_err(|e| CodecError::InvalidField {
            field,
            reason: format!("{e}"),
        })?;
    if bytes.is_empty() {
        return Err(CodecError::InvalidField {
            field,
            reason: "empty".into(),
        });
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(username: &str) -> CredentialRecord {
        CredentialRecord {
            username: username.to_string(),
            salt: vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16],
            hash: vec![0xAB; 32],
            params: HashParams {
                memory_cost_kib: 19456,
                time_cost: 10,
                parallelism: 1,
            },
            created_at: 1_700_000_000,
        }
    }

    #[test]
    fn delimiter_characters_round_trip_on_one_line() {
        for name in ["alice", "al\"ice", "bob}", "{username: \"x\"}", "ünï"] {
            let original = record(name);
            let line = encode(&original).unwrap();
            assert!(!line.contains(RECORD_TERMINATOR), "encoded {name:?} spans lines");
            assert_eq!(decode(&line).unwrap(), original);
        }
    }

    #[test]
    fn decode_accepts_terminated_line() {
        let original = record("carol");
        let line = format!("{}\n", encode(&original).unwrap());
        assert_eq!(decode(&line).unwrap(), original);
    }

    #[test]
    fn decode_reports_empty_lines() {
        assert!(matches!(decode(""), Err(CodecError::Empty)));
        assert!(matches!(decode("   \n"), Err(CodecError::Empty)));
    }

    #[test]
    fn decode_rejects_legacy_and_truncated_lines() {
        let legacy = r#"{username: "alice", salt: "$2a$10$abc", hash: "$2a$10$def"}"#;
        assert!(matches!(decode(legacy), Err(CodecError::Malformed(_))));

        let full = encode(&record("dave")).unwrap();
        let truncated = &full[..full.len() / 2];
        assert!(matches!(decode(truncated), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn decode_rejects_bad_fields() {
        let bad_salt = r#"{"username":"eve","salt":"!!!","hash":"q80","m":8,"t":1,"p":1,"created_at":0}"#;
        assert!(matches!(
            decode(bad_salt),
            Err(CodecError::InvalidField { field: "salt", .. })
        ));

        let empty_user = r#"{"username":" ","salt":"AQ","hash":"AQ","m":8,"t":1,"p":1,"created_at":0}"#;
        assert!(matches!(
            decode(empty_user),
            Err(CodecError::InvalidField { field: "username", .. })
        ));
    }

    #[test]
    fn decode_rejects_non_canonical_usernames() {
        for name in [" alice", "alice ", "a\nb", "tab\there"] {
            let line = encode(&record(name)).unwrap();
            assert!(
                matches!(decode(&line), Err(CodecError::InvalidField { field: "username", .. })),
                "accepted {name:?}"
            );
        }
    }

    #[test]
    fn decode_is_total_over_arbitrary_bytes() {
        let noise = [
            "\u{0}\u{1}\u{2}",
            "[]",
            "null",
            "{\"username\":",
            "{\"username\":\"x\"}",
        ];
        for line in noise {
            assert!(decode(line).is_err());
        }
    }
}
