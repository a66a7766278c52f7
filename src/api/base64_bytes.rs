//! Byte fields on the wire
//!
//! Transactions, keys, values and hashes travel as standard base64 strings,
//! the way the consensus engine's JSON encoding carries `bytes` fields.
//! Usable as `#[serde(with = "crate::api::base64_bytes")]`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serializer};

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(text)
}

pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&encode(bytes))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    decode(&text).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "crate::api::base64_bytes")]
        data: Vec<u8>,
    }

    #[test]
    fn test_field_encoding() {
        let json = serde_json::to_string(&Wrapper { data: b"k=v".to_vec() }).unwrap();
        assert_eq!(json, r#"{"data":"az12"}"#);

        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data, b"k=v");
    }

    #[test]
    fn test_invalid_base64_rejected() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"data":"***"}"#).is_err());
    }
}
