//! # codec
//!
//! why: let callers pick the command encoding without the journal knowing about it
//! relations: used by consensus layers to turn typed commands into the opaque
//! bytes handed to Journal::add, and back when applying entries
//! what: CommandCodec trait, JsonCodec implementation, CodecError

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors raised while encoding or decoding a command payload
#[derive(Debug, Error)]
pub enum CodecError {
    /// The command could not be serialized to bytes
    #[error("command encoding failed: {0}")]
    Encode(#[source] serde_json::Error),
    /// The stored bytes could not be deserialized back into a command
    #[error("command decoding failed: {0}")]
    Decode(#[source] serde_json::Error),
}

/// A byte-serialization pair for journal commands
///
/// The journal stores commands as opaque bytes; whoever drives the journal
/// supplies the codec and is the only party that knows the command type.
pub trait CommandCodec {
    /// The typed command this codec understands
    type Command;

    /// Serialize a command to the byte payload stored in the journal
    fn encode(&self, command: &Self::Command) -> Result<Vec<u8>, CodecError>;

    /// Deserialize a stored byte payload back into a command
    fn decode(&self, bytes: &[u8]) -> Result<Self::Command, CodecError>;
}

/// JSON-backed codec for any serde-serializable command type
pub struct JsonCodec<T> {
    _command: PhantomData<T>,
}

impl<T> JsonCodec<T> {
    /// Create a new JSON codec
    pub fn new() -> Self {
        Self {
            _command: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CommandCodec for JsonCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    type Command = T;

    fn encode(&self, command: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(command).map_err(CodecError::Encode)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    enum KvCommand {
        Set { key: String, value: u64 },
        Delete { key: String },
    }

    #[test]
    fn json_codec_round_trips_a_command() {
        let codec = JsonCodec::new();
        let command = KvCommand::Set {
            key: "x".to_string(),
            value: 42,
        };

        let bytes = codec.encode(&command).unwrap();
        let decoded = codec.decode(&bytes).unwrap();

        assert_eq!(decoded, command);
    }

    #[test]
    fn decode_rejects_garbage_bytes() {
        let codec: JsonCodec<KvCommand> = JsonCodec::new();

        let err = codec.decode(b"\xff\xfe not json").unwrap_err();

        assert!(matches!(err, CodecError::Decode(_)));
    }
}
