//! Binary encoding of the remote storage messages.
//!
//! Every message implements [`prost::Message`] by hand so that unknown fields, groups
//! included, are kept on the message and written back after the known fields. A
//! message decoded and re-encoded by this crate loses nothing a newer peer put on the
//! wire.
mod messages;

use prost::Message;
use crate::config::Settings;
use crate::error::{DecodeError, DecodeResult};

/// Decoding of untrusted bodies under the configured limits.
pub trait WireMessage: Message + Default {
    /// Decodes `bytes`, rejecting bodies larger than `settings.max_message_size`.
    /// Nesting of messages and unknown groups is bounded by prost's recursion limit.
    fn decode_with_limits(bytes: &[u8], settings: &Settings) -> DecodeResult<Self> {
        if bytes.len() > settings.max_message_size {
            return Err(DecodeError::MessageTooLarge {
                size: bytes.len(),
                limit: settings.max_message_size,
            });
        }
        Ok(Self::decode(bytes)?)
    }
}

impl<M: Message + Default> WireMessage for M {}
