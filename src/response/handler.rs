use std::sync::Arc;
use prost::Message;
use crate::codec::WireMessage;
use crate::config::Settings;
use crate::error::ProtocolResult;
use crate::prompb::{ReadRequest, WriteRequest};
use crate::storage::{Deadline, Storage};
use super::{ReadOutcome, ResponseAssembler, WriteOutcome};

/// Wire-to-wire entry point: decoded request bytes in, encoded response bytes out.
///
/// Transport framing and compression are the caller's concern; the bodies passed here
/// are raw encoded messages.
pub struct RemoteHandler {
    assembler: ResponseAssembler,
}

impl RemoteHandler {
    pub fn new(storage: Arc<dyn Storage>, settings: Settings) -> ProtocolResult<Self> {
        Ok(Self {
            assembler: ResponseAssembler::new(storage, settings)?,
        })
    }

    pub fn assembler(&self) -> &ResponseAssembler {
        &self.assembler
    }

    fn default_deadline(&self) -> Deadline {
        Deadline::from_timeout(self.assembler.settings().query_timeout)
    }

    /// Decodes a `WriteRequest` and ingests its series. Decode errors reject the whole
    /// body; ingest errors are reported per series.
    pub fn write_bytes(&self, body: &[u8]) -> ProtocolResult<WriteOutcome> {
        self.write_bytes_with_deadline(body, &self.default_deadline())
    }

    pub fn write_bytes_with_deadline(&self, body: &[u8], deadline: &Deadline) -> ProtocolResult<WriteOutcome> {
        let req = WriteRequest::decode_with_limits(body, self.assembler.settings())?;
        Ok(self.assembler.write(req, deadline))
    }

    /// Decodes a `ReadRequest`, evaluates it and returns the encoded `ReadResponse`.
    /// Fails with the first query error.
    pub fn read_bytes(&self, body: &[u8]) -> ProtocolResult<Vec<u8>> {
        self.read_bytes_with_deadline(body, &self.default_deadline())
    }

    pub fn read_bytes_with_deadline(&self, body: &[u8], deadline: &Deadline) -> ProtocolResult<Vec<u8>> {
        let outcome = self.read_outcome(body, deadline)?;
        Ok(outcome.into_response()?.encode_to_vec())
    }

    /// Decodes and evaluates a `ReadRequest`, keeping per-query errors.
    pub fn read_outcome(&self, body: &[u8], deadline: &Deadline) -> ProtocolResult<ReadOutcome> {
        let req = ReadRequest::decode_with_limits(body, self.assembler.settings())?;
        self.assembler.read(&req, deadline)
    }
}
