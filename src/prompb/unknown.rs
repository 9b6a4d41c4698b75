use prost::bytes::{Buf, BufMut};
use prost::encoding::{encode_key, encode_varint, key_len, skip_field, DecodeContext, WireType};
use prost::DecodeError;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A field that the decoder did not recognise, kept verbatim.
///
/// `raw` holds every byte that followed the field key on the wire: the varint, the
/// fixed-width value, the length prefix plus payload, or the group body plus its
/// end-group key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownField {
    pub number: u32,
    pub wire_type: WireType,
    pub raw: Vec<u8>,
}

impl UnknownField {
    pub fn encoded_len(&self) -> usize {
        key_len(self.number) + self.raw.len()
    }

    fn sort_key(&self) -> (u32, u8, &[u8]) {
        (self.number, self.wire_type as u8, &self.raw)
    }
}

impl Hash for UnknownField {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sort_key().hash(state)
    }
}

impl PartialOrd for UnknownField {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UnknownField {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Unknown fields of a message in the order they were read. Re-emitted after the known
/// fields on encode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnknownFields(Vec<UnknownField>);

impl UnknownFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnknownField> {
        self.0.iter()
    }

    /// Returns every occurrence of the given field number.
    pub fn get(&self, number: u32) -> impl Iterator<Item = &UnknownField> {
        self.0.iter().filter(move |f| f.number == number)
    }

    pub fn push(&mut self, field: UnknownField) {
        self.0.push(field)
    }

    pub fn push_varint(&mut self, number: u32, value: u64) {
        let mut raw = Vec::with_capacity(10);
        encode_varint(value, &mut raw);
        self.push(UnknownField {
            number,
            wire_type: WireType::Varint,
            raw,
        });
    }

    pub fn push_bytes(&mut self, number: u32, payload: &[u8]) {
        let mut raw = Vec::with_capacity(payload.len() + 5);
        encode_varint(payload.len() as u64, &mut raw);
        raw.extend_from_slice(payload);
        self.push(UnknownField {
            number,
            wire_type: WireType::LengthDelimited,
            raw,
        });
    }

    /// Consumes the value of field `number` from `buf` and keeps its bytes. Groups are
    /// walked under the recursion limit of `ctx`; a stray end-group key is an error.
    pub fn merge_field(
        &mut self,
        number: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        let mut recorder = RecordingBuf::new(buf);
        skip_field(wire_type, number, &mut recorder, ctx)?;
        self.push(UnknownField {
            number,
            wire_type,
            raw: recorder.raw,
        });
        Ok(())
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        for field in self.0.iter() {
            encode_key(field.number, field.wire_type, buf);
            buf.put_slice(&field.raw);
        }
    }

    pub fn encoded_len(&self) -> usize {
        self.0.iter().map(|f| f.encoded_len()).sum()
    }
}

/// Copies every byte consumed from the wrapped buffer.
struct RecordingBuf<'a, B: Buf> {
    inner: &'a mut B,
    raw: Vec<u8>,
}

impl<'a, B: Buf> RecordingBuf<'a, B> {
    fn new(inner: &'a mut B) -> Self {
        Self {
            inner,
            raw: Vec::new(),
        }
    }
}

impl<B: Buf> Buf for RecordingBuf<'_, B> {
    fn remaining(&self) -> usize {
        self.inner.remaining()
    }

    fn chunk(&self) -> &[u8] {
        self.inner.chunk()
    }

    fn advance(&mut self, mut cnt: usize) {
        while cnt > 0 {
            let chunk = self.inner.chunk();
            let n = chunk.len().min(cnt);
            if n == 0 {
                // past the end; let the inner buffer report it
                self.inner.advance(cnt);
                return;
            }
            self.raw.extend_from_slice(&chunk[..n]);
            self.inner.advance(n);
            cnt -= n;
        }
    }
}
