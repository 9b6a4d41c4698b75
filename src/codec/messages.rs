use prost::bytes::{Buf, BufMut};
use prost::encoding::{self, double, int32, int64, message, string, DecodeContext, WireType};
use prost::{DecodeError, Message};
use crate::prompb::*;

/// Attaches the message and field name to a decode error, as generated code does.
fn context(message: &'static str, field: &'static str) -> impl FnOnce(DecodeError) -> DecodeError {
    move |mut err| {
        err.push(message, field);
        err
    }
}

impl Message for Label {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if !self.name.is_empty() {
            string::encode(1, &self.name, buf);
        }
        if !self.value.is_empty() {
            string::encode(2, &self.value, buf);
        }
        self.unknown_fields.encode(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        const NAME: &str = "Label";
        match tag {
            1 => string::merge(wire_type, &mut self.name, buf, ctx).map_err(context(NAME, "name")),
            2 => string::merge(wire_type, &mut self.value, buf, ctx).map_err(context(NAME, "value")),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        (if self.name.is_empty() { 0 } else { string::encoded_len(1, &self.name) })
            + (if self.value.is_empty() { 0 } else { string::encoded_len(2, &self.value) })
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        self.name.clear();
        self.value.clear();
        self.unknown_fields.clear();
    }
}

impl Message for Labels {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        message::encode_repeated(1, &self.labels, buf);
        self.unknown_fields.encode(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => message::merge_repeated(wire_type, &mut self.labels, buf, ctx)
                .map_err(context("Labels", "labels")),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        message::encoded_len_repeated(1, &self.labels) + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        self.labels.clear();
        self.unknown_fields.clear();
    }
}

impl Message for Sample {
    // Only +0.0 is the default; -0.0 and NaN payloads are written so they round-trip.
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if self.value.to_bits() != 0 {
            double::encode(1, &self.value, buf);
        }
        if self.timestamp != 0 {
            int64::encode(2, &self.timestamp, buf);
        }
        self.unknown_fields.encode(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        const NAME: &str = "Sample";
        match tag {
            1 => double::merge(wire_type, &mut self.value, buf, ctx).map_err(context(NAME, "value")),
            2 => int64::merge(wire_type, &mut self.timestamp, buf, ctx)
                .map_err(context(NAME, "timestamp")),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        (if self.value.to_bits() == 0 { 0 } else { double::encoded_len(1, &self.value) })
            + (if self.timestamp == 0 { 0 } else { int64::encoded_len(2, &self.timestamp) })
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        self.value = 0.0;
        self.timestamp = 0;
        self.unknown_fields.clear();
    }
}

impl Message for TimeSeries {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        message::encode_repeated(1, &self.labels, buf);
        message::encode_repeated(2, &self.samples, buf);
        self.unknown_fields.encode(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        const NAME: &str = "TimeSeries";
        match tag {
            1 => message::merge_repeated(wire_type, &mut self.labels, buf, ctx)
                .map_err(context(NAME, "labels")),
            2 => message::merge_repeated(wire_type, &mut self.samples, buf, ctx)
                .map_err(context(NAME, "samples")),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        message::encoded_len_repeated(1, &self.labels)
            + message::encoded_len_repeated(2, &self.samples)
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        self.labels.clear();
        self.samples.clear();
        self.unknown_fields.clear();
    }
}

impl Message for LabelMatcher {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        if self.r#type != 0 {
            int32::encode(1, &self.r#type, buf);
        }
        if !self.name.is_empty() {
            string::encode(2, &self.name, buf);
        }
        if !self.value.is_empty() {
            string::encode(3, &self.value, buf);
        }
        self.unknown_fields.encode(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        const NAME: &str = "LabelMatcher";
        match tag {
            1 => int32::merge(wire_type, &mut self.r#type, buf, ctx).map_err(context(NAME, "type")),
            2 => string::merge(wire_type, &mut self.name, buf, ctx).map_err(context(NAME, "name")),
            3 => string::merge(wire_type, &mut self.value, buf, ctx).map_err(context(NAME, "value")),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        (if self.r#type == 0 { 0 } else { int32::encoded_len(1, &self.r#type) })
            + (if self.name.is_empty() { 0 } else { string::encoded_len(2, &self.name) })
            + (if self.value.is_empty() { 0 } else { string::encoded_len(3, &self.value) })
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        self.r#type = 0;
        self.name.clear();
        self.value.clear();
        self.unknown_fields.clear();
    }
}

fn int64_len(tag: u32, value: i64) -> usize {
    if value == 0 {
        0
    } else {
        int64::encoded_len(tag, &value)
    }
}

fn encode_int64(tag: u32, value: i64, buf: &mut impl BufMut) {
    if value != 0 {
        int64::encode(tag, &value, buf);
    }
}

impl Message for ReadHints {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        encode_int64(1, self.step_ms, buf);
        if !self.func.is_empty() {
            string::encode(2, &self.func, buf);
        }
        encode_int64(3, self.start_ms, buf);
        encode_int64(4, self.end_ms, buf);
        string::encode_repeated(5, &self.grouping, buf);
        if self.by {
            encoding::bool::encode(6, &self.by, buf);
        }
        encode_int64(7, self.range_ms, buf);
        self.unknown_fields.encode(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        const NAME: &str = "ReadHints";
        match tag {
            1 => int64::merge(wire_type, &mut self.step_ms, buf, ctx).map_err(context(NAME, "step_ms")),
            2 => string::merge(wire_type, &mut self.func, buf, ctx).map_err(context(NAME, "func")),
            3 => int64::merge(wire_type, &mut self.start_ms, buf, ctx).map_err(context(NAME, "start_ms")),
            4 => int64::merge(wire_type, &mut self.end_ms, buf, ctx).map_err(context(NAME, "end_ms")),
            5 => string::merge_repeated(wire_type, &mut self.grouping, buf, ctx)
                .map_err(context(NAME, "grouping")),
            6 => encoding::bool::merge(wire_type, &mut self.by, buf, ctx).map_err(context(NAME, "by")),
            7 => int64::merge(wire_type, &mut self.range_ms, buf, ctx).map_err(context(NAME, "range_ms")),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        int64_len(1, self.step_ms)
            + (if self.func.is_empty() { 0 } else { string::encoded_len(2, &self.func) })
            + int64_len(3, self.start_ms)
            + int64_len(4, self.end_ms)
            + string::encoded_len_repeated(5, &self.grouping)
            + (if self.by { encoding::bool::encoded_len(6, &self.by) } else { 0 })
            + int64_len(7, self.range_ms)
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = ReadHints::default();
    }
}

impl Message for Query {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        encode_int64(1, self.start_timestamp_ms, buf);
        encode_int64(2, self.end_timestamp_ms, buf);
        message::encode_repeated(3, &self.matchers, buf);
        // written whenever present, even when every hint field is zero
        if let Some(hints) = &self.hints {
            message::encode(4, hints, buf);
        }
        self.unknown_fields.encode(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        const NAME: &str = "Query";
        match tag {
            1 => int64::merge(wire_type, &mut self.start_timestamp_ms, buf, ctx)
                .map_err(context(NAME, "start_timestamp_ms")),
            2 => int64::merge(wire_type, &mut self.end_timestamp_ms, buf, ctx)
                .map_err(context(NAME, "end_timestamp_ms")),
            3 => message::merge_repeated(wire_type, &mut self.matchers, buf, ctx)
                .map_err(context(NAME, "matchers")),
            4 => {
                let hints = self.hints.get_or_insert_with(ReadHints::default);
                message::merge(wire_type, hints, buf, ctx).map_err(context(NAME, "hints"))
            }
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        int64_len(1, self.start_timestamp_ms)
            + int64_len(2, self.end_timestamp_ms)
            + message::encoded_len_repeated(3, &self.matchers)
            + self.hints.as_ref().map_or(0, |h| message::encoded_len(4, h))
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        *self = Query::default();
    }
}

impl Message for QueryResult {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        message::encode_repeated(1, &self.timeseries, buf);
        self.unknown_fields.encode(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => message::merge_repeated(wire_type, &mut self.timeseries, buf, ctx)
                .map_err(context("QueryResult", "timeseries")),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        message::encoded_len_repeated(1, &self.timeseries) + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        self.timeseries.clear();
        self.unknown_fields.clear();
    }
}

impl Message for WriteRequest {
    // metadata (tag 3) is not modelled and travels as an unknown field
    fn encode_raw(&self, buf: &mut impl BufMut) {
        message::encode_repeated(1, &self.timeseries, buf);
        self.unknown_fields.encode(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => message::merge_repeated(wire_type, &mut self.timeseries, buf, ctx)
                .map_err(context("WriteRequest", "timeseries")),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        message::encoded_len_repeated(1, &self.timeseries) + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        self.timeseries.clear();
        self.unknown_fields.clear();
    }
}

impl Message for ReadRequest {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        message::encode_repeated(1, &self.queries, buf);
        int32::encode_packed(2, &self.accepted_response_types, buf);
        self.unknown_fields.encode(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        const NAME: &str = "ReadRequest";
        match tag {
            1 => message::merge_repeated(wire_type, &mut self.queries, buf, ctx)
                .map_err(context(NAME, "queries")),
            // packed or unpacked
            2 => int32::merge_repeated(wire_type, &mut self.accepted_response_types, buf, ctx)
                .map_err(context(NAME, "accepted_response_types")),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        message::encoded_len_repeated(1, &self.queries)
            + int32::encoded_len_packed(2, &self.accepted_response_types)
            + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        self.queries.clear();
        self.accepted_response_types.clear();
        self.unknown_fields.clear();
    }
}

impl Message for ReadResponse {
    fn encode_raw(&self, buf: &mut impl BufMut) {
        message::encode_repeated(1, &self.results, buf);
        self.unknown_fields.encode(buf);
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), DecodeError> {
        match tag {
            1 => message::merge_repeated(wire_type, &mut self.results, buf, ctx)
                .map_err(context("ReadResponse", "results")),
            _ => self.unknown_fields.merge_field(tag, wire_type, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        message::encoded_len_repeated(1, &self.results) + self.unknown_fields.encoded_len()
    }

    fn clear(&mut self) {
        self.results.clear();
        self.unknown_fields.clear();
    }
}
