//! BTP frame types and their wire codec: `type(u8) || requestId(u32 BE) || payload`.

use bytes::Bytes;
use ilp_codec::primitives::{decode_var_octet_string, decode_var_uint, encode_var_octet_string, encode_var_uint};
use ilp_codec::Reader;
use ilp_types::CodecError;

pub const FRAME_TYPE_MESSAGE: u8 = 1;
pub const FRAME_TYPE_RESPONSE: u8 = 2;
pub const FRAME_TYPE_ERROR: u8 = 3;

/// A single protocol-data entry carried in a `MESSAGE`/`RESPONSE`/`ERROR` payload.
///
/// The `auth` entry is the one with protocol-level meaning to this crate: its
/// `data` is the UTF-8 JSON encoding of [`crate::auth::AuthPayload`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolData {
    pub protocol_name: String,
    pub content_type: u8,
    pub data: Bytes,
}

impl ProtocolData {
    pub fn new(protocol_name: impl Into<String>, content_type: u8, data: impl Into<Bytes>) -> Self {
        Self {
            protocol_name: protocol_name.into(),
            content_type,
            data: data.into(),
        }
    }
}

/// A decoded BTP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BtpFrame {
    pub frame_type: u8,
    pub request_id: u32,
    pub protocol_data: Vec<ProtocolData>,
    /// The embedded ILP packet, present only on some `MESSAGE` frames.
    pub ilp_packet: Option<Bytes>,
}

impl BtpFrame {
    pub fn message(request_id: u32, protocol_data: Vec<ProtocolData>, ilp_packet: Option<Bytes>) -> Self {
        Self {
            frame_type: FRAME_TYPE_MESSAGE,
            request_id,
            protocol_data,
            ilp_packet,
        }
    }

    pub fn response(request_id: u32, protocol_data: Vec<ProtocolData>, ilp_packet: Option<Bytes>) -> Self {
        Self {
            frame_type: FRAME_TYPE_RESPONSE,
            request_id,
            protocol_data,
            ilp_packet,
        }
    }

    pub fn error(request_id: u32, protocol_data: Vec<ProtocolData>) -> Self {
        Self {
            frame_type: FRAME_TYPE_ERROR,
            request_id,
            protocol_data,
            ilp_packet: None,
        }
    }

    pub fn find_protocol_data(&self, name: &str) -> Option<&ProtocolData> {
        self.protocol_data.iter().find(|p| p.protocol_name == name)
    }
}

pub fn encode_frame(frame: &BtpFrame) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(frame.frame_type);
    out.extend(frame.request_id.to_be_bytes());
    out.extend(encode_var_uint(frame.protocol_data.len() as u64));
    for pd in &frame.protocol_data {
        out.extend(encode_var_octet_string(pd.protocol_name.as_bytes()));
        out.push(pd.content_type);
        out.extend(encode_var_octet_string(&pd.data));
    }
    match &frame.ilp_packet {
        Some(packet) => out.extend(encode_var_octet_string(packet)),
        None => out.extend(encode_var_octet_string(&[])),
    }
    out
}

pub fn decode_frame(bytes: &[u8]) -> Result<BtpFrame, CodecError> {
    let mut reader = Reader::new(bytes);
    let frame_type = reader.read_u8()?;
    let id_bytes = reader.read_exact(4)?;
    let request_id = u32::from_be_bytes(id_bytes.try_into().expect("read_exact(4) returns 4 bytes"));

    let count = decode_var_uint(&mut reader)?;
    let mut protocol_data = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_bytes = decode_var_octet_string(&mut reader)?;
        let protocol_name = std::str::from_utf8(name_bytes)
            .map_err(|_| CodecError::invalid("protocol name is not UTF-8"))?
            .to_string();
        let content_type = reader.read_u8()?;
        let data = decode_var_octet_string(&mut reader)?.to_vec();
        protocol_data.push(ProtocolData {
            protocol_name,
            content_type,
            data: data.into(),
        });
    }

    let ilp_bytes = decode_var_octet_string(&mut reader)?;
    let ilp_packet = if ilp_bytes.is_empty() {
        None
    } else {
        Some(Bytes::copy_from_slice(ilp_bytes))
    };

    match frame_type {
        FRAME_TYPE_MESSAGE | FRAME_TYPE_RESPONSE | FRAME_TYPE_ERROR => Ok(BtpFrame {
            frame_type,
            request_id,
            protocol_data,
            ilp_packet,
        }),
        other => Err(CodecError::invalid(format!("unknown BTP frame type {other}"))),
    }
}
