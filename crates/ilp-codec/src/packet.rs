//! Serialize/deserialize the three ILPv4 packet types to their bit-exact OER wire form.

use ilp_types::packet::{PACKET_TYPE_FULFILL, PACKET_TYPE_PREPARE, PACKET_TYPE_REJECT};
use ilp_types::{CodecError, Fulfill, IlpAddress, IlpPacket, Prepare, Reject};

use crate::primitives::{
    decode_fixed_octet_string, decode_generalized_time, decode_var_octet_string, decode_var_uint,
    encode_fixed_octet_string, encode_generalized_time, encode_var_octet_string, encode_var_uint,
};
use crate::reader::Reader;

/// Serialize a Prepare packet to its wire form.
pub fn serialize_prepare(prepare: &Prepare) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(PACKET_TYPE_PREPARE);
    out.extend(encode_var_uint(prepare.amount));
    out.extend(encode_generalized_time(prepare.expires_at));
    out.extend(
        encode_fixed_octet_string(&prepare.execution_condition, 32)
            .expect("execution_condition is always 32 bytes"),
    );
    out.extend(encode_var_octet_string(prepare.destination.as_str().as_bytes()));
    out.extend(encode_var_octet_string(&prepare.data));
    out
}

/// Serialize a Fulfill packet to its wire form.
pub fn serialize_fulfill(fulfill: &Fulfill) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(PACKET_TYPE_FULFILL);
    out.extend(
        encode_fixed_octet_string(&fulfill.fulfillment, 32).expect("fulfillment is always 32 bytes"),
    );
    out.extend(encode_var_octet_string(&fulfill.data));
    out
}

/// Serialize a Reject packet to its wire form.
///
/// `code` must be exactly 3 ASCII bytes; this is an invariant enforced at the
/// boundaries that construct `Reject` (the packet handler and the codec's
/// own deserializer), not re-checked here.
pub fn serialize_reject(reject: &Reject) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(PACKET_TYPE_REJECT);
    out.extend(reject.code.as_bytes());
    out.extend(encode_var_octet_string(reject.triggered_by.as_bytes()));
    out.extend(encode_var_octet_string(reject.message.as_bytes()));
    out.extend(encode_var_octet_string(&reject.data));
    out
}

fn serialize_packet(packet: &IlpPacket) -> Vec<u8> {
    match packet {
        IlpPacket::Prepare(p) => serialize_prepare(p),
        IlpPacket::Fulfill(f) => serialize_fulfill(f),
        IlpPacket::Reject(r) => serialize_reject(r),
    }
}

/// Serialize any of the three packet kinds.
pub fn serialize(packet: &IlpPacket) -> Vec<u8> {
    serialize_packet(packet)
}

fn deserialize_address(bytes: &[u8]) -> Result<IlpAddress, CodecError> {
    let s = std::str::from_utf8(bytes).map_err(|_| CodecError::invalid("address is not UTF-8"))?;
    IlpAddress::parse(s).map_err(|e| CodecError::invalid(e.to_string()))
}

fn deserialize_prepare_body(reader: &mut Reader) -> Result<Prepare, CodecError> {
    let amount = decode_var_uint(reader)?;
    let expires_at_bytes = reader.read_exact(19)?;
    let expires_at = decode_generalized_time(expires_at_bytes)?;
    let condition_bytes = decode_fixed_octet_string(reader, 32)?;
    let mut execution_condition = [0u8; 32];
    execution_condition.copy_from_slice(condition_bytes);
    let destination_bytes = decode_var_octet_string(reader)?;
    let destination = deserialize_address(destination_bytes)?;
    let data = decode_var_octet_string(reader)?.to_vec().into();
    Ok(Prepare {
        amount,
        expires_at,
        execution_condition,
        destination,
        data,
    })
}

fn deserialize_fulfill_body(reader: &mut Reader) -> Result<Fulfill, CodecError> {
    let fulfillment_bytes = decode_fixed_octet_string(reader, 32)?;
    let mut fulfillment = [0u8; 32];
    fulfillment.copy_from_slice(fulfillment_bytes);
    let data = decode_var_octet_string(reader)?.to_vec().into();
    Ok(Fulfill { fulfillment, data })
}

fn deserialize_reject_body(reader: &mut Reader) -> Result<Reject, CodecError> {
    let code_bytes = reader.read_exact(3)?;
    let code = std::str::from_utf8(code_bytes)
        .map_err(|_| CodecError::invalid("reject code is not ASCII"))?
        .to_string();
    if code.len() != 3
        || !code.as_bytes()[0].is_ascii_uppercase()
        || !code.as_bytes()[1..].iter().all(u8::is_ascii_digit)
    {
        return Err(CodecError::invalid(format!("malformed reject code {code:?}")));
    }
    let triggered_by_bytes = decode_var_octet_string(reader)?;
    let triggered_by = if triggered_by_bytes.is_empty() {
        String::new()
    } else {
        deserialize_address(triggered_by_bytes)?.into_string()
    };
    let message_bytes = decode_var_octet_string(reader)?;
    let message = std::str::from_utf8(message_bytes)
        .map_err(|_| CodecError::invalid("reject message is not UTF-8"))?
        .to_string();
    let data = decode_var_octet_string(reader)?.to_vec().into();
    Ok(Reject {
        code,
        triggered_by,
        message,
        data,
    })
}

/// Dispatch on the leading type byte and decode the matching packet kind.
///
/// Unknown type bytes fail with `InvalidPacket`.
pub fn deserialize_packet(bytes: &[u8]) -> Result<IlpPacket, CodecError> {
    let mut reader = Reader::new(bytes);
    let packet_type = reader.read_u8()?;
    match packet_type {
        PACKET_TYPE_PREPARE => Ok(IlpPacket::Prepare(deserialize_prepare_body(&mut reader)?)),
        PACKET_TYPE_FULFILL => Ok(IlpPacket::Fulfill(deserialize_fulfill_body(&mut reader)?)),
        PACKET_TYPE_REJECT => Ok(IlpPacket::Reject(deserialize_reject_body(&mut reader)?)),
        other => Err(CodecError::invalid(format!("unknown packet type {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn condition_bytes() -> [u8; 32] {
        let mut b = [0u8; 32];
        for (i, v) in b.iter_mut().enumerate() {
            *v = i as u8;
        }
        b
    }

    #[test]
    fn prepare_wire_vector() {
        let expires_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let prepare = Prepare {
            amount: 1000,
            expires_at,
            execution_condition: condition_bytes(),
            destination: IlpAddress::parse("g.example.alice").unwrap(),
            data: Vec::new().into(),
        };
        let encoded = serialize_prepare(&prepare);
        assert_eq!(encoded[0], 0x0C);
        assert_eq!(&encoded[1..4], &[0x82, 0x03, 0xE8]);
        assert_eq!(&encoded[4..23], b"20240101120000.000Z");
        assert_eq!(&encoded[23..55], &condition_bytes());
        assert_eq!(encoded[55], 0x0F);
        assert_eq!(&encoded[56..71], b"g.example.alice");
        assert_eq!(encoded[71], 0x00);

        let decoded = deserialize_packet(&encoded).unwrap();
        assert_eq!(decoded, IlpPacket::Prepare(prepare));
    }

    #[test]
    fn fulfill_wire_vector() {
        let fulfillment = {
            let mut b = [0u8; 32];
            for (i, v) in b.iter_mut().enumerate() {
                *v = 0xFF - i as u8;
            }
            b
        };
        let fulfill = Fulfill {
            fulfillment,
            data: Vec::new().into(),
        };
        let encoded = serialize_fulfill(&fulfill);
        assert_eq!(encoded.len(), 34);
        assert_eq!(encoded[0], 0x0D);
        assert_eq!(&encoded[1..33], &fulfillment);
        assert_eq!(encoded[33], 0x00);

        let decoded = deserialize_packet(&encoded).unwrap();
        assert_eq!(decoded, IlpPacket::Fulfill(fulfill));
    }

    #[test]
    fn reject_wire_vector() {
        let reject = Reject::new("F02", "g.hub", "No route found", Vec::new());
        let encoded = serialize_reject(&reject);
        let mut expected = vec![0x0E];
        expected.extend(b"F02");
        expected.push(0x05);
        expected.extend(b"g.hub");
        expected.push(0x0E);
        expected.extend(b"No route found");
        expected.push(0x00);
        assert_eq!(encoded, expected);

        let decoded = deserialize_packet(&encoded).unwrap();
        assert_eq!(decoded, IlpPacket::Reject(reject));
    }

    #[test]
    fn unknown_type_is_invalid_packet() {
        let bytes = [0xFF];
        assert!(matches!(
            deserialize_packet(&bytes),
            Err(CodecError::InvalidPacket(_))
        ));
    }

    #[test]
    fn truncated_prepare_is_underflow() {
        let expires_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let prepare = Prepare {
            amount: 1000,
            expires_at,
            execution_condition: condition_bytes(),
            destination: IlpAddress::parse("g.example.alice").unwrap(),
            data: Vec::new().into(),
        };
        let encoded = serialize_prepare(&prepare);
        let truncated = &encoded[..encoded.len() - 5];
        assert!(matches!(
            deserialize_packet(truncated),
            Err(CodecError::BufferUnderflow { .. })
        ));
    }

    #[test]
    fn round_trips_empty_triggered_by() {
        let reject = Reject::new("F99", "", "oops", Vec::new());
        let encoded = serialize_reject(&reject);
        let decoded = deserialize_packet(&encoded).unwrap();
        assert_eq!(decoded, IlpPacket::Reject(reject));
    }
}
