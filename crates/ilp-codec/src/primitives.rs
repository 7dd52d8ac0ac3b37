//! VarUInt, VarOctetString, Fixed Octet String, and Generalized Time.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use ilp_types::CodecError;

use crate::reader::Reader;

/// Length of the `YYYYMMDDHHmmss.fffZ` Generalized Time representation.
pub const GENERALIZED_TIME_LEN: usize = 19;

/// Encode `value` as an OER VarUInt: single byte if `<= 127`, else a
/// `0x80 | L` length prefix followed by `L` big-endian value bytes.
pub fn encode_var_uint(value: u64) -> Vec<u8> {
    if value <= 0x7F {
        return vec![value as u8];
    }
    let be = value.to_be_bytes();
    let first_significant = be.iter().position(|&b| b != 0).unwrap_or(7);
    let significant = &be[first_significant..];
    let mut out = Vec::with_capacity(1 + significant.len());
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(significant);
    out
}

/// Decode a VarUInt, returning `(value, bytes_consumed)`.
pub fn decode_var_uint(reader: &mut Reader) -> Result<u64, CodecError> {
    let first = reader.read_u8()?;
    if first & 0x80 == 0 {
        return Ok(first as u64);
    }
    let len = (first & 0x7F) as usize;
    if len == 0 || len > 8 {
        return Err(CodecError::invalid(format!(
            "VarUInt length prefix {len} out of range 1..=8"
        )));
    }
    let bytes = reader.read_exact(len)?;
    let mut value: u64 = 0;
    for &b in bytes {
        value = (value << 8) | b as u64;
    }
    Ok(value)
}

/// Encode `bytes` as `VarUInt(len) || bytes`.
pub fn encode_var_octet_string(bytes: &[u8]) -> Vec<u8> {
    let mut out = encode_var_uint(bytes.len() as u64);
    out.extend_from_slice(bytes);
    out
}

/// Decode a VarOctetString, returning the contained bytes.
pub fn decode_var_octet_string<'a>(reader: &mut Reader<'a>) -> Result<&'a [u8], CodecError> {
    let len = decode_var_uint(reader)?;
    reader.read_exact(len as usize)
}

/// Encode `data` as a fixed-width octet string of exactly `n` bytes (no length prefix).
///
/// Fails if `data.len() != n`.
pub fn encode_fixed_octet_string(data: &[u8], n: usize) -> Result<Vec<u8>, CodecError> {
    if data.len() != n {
        return Err(CodecError::invalid(format!(
            "fixed octet string expected {n} bytes, got {}",
            data.len()
        )));
    }
    Ok(data.to_vec())
}

/// Decode a fixed-width octet string of exactly `n` bytes.
pub fn decode_fixed_octet_string<'a>(
    reader: &mut Reader<'a>,
    n: usize,
) -> Result<&'a [u8], CodecError> {
    reader.read_exact(n)
}

/// Encode `instant` as 19 ASCII bytes: `YYYYMMDDHHmmss.fffZ`, always UTC.
pub fn encode_generalized_time(instant: DateTime<Utc>) -> [u8; GENERALIZED_TIME_LEN] {
    let s = format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}.{:03}Z",
        instant.year(),
        instant.month(),
        instant.day(),
        instant.hour(),
        instant.minute(),
        instant.second(),
        instant.timestamp_subsec_millis(),
    );
    let bytes = s.into_bytes();
    let mut out = [0u8; GENERALIZED_TIME_LEN];
    out.copy_from_slice(&bytes);
    out
}

/// Decode a 19-byte Generalized Time string into a UTC instant.
///
/// Rejects any deviation in length, digit positions, or the literal `Z`
/// terminator with `InvalidPacket`.
pub fn decode_generalized_time(bytes: &[u8]) -> Result<DateTime<Utc>, CodecError> {
    if bytes.len() != GENERALIZED_TIME_LEN {
        return Err(CodecError::invalid(format!(
            "GeneralizedTime must be {GENERALIZED_TIME_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    let s = std::str::from_utf8(bytes)
        .map_err(|_| CodecError::invalid("GeneralizedTime is not valid UTF-8"))?;
    let digits = &s[0..14];
    let dot = &s[14..15];
    let millis = &s[15..18];
    let z = &s[18..19];
    if dot != "." || z != "Z" {
        return Err(CodecError::invalid(
            "GeneralizedTime must be `YYYYMMDDHHmmss.fffZ`",
        ));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) || !millis.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CodecError::invalid(
            "GeneralizedTime digit fields must be all-numeric",
        ));
    }
    let year: i32 = digits[0..4].parse().unwrap();
    let month: u32 = digits[4..6].parse().unwrap();
    let day: u32 = digits[6..8].parse().unwrap();
    let hour: u32 = digits[8..10].parse().unwrap();
    let minute: u32 = digits[10..12].parse().unwrap();
    let second: u32 = digits[12..14].parse().unwrap();
    let milli: u32 = millis.parse().unwrap();

    let date = Utc
        .with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .ok_or_else(|| CodecError::invalid("GeneralizedTime is not a valid calendar instant"))?;
    Ok(date + chrono::Duration::milliseconds(milli as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_uint_boundary_vectors() {
        assert_eq!(encode_var_uint(0), vec![0x00]);
        assert_eq!(encode_var_uint(127), vec![0x7F]);
        assert_eq!(encode_var_uint(128), vec![0x81, 0x80]);
        assert_eq!(encode_var_uint(256), vec![0x82, 0x01, 0x00]);
        assert_eq!(
            encode_var_uint(u64::MAX),
            vec![0x88, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn var_uint_round_trips() {
        for v in [0u64, 1, 126, 127, 128, 129, 255, 256, 65535, 1 << 40, u64::MAX] {
            let encoded = encode_var_uint(v);
            let mut reader = Reader::new(&encoded);
            assert_eq!(decode_var_uint(&mut reader).unwrap(), v);
            assert_eq!(reader.remaining(), 0);
        }
    }

    #[test]
    fn var_uint_underflow() {
        let encoded = [0x82, 0x01]; // claims 2 bytes follow, only 1 present
        let mut reader = Reader::new(&encoded);
        assert!(matches!(
            decode_var_uint(&mut reader),
            Err(CodecError::BufferUnderflow { .. })
        ));
    }

    #[test]
    fn var_octet_string_zero_length() {
        assert_eq!(encode_var_octet_string(&[]), vec![0x00]);
        let mut reader = Reader::new(&[0x00]);
        assert_eq!(decode_var_octet_string(&mut reader).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn var_octet_string_round_trips() {
        let data = b"hello world";
        let encoded = encode_var_octet_string(data);
        let mut reader = Reader::new(&encoded);
        assert_eq!(decode_var_octet_string(&mut reader).unwrap(), data);
    }

    #[test]
    fn fixed_octet_string_rejects_wrong_length() {
        assert!(encode_fixed_octet_string(&[1, 2, 3], 4).is_err());
        assert!(encode_fixed_octet_string(&[1, 2, 3, 4], 4).is_ok());
    }

    #[test]
    fn generalized_time_boundary_vector() {
        let instant = Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(999);
        let encoded = encode_generalized_time(instant);
        assert_eq!(&encoded, b"20250131235959.999Z");
        assert_eq!(decode_generalized_time(&encoded).unwrap(), instant);
    }

    #[test]
    fn generalized_time_rejects_wrong_length() {
        assert!(decode_generalized_time(b"2025").is_err());
    }

    #[test]
    fn generalized_time_rejects_missing_terminator() {
        assert!(decode_generalized_time(b"20250131235959.999X").is_err());
    }
}
