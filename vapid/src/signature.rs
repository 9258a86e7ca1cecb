//! Conversion between DER-encoded ECDSA signatures and the fixed-width `r‖s`
//! form used by JOSE (RFC7518 section 3.4).
//!
//! Native ECDSA implementations usually produce and consume
//! `SEQUENCE { INTEGER r, INTEGER s }`, while a JWS carries both integers
//! left-padded to the curve's field size and concatenated.

use crate::error::{Error, Result};

/// Field size of the P-256 curve in bytes.
pub const P256_FIELD_SIZE: usize = 32;

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;
// Keeps every encoded length within two length octets.
const MAX_RAW_LENGTH: usize = 1024;

/// Converts a DER `ECDSA-Sig-Value` into `r‖s`, each half exactly
/// `field_size` bytes long.
pub fn der_to_raw(der: &[u8], field_size: usize) -> Result<Vec<u8>> {
    let (tag, body, rest) = read_tlv(der)?;
    if tag != TAG_SEQUENCE {
        return Err(Error::MalformedSignature("expected DER sequence"));
    }
    if !rest.is_empty() {
        return Err(Error::MalformedSignature("trailing bytes after sequence"));
    }

    let (r, body) = read_integer(body)?;
    let (s, body) = read_integer(body)?;
    if !body.is_empty() {
        return Err(Error::MalformedSignature("sequence holds more than two integers"));
    }

    let mut raw = vec![0u8; 2 * field_size];
    copy_left_padded(r, &mut raw[..field_size])?;
    copy_left_padded(s, &mut raw[field_size..])?;

    Ok(raw)
}

/// Converts `r‖s` into a canonical DER `ECDSA-Sig-Value`.
///
/// The field size is taken to be half the length of `raw`.
pub fn raw_to_der(raw: &[u8]) -> Result<Vec<u8>> {
    if raw.is_empty() || raw.len() % 2 != 0 || raw.len() > MAX_RAW_LENGTH {
        return Err(Error::MalformedSignature("raw signature must split into two halves"));
    }
    let (r, s) = raw.split_at(raw.len() / 2);

    let mut body = Vec::with_capacity(raw.len() + 6);
    write_integer(&mut body, r);
    write_integer(&mut body, s);

    let mut der = Vec::with_capacity(body.len() + 3);
    der.push(TAG_SEQUENCE);
    write_length(&mut der, body.len());
    der.extend_from_slice(&body);

    Ok(der)
}

fn read_tlv(input: &[u8]) -> Result<(u8, &[u8], &[u8])> {
    let (&tag, input) = input
        .split_first()
        .ok_or(Error::MalformedSignature("truncated tag"))?;
    let (&first, mut input) = input
        .split_first()
        .ok_or(Error::MalformedSignature("truncated length"))?;

    let len = if first < 0x80 {
        usize::from(first)
    } else {
        let count = usize::from(first & 0x7f);
        if count == 0 || count > 2 || input.len() < count {
            return Err(Error::MalformedSignature("unsupported length encoding"));
        }
        let (bytes, after) = input.split_at(count);
        input = after;
        let len = bytes
            .iter()
            .fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte));
        if len < 0x80 || (count == 2 && len < 0x100) {
            return Err(Error::MalformedSignature("non-minimal length encoding"));
        }
        len
    };

    if input.len() < len {
        return Err(Error::MalformedSignature("length exceeds input"));
    }
    let (body, rest) = input.split_at(len);

    Ok((tag, body, rest))
}

fn read_integer(input: &[u8]) -> Result<(&[u8], &[u8])> {
    let (tag, body, rest) = read_tlv(input)?;
    if tag != TAG_INTEGER {
        return Err(Error::MalformedSignature("expected DER integer"));
    }
    match body.first() {
        None => Err(Error::MalformedSignature("empty integer")),
        Some(byte) if byte & 0x80 != 0 => Err(Error::MalformedSignature("negative integer")),
        Some(_) => Ok((body, rest)),
    }
}

fn copy_left_padded(integer: &[u8], out: &mut [u8]) -> Result<()> {
    let integer = strip_leading_zeros(integer);
    if integer.len() > out.len() {
        return Err(Error::MalformedSignature("integer exceeds field size"));
    }
    let offset = out.len() - integer.len();
    out[offset..].copy_from_slice(integer);

    Ok(())
}

fn write_integer(out: &mut Vec<u8>, integer: &[u8]) {
    let integer = strip_leading_zeros(integer);
    out.push(TAG_INTEGER);
    match integer.first() {
        None => {
            out.push(1);
            out.push(0);
        }
        Some(byte) if byte & 0x80 != 0 => {
            write_length(out, integer.len() + 1);
            out.push(0);
            out.extend_from_slice(integer);
        }
        Some(_) => {
            write_length(out, integer.len());
            out.extend_from_slice(integer);
        }
    }
}

fn write_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x100 {
        out.push(0x81);
        out.push(len as u8);
    } else {
        out.push(0x82);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    }
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|byte| *byte != 0)
        .unwrap_or(bytes.len());
    &bytes[start..]
}
