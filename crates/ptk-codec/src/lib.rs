//! Type-directed, endianness-aware serialization over a cursor, plus
//! CRC-protected framing helpers.
//!
//! `serialize`/`deserialize` are the two entry points: each takes a slice of
//! [`Field`]/[`FieldMut`] tags and a cursor, and either commits every field or
//! none of them. Composite types (nested records, length-dependent arrays,
//! optional fields, tagged unions) are expressed by hand against the
//! [`Wire`] trait rather than as additional `Field` variants — see that
//! trait's docs.

mod address;
mod crc;
mod endian;
mod error;
mod field;
mod wire;

pub use address::{Address, AddressFamily};
pub use crc::{CRC8_ARITHMETIC, CRC16_MODBUS, CrcParams};
pub use endian::{Endian, bits_to_f32_endian, bits_to_f64_endian, f32_to_bits_endian, f64_to_bits_endian};
pub use error::CodecError;
pub use field::{Field, FieldMut};
use ptk_buffer::{Cursor, CursorMut};
pub use wire::Wire;

/// Sum of the encoded width of every field, used to size the scratch buffer
/// `serialize` commits through.
#[must_use]
pub fn size_of_fields(fields: &[Field<'_>]) -> usize {
    fields.iter().map(Field::size).sum()
}

/// Encodes `fields` in order and appends the result to `cursor` as a single
/// atomic write: either every field's bytes land, or `cursor` is left
/// exactly as it was.
pub fn serialize(cursor: &mut CursorMut<'_>, endian: Endian, fields: &[Field<'_>]) -> Result<(), CodecError> {
    let total = size_of_fields(fields);
    let mut scratch = vec![0u8; total];
    let mut w = CursorMut::new(&mut scratch);
    for field in fields {
        write_field(&mut w, endian, field)?;
    }
    cursor.put(&scratch)?;
    Ok(())
}

fn write_field(w: &mut CursorMut<'_>, endian: Endian, field: &Field<'_>) -> Result<(), CodecError> {
    match field {
        Field::U8(v) => w.put(&endian.encode_u8(*v))?,
        Field::U16(v) => w.put(&endian.encode_u16(*v))?,
        Field::U32(v) => w.put(&endian.encode_u32(*v))?,
        Field::U64(v) => w.put(&endian.encode_u64(*v))?,
        Field::I8(v) => w.put(&endian.encode_i8(*v))?,
        Field::I16(v) => w.put(&endian.encode_i16(*v))?,
        Field::I32(v) => w.put(&endian.encode_i32(*v))?,
        Field::I64(v) => w.put(&endian.encode_i64(*v))?,
        Field::F32(v) => w.put(&f32_to_bits_endian(endian, *v))?,
        Field::F64(v) => w.put(&f64_to_bits_endian(endian, *v))?,
        Field::Bytes(b) => w.put(b)?,
        Field::CStr { s, max_len } => {
            let body_len = (s.len()).min(max_len.saturating_sub(1));
            w.put(&s.as_bytes()[..body_len])?;
            w.put(&[0u8])?;
        }
        Field::Custom(inner) => {
            let mut buf = Vec::with_capacity(inner.size());
            inner.write(&mut buf, endian)?;
            w.put(&buf)?;
        }
    }
    Ok(())
}

/// Decodes `fields` in order from `cursor`. On success, `cursor` is advanced
/// past the consumed bytes unless `peek` is set, in which case it is left
/// untouched. On any failure `cursor` is never modified, even partially.
pub fn deserialize(cursor: &mut Cursor<'_>, peek: bool, endian: Endian, fields: &mut [FieldMut<'_>]) -> Result<(), CodecError> {
    let mut working = *cursor;
    let start_len = working.len();
    for field in fields.iter_mut() {
        read_field(&mut working, endian, field)?;
    }
    if !peek {
        let consumed = start_len - working.len();
        cursor.take(consumed)?;
    }
    Ok(())
}

fn read_field(r: &mut Cursor<'_>, endian: Endian, field: &mut FieldMut<'_>) -> Result<(), CodecError> {
    match field {
        FieldMut::U8(out) => **out = endian.decode_u8(r.take(1)?.try_into().unwrap()),
        FieldMut::U16(out) => **out = endian.decode_u16(r.take(2)?.try_into().unwrap()),
        FieldMut::U32(out) => **out = endian.decode_u32(r.take(4)?.try_into().unwrap()),
        FieldMut::U64(out) => **out = endian.decode_u64(r.take(8)?.try_into().unwrap()),
        FieldMut::I8(out) => **out = endian.decode_i8(r.take(1)?.try_into().unwrap()),
        FieldMut::I16(out) => **out = endian.decode_i16(r.take(2)?.try_into().unwrap()),
        FieldMut::I32(out) => **out = endian.decode_i32(r.take(4)?.try_into().unwrap()),
        FieldMut::I64(out) => **out = endian.decode_i64(r.take(8)?.try_into().unwrap()),
        FieldMut::F32(out) => **out = bits_to_f32_endian(endian, r.take(4)?.try_into().unwrap()),
        FieldMut::F64(out) => **out = bits_to_f64_endian(endian, r.take(8)?.try_into().unwrap()),
        FieldMut::Bytes(buf) => buf.copy_from_slice(r.take(buf.len())?),
        FieldMut::CStr { buf, len, max_len } => {
            let cap = (*max_len).min(buf.len() + 1).min(r.len());
            let peeked = r.peek(cap)?;
            let nul = peeked.iter().position(|&b| b == 0).ok_or(CodecError::ParseError("unterminated CStr"))?;
            if nul > buf.len() {
                return Err(CodecError::ParseError("CStr exceeds destination buffer"));
            }
            let consumed = r.take(nul + 1)?;
            buf[..nul].copy_from_slice(&consumed[..nul]);
            **len = nul;
        }
        FieldMut::Custom(inner) => inner.read(r, endian)?,
    }
    Ok(())
}

/// Serializes `fields`, then appends a trailing checksum of `crc` over the
/// just-written bytes (not including the checksum itself).
pub fn encode_framed(
    cursor: &mut CursorMut<'_>,
    endian: Endian,
    fields: &[Field<'_>],
    crc: CrcParams,
) -> Result<(), CodecError> {
    let total = size_of_fields(fields);
    let mut scratch = vec![0u8; total];
    let mut w = CursorMut::new(&mut scratch);
    for field in fields {
        write_field(&mut w, endian, field)?;
    }
    let checksum = crc.compute(&scratch);
    let mut framed = scratch;
    if crc.width <= 8 {
        framed.push(checksum as u8);
    } else {
        framed.extend_from_slice(&endian.encode_u16(checksum));
    }
    cursor.put(&framed)?;
    Ok(())
}

/// Decodes `fields` from the front of `cursor`, then verifies the trailing
/// checksum. Never advances `cursor` on checksum or field failure.
///
/// Requires every field to have a length known ahead of parsing (scalars,
/// fixed `Bytes`, `Custom`); a variable-length `CStr` field cannot appear in
/// a framed message since the checksum boundary must be computable before
/// any byte is decoded.
pub fn decode_framed(
    cursor: &mut Cursor<'_>,
    endian: Endian,
    fields: &mut [FieldMut<'_>],
    crc: CrcParams,
) -> Result<(), CodecError> {
    let body_len = size_of_fields_mut(fields);
    let crc_len = if crc.width <= 8 { 1 } else { 2 };
    let frame = cursor.peek(body_len + crc_len)?;
    let (body, trailer) = frame.split_at(body_len);
    let expected = crc.compute(body);
    let actual = if crc.width <= 8 { u16::from(trailer[0]) } else { endian.decode_u16(trailer.try_into().unwrap()) };
    if expected != actual {
        return Err(CodecError::ChecksumFailed);
    }
    deserialize(cursor, false, endian, fields)?;
    cursor.take(crc_len)?;
    Ok(())
}

fn size_of_fields_mut(fields: &[FieldMut<'_>]) -> usize {
    fields
        .iter()
        .map(|f| match f {
            FieldMut::U8(_) | FieldMut::I8(_) => 1,
            FieldMut::U16(_) | FieldMut::I16(_) => 2,
            FieldMut::U32(_) | FieldMut::I32(_) | FieldMut::F32(_) => 4,
            FieldMut::U64(_) | FieldMut::I64(_) | FieldMut::F64(_) => 8,
            FieldMut::Bytes(b) => b.len(),
            FieldMut::CStr { .. } => 0,
            FieldMut::Custom(inner) => inner.size(),
        })
        .sum()
}
