//! The arithmetic request/response framings from the toolkit's external
//! interface section: a deliberately tiny wire protocol that exercises the
//! codec's field sequence, endianness-per-call, and CRC framing all at
//! once. None of this is part of PTK's core — it's the frozen demo PDU
//! `ptk-codec` is specified against.

use ptk::codec::{CRC8_ARITHMETIC, CRC16_MODBUS, CodecError, Endian, Field, FieldMut, decode_framed, encode_framed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    const fn wire(self) -> u8 {
        match self {
            Op::Add => 1,
            Op::Sub => 2,
            Op::Mul => 3,
            Op::Div => 4,
        }
    }

    fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Op::Add),
            2 => Some(Op::Sub),
            3 => Some(Op::Mul),
            4 => Some(Op::Div),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add" | "+" => Some(Op::Add),
            "sub" | "-" => Some(Op::Sub),
            "mul" | "*" => Some(Op::Mul),
            "div" | "/" => Some(Op::Div),
            _ => None,
        }
    }

    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Op::Add => a + b,
            Op::Sub => a - b,
            Op::Mul => a * b,
            Op::Div => a / b,
        }
    }
}

/// `u8 op | f32 operand1 | f32 operand2 | u16 crc16`, all big-endian; CRC16
/// (`0xA001`, init `0xFFFF`, reflected) over the preceding 9 bytes.
pub const REQUEST_WIRE_LEN: usize = 1 + 4 + 4 + 2;

#[derive(Debug, Clone, Copy)]
pub struct Request {
    pub op: Op,
    pub a: f32,
    pub b: f32,
}

impl Request {
    pub fn encode(self, out: &mut [u8]) -> Result<usize, CodecError> {
        let mut cursor = ptk::buffer::CursorMut::new(out);
        let before = cursor.len();
        encode_framed(
            &mut cursor,
            Endian::Big,
            &[Field::U8(self.op.wire()), Field::F32(self.a), Field::F32(self.b)],
            CRC16_MODBUS,
        )?;
        Ok(before - cursor.len())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut op_byte = 0u8;
        let mut a = 0f32;
        let mut b = 0f32;
        let mut cursor = ptk::buffer::Cursor::new(bytes);
        decode_framed(
            &mut cursor,
            Endian::Big,
            &mut [FieldMut::U8(&mut op_byte), FieldMut::F32(&mut a), FieldMut::F32(&mut b)],
            CRC16_MODBUS,
        )?;
        let op = Op::from_wire(op_byte).ok_or(CodecError::Unsupported)?;
        Ok(Request { op, a, b })
    }
}

/// `u8 ~op | f64 result | u8 crc8`, all little-endian; CRC8 (`0x07`, init
/// `0xFF`, not reflected) over the preceding 9 bytes.
pub const RESPONSE_WIRE_LEN: usize = 1 + 8 + 1;

#[derive(Debug, Clone, Copy)]
pub struct Response {
    pub inverted_op: u8,
    pub result: f64,
}

impl Response {
    pub fn for_request(req: &Request, result: f64) -> Self {
        Response { inverted_op: !req.op.wire(), result }
    }

    pub fn encode(self, out: &mut [u8]) -> Result<usize, CodecError> {
        let mut cursor = ptk::buffer::CursorMut::new(out);
        let before = cursor.len();
        encode_framed(
            &mut cursor,
            Endian::Little,
            &[Field::U8(self.inverted_op), Field::F64(self.result)],
            CRC8_ARITHMETIC,
        )?;
        Ok(before - cursor.len())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut inverted_op = 0u8;
        let mut result = 0f64;
        let mut cursor = ptk::buffer::Cursor::new(bytes);
        decode_framed(
            &mut cursor,
            Endian::Little,
            &mut [FieldMut::U8(&mut inverted_op), FieldMut::F64(&mut result)],
            CRC8_ARITHMETIC,
        )?;
        Ok(Response { inverted_op, result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_round_trips_exact_wire_bytes() {
        let req = Request { op: Op::Add, a: 5.0, b: 3.0 };
        let mut buf = [0u8; REQUEST_WIRE_LEN];
        let written = req.encode(&mut buf).unwrap();
        assert_eq!(written, REQUEST_WIRE_LEN);
        assert_eq!(&buf[..9], &[0x01, 0x40, 0xA0, 0x00, 0x00, 0x40, 0x40, 0x00, 0x00]);

        let decoded = Request::decode(&buf).unwrap();
        assert_eq!(decoded.op, Op::Add);
        assert_eq!(decoded.a, 5.0);
        assert_eq!(decoded.b, 3.0);
    }

    #[test]
    fn corrupted_request_fails_checksum() {
        let req = Request { op: Op::Add, a: 5.0, b: 3.0 };
        let mut buf = [0u8; REQUEST_WIRE_LEN];
        req.encode(&mut buf).unwrap();
        buf[0] ^= 0xFF;
        assert_eq!(Request::decode(&buf), Err(CodecError::ChecksumFailed));
    }

    #[test]
    fn response_inverts_opcode_and_round_trips() {
        let req = Request { op: Op::Add, a: 5.0, b: 3.0 };
        let resp = Response::for_request(&req, 8.0);
        assert_eq!(resp.inverted_op, 0xFE);

        let mut buf = [0u8; RESPONSE_WIRE_LEN];
        resp.encode(&mut buf).unwrap();
        let decoded = Response::decode(&buf).unwrap();
        assert_eq!(decoded.inverted_op, 0xFE);
        assert_eq!(decoded.result, 8.0);
    }
}
