/// Byte order chosen per `serialize`/`deserialize` call. `Host` defers to the
/// target's native order — use it only for in-process framing, never for
/// anything that crosses the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
    Host,
}

macro_rules! endian_codec {
    ($name:ident, $ty:ty) => {
        impl Endian {
            #[inline]
            pub fn $name(self, v: $ty) -> [u8; std::mem::size_of::<$ty>()] {
                match self {
                    Endian::Little => v.to_le_bytes(),
                    Endian::Big => v.to_be_bytes(),
                    Endian::Host => v.to_ne_bytes(),
                }
            }
        }
    };
}

endian_codec!(encode_u8, u8);
endian_codec!(encode_u16, u16);
endian_codec!(encode_u32, u32);
endian_codec!(encode_u64, u64);
endian_codec!(encode_i8, i8);
endian_codec!(encode_i16, i16);
endian_codec!(encode_i32, i32);
endian_codec!(encode_i64, i64);

impl Endian {
    #[inline]
    pub fn decode_u8(self, b: [u8; 1]) -> u8 {
        u8::from_ne_bytes(b)
    }

    #[inline]
    pub fn decode_u16(self, b: [u8; 2]) -> u16 {
        match self {
            Endian::Little => u16::from_le_bytes(b),
            Endian::Big => u16::from_be_bytes(b),
            Endian::Host => u16::from_ne_bytes(b),
        }
    }

    #[inline]
    pub fn decode_u32(self, b: [u8; 4]) -> u32 {
        match self {
            Endian::Little => u32::from_le_bytes(b),
            Endian::Big => u32::from_be_bytes(b),
            Endian::Host => u32::from_ne_bytes(b),
        }
    }

    #[inline]
    pub fn decode_u64(self, b: [u8; 8]) -> u64 {
        match self {
            Endian::Little => u64::from_le_bytes(b),
            Endian::Big => u64::from_be_bytes(b),
            Endian::Host => u64::from_ne_bytes(b),
        }
    }

    #[inline]
    pub fn decode_i8(self, b: [u8; 1]) -> i8 {
        i8::from_ne_bytes(b)
    }

    #[inline]
    pub fn decode_i16(self, b: [u8; 2]) -> i16 {
        match self {
            Endian::Little => i16::from_le_bytes(b),
            Endian::Big => i16::from_be_bytes(b),
            Endian::Host => i16::from_ne_bytes(b),
        }
    }

    #[inline]
    pub fn decode_i32(self, b: [u8; 4]) -> i32 {
        match self {
            Endian::Little => i32::from_le_bytes(b),
            Endian::Big => i32::from_be_bytes(b),
            Endian::Host => i32::from_ne_bytes(b),
        }
    }

    #[inline]
    pub fn decode_i64(self, b: [u8; 8]) -> i64 {
        match self {
            Endian::Little => i64::from_le_bytes(b),
            Endian::Big => i64::from_be_bytes(b),
            Endian::Host => i64::from_ne_bytes(b),
        }
    }
}

/// Floats are bit-cast to their same-width integer, byte-swapped as an
/// integer, never converted arithmetically.
#[inline]
pub fn f32_to_bits_endian(endian: Endian, v: f32) -> [u8; 4] {
    endian.encode_u32(v.to_bits())
}

#[inline]
pub fn bits_to_f32_endian(endian: Endian, b: [u8; 4]) -> f32 {
    f32::from_bits(endian.decode_u32(b))
}

#[inline]
pub fn f64_to_bits_endian(endian: Endian, v: f64) -> [u8; 8] {
    endian.encode_u64(v.to_bits())
}

#[inline]
pub fn bits_to_f64_endian(endian: Endian, b: [u8; 8]) -> f64 {
    f64::from_bits(endian.decode_u64(b))
}
