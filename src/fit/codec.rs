//! Extraction of single numeric values from data-message fields.
//!
//! FIT fields declare a base type and a byte size. The size may exceed the
//! type's natural width (array fields) — only the first scalar is read, the
//! caller still advances by the declared size — or undercut it, in which case
//! nothing is read at all. Strings, byte arrays, and 64-bit integers are
//! never decoded: 64-bit values cannot round-trip through `f64` without
//! precision loss, so they are dropped rather than silently mangled.

/// Read one numeric value at `offset`.
///
/// `base_type` carries the type code in its low five bits; the `0x80` array
/// flag and any reserved bits are ignored. Returns `None` for unsupported
/// types, for reads that would overrun the declared size or the buffer, and
/// for values holding the base type's "invalid" sentinel (all-ones for plain
/// integers, zero for the `*z` variants, non-finite floats).
pub fn read_value(
    buf: &[u8],
    offset: usize,
    declared_size: u8,
    base_type: u8,
    little_endian: bool,
) -> Option<f64> {
    let code = base_type & 0x1F;

    match code {
        // enum / uint8
        0 | 2 => read_bytes::<1>(buf, offset, declared_size)
            .map(|b| b[0])
            .filter(|&v| v != u8::MAX)
            .map(f64::from),
        1 => read_bytes::<1>(buf, offset, declared_size)
            .map(|b| b[0] as i8)
            .filter(|&v| v != i8::MAX)
            .map(f64::from),
        3 => read_bytes::<2>(buf, offset, declared_size)
            .map(|b| endian(b, little_endian, i16::from_le_bytes, i16::from_be_bytes))
            .filter(|&v| v != i16::MAX)
            .map(f64::from),
        4 => read_bytes::<2>(buf, offset, declared_size)
            .map(|b| endian(b, little_endian, u16::from_le_bytes, u16::from_be_bytes))
            .filter(|&v| v != u16::MAX)
            .map(f64::from),
        5 => read_bytes::<4>(buf, offset, declared_size)
            .map(|b| endian(b, little_endian, i32::from_le_bytes, i32::from_be_bytes))
            .filter(|&v| v != i32::MAX)
            .map(f64::from),
        6 => read_bytes::<4>(buf, offset, declared_size)
            .map(|b| endian(b, little_endian, u32::from_le_bytes, u32::from_be_bytes))
            .filter(|&v| v != u32::MAX)
            .map(f64::from),
        8 => read_bytes::<4>(buf, offset, declared_size)
            .map(|b| endian(b, little_endian, f32::from_le_bytes, f32::from_be_bytes))
            .filter(|v| v.is_finite())
            .map(f64::from),
        9 => read_bytes::<8>(buf, offset, declared_size)
            .map(|b| endian(b, little_endian, f64::from_le_bytes, f64::from_be_bytes))
            .filter(|v| v.is_finite()),
        // uint8z
        10 => read_bytes::<1>(buf, offset, declared_size)
            .map(|b| b[0])
            .filter(|&v| v != 0)
            .map(f64::from),
        // uint16z
        11 => read_bytes::<2>(buf, offset, declared_size)
            .map(|b| endian(b, little_endian, u16::from_le_bytes, u16::from_be_bytes))
            .filter(|&v| v != 0)
            .map(f64::from),
        // uint32z
        12 => read_bytes::<4>(buf, offset, declared_size)
            .map(|b| endian(b, little_endian, u32::from_le_bytes, u32::from_be_bytes))
            .filter(|&v| v != 0)
            .map(f64::from),
        // string (7), byte array (13), 64-bit integers (14/15/16), unknown
        _ => None,
    }
}

fn read_bytes<const N: usize>(buf: &[u8], offset: usize, declared_size: u8) -> Option<[u8; N]> {
    if (declared_size as usize) < N {
        return None;
    }
    let slice = buf.get(offset..offset + N)?;
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(slice);
    Some(bytes)
}

fn endian<T, const N: usize>(
    bytes: [u8; N],
    little_endian: bool,
    le: fn([u8; N]) -> T,
    be: fn([u8; N]) -> T,
) -> T {
    if little_endian { le(bytes) } else { be(bytes) }
}
