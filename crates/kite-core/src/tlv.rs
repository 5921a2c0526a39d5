//! NDN TLV primitives
//!
//! Just enough of the NDN packet format to encode and decode the mobility
//! protocol payloads: VAR-NUMBER type/length fields, NonNegativeInteger
//! values, and Name blocks.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::name::Name;

/// TLV type numbers used by the mobility protocol
pub mod types {
    pub const NAME: u64 = 7;
    pub const GENERIC_NAME_COMPONENT: u64 = 8;
    pub const APPLICATION_PARAMETERS: u64 = 36;
    pub const EXPIRATION_PERIOD: u64 = 109;
}

/// Encoded size of a VAR-NUMBER
pub fn var_number_len(n: u64) -> usize {
    match n {
        0..=252 => 1,
        253..=0xFFFF => 3,
        0x1_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}

/// Write a VAR-NUMBER
pub fn put_var_number(buf: &mut impl BufMut, n: u64) {
    match n {
        0..=252 => buf.put_u8(n as u8),
        253..=0xFFFF => {
            buf.put_u8(253);
            buf.put_u16(n as u16);
        }
        0x1_0000..=0xFFFF_FFFF => {
            buf.put_u8(254);
            buf.put_u32(n as u32);
        }
        _ => {
            buf.put_u8(255);
            buf.put_u64(n);
        }
    }
}

/// Read a VAR-NUMBER
pub fn get_var_number(buf: &mut impl Buf) -> Result<u64, ProtocolError> {
    ensure(buf, 1)?;
    let first = buf.get_u8();
    let width = match first {
        253 => 2,
        254 => 4,
        255 => 8,
        _ => return Ok(u64::from(first)),
    };
    ensure(buf, width)?;
    Ok(match width {
        2 => u64::from(buf.get_u16()),
        4 => u64::from(buf.get_u32()),
        _ => buf.get_u64(),
    })
}

/// Encoded size of a NonNegativeInteger value
pub fn nonneg_integer_len(n: u64) -> usize {
    match n {
        0..=0xFF => 1,
        0x100..=0xFFFF => 2,
        0x1_0000..=0xFFFF_FFFF => 4,
        _ => 8,
    }
}

/// Write a NonNegativeInteger value (no type or length)
pub fn put_nonneg_integer(buf: &mut impl BufMut, n: u64) {
    match nonneg_integer_len(n) {
        1 => buf.put_u8(n as u8),
        2 => buf.put_u16(n as u16),
        4 => buf.put_u32(n as u32),
        _ => buf.put_u64(n),
    }
}

/// Decode a NonNegativeInteger value
pub fn read_nonneg_integer(mut value: &[u8]) -> Result<u64, ProtocolError> {
    match value.len() {
        1 => Ok(u64::from(value.get_u8())),
        2 => Ok(u64::from(value.get_u16())),
        4 => Ok(u64::from(value.get_u32())),
        8 => Ok(value.get_u64()),
        other => Err(ProtocolError::InvalidInteger(other)),
    }
}

/// Write a complete TLV block
pub fn put_block(buf: &mut impl BufMut, tlv_type: u64, value: &[u8]) {
    put_var_number(buf, tlv_type);
    put_var_number(buf, value.len() as u64);
    buf.put_slice(value);
}

/// Write a NonNegativeInteger block
pub fn put_nonneg_integer_block(buf: &mut impl BufMut, tlv_type: u64, n: u64) {
    put_var_number(buf, tlv_type);
    put_var_number(buf, nonneg_integer_len(n) as u64);
    put_nonneg_integer(buf, n);
}

/// Split the next TLV block off `buf`, returning its type and value
pub fn take_block(buf: &mut Bytes) -> Result<(u64, Bytes), ProtocolError> {
    let tlv_type = get_var_number(buf)?;
    let length = get_var_number(buf)? as usize;
    ensure(buf, length)?;
    Ok((tlv_type, buf.split_to(length)))
}

/// Split off the next block and require it to be of `expected` type
pub fn expect_block(buf: &mut Bytes, expected: u64) -> Result<Bytes, ProtocolError> {
    let (actual, value) = take_block(buf)?;
    if actual != expected {
        return Err(ProtocolError::UnexpectedType { expected, actual });
    }
    Ok(value)
}

/// Encode a Name block
pub fn put_name(buf: &mut BytesMut, name: &Name) {
    let mut value = BytesMut::new();
    for component in name.components() {
        put_block(&mut value, types::GENERIC_NAME_COMPONENT, component.as_bytes());
    }
    put_block(buf, types::NAME, &value);
}

/// Decode the value of a Name block
pub fn read_name(mut value: Bytes) -> Result<Name, ProtocolError> {
    let mut name = Name::root();
    while value.has_remaining() {
        let component = expect_block(&mut value, types::GENERIC_NAME_COMPONENT)?;
        let component =
            String::from_utf8(component.to_vec()).map_err(|_| ProtocolError::InvalidComponent)?;
        name.push(component);
    }
    Ok(name)
}

fn ensure(buf: &impl Buf, needed: usize) -> Result<(), ProtocolError> {
    if buf.remaining() < needed {
        return Err(ProtocolError::Truncated {
            expected: needed,
            actual: buf.remaining(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_number_boundaries() {
        for (n, len) in [(0u64, 1), (252, 1), (253, 3), (0xFFFF, 3), (0x1_0000, 5), (1 << 40, 9)] {
            let mut buf = BytesMut::new();
            put_var_number(&mut buf, n);
            assert_eq!(buf.len(), len);
            assert_eq!(var_number_len(n), len);
            assert_eq!(get_var_number(&mut buf.freeze()).unwrap(), n);
        }
    }

    #[test]
    fn test_nonneg_integer_widths() {
        assert_eq!(read_nonneg_integer(&[0x01]).unwrap(), 1);
        assert_eq!(read_nonneg_integer(&[0x03, 0xE8]).unwrap(), 1000);
        assert_eq!(
            read_nonneg_integer(&[0x00, 0x04, 0x93, 0xE0]).unwrap(),
            300_000
        );
        assert_eq!(
            read_nonneg_integer(&[0, 1, 2]),
            Err(ProtocolError::InvalidInteger(3))
        );
    }

    #[test]
    fn test_name_block_layout() {
        let mut buf = BytesMut::new();
        put_name(&mut buf, &Name::parse("/rv/mp").unwrap());

        // 07 08 | 08 02 'r' 'v' | 08 02 'm' 'p'
        assert_eq!(
            &buf[..],
            &[0x07, 0x08, 0x08, 0x02, b'r', b'v', 0x08, 0x02, b'm', b'p']
        );

        let mut wire = buf.freeze();
        let value = expect_block(&mut wire, types::NAME).unwrap();
        assert_eq!(read_name(value).unwrap().to_string(), "/rv/mp");
    }

    #[test]
    fn test_truncated_block() {
        let mut wire = Bytes::from_static(&[0x07, 0x05, 0x08]);
        assert_eq!(
            take_block(&mut wire),
            Err(ProtocolError::Truncated {
                expected: 5,
                actual: 1
            })
        );
    }

    #[test]
    fn test_unexpected_type() {
        let mut wire = Bytes::from_static(&[0x08, 0x00]);
        assert_eq!(
            expect_block(&mut wire, types::NAME),
            Err(ProtocolError::UnexpectedType {
                expected: 7,
                actual: 8
            })
        );
    }
}
