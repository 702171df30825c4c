//! Functions for framing and unframing descriptor blobs, and computing their checksums
//!
//! The checksum is a two byte running sum modulo 251, validated by the firmware at boot in
//! order to detect corrupted or truncated tables.
use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Modulus of both running sums
pub const MODULUS: u16 = 251;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChecksumError {
    #[error("blob is {len} bytes long, too short to hold a checksum")]
    TooShort { len: usize },

    #[error("checksum mismatch, expected: {expected:02x?}, got: {actual:02x?}")]
    Mismatch { expected: [u8; 2], actual: [u8; 2] },
}

/// Computes the `[c0, c1]` checksum of the given data
pub fn checksum<T: AsRef<[u8]>>(data: T) -> [u8; 2] {
    let (c0, c1) = data
        .as_ref()
        .iter()
        .fold((1u16, 0u16), |(c0, c1), &b| {
            let c0 = (c0 + b as u16) % MODULUS;
            (c0, (c1 + c0) % MODULUS)
        });
    [c0 as u8, c1 as u8]
}

/// Appends the checksum to the given data
pub fn frame<T: AsRef<[u8]>>(data: T) -> Bytes {
    let data = data.as_ref();
    let mut buf = BytesMut::with_capacity(data.len() + 2);
    buf.extend_from_slice(data);
    buf.put_slice(&checksum(data));
    buf.freeze()
}

/// Verifies the trailing checksum and returns the data without it
pub fn unframe(framed: Bytes) -> Result<Bytes, ChecksumError> {
    if framed.len() < 2 {
        return Err(ChecksumError::TooShort { len: framed.len() });
    }

    let split = framed.len() - 2;
    let expected = checksum(&framed[..split]);
    let actual = [framed[split], framed[split + 1]];
    if expected != actual {
        return Err(ChecksumError::Mismatch { expected, actual });
    }

    Ok(framed.slice(..split))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn frame_test() {
        let framed = frame([0x00u8]);
        assert_eq!(
            framed[..],
            [0x00, 0x01, 0x01],
            "c0 stays at its initial value, c1 picks it up once"
        );

        let framed = frame([0x01u8, 0x02]);
        assert_eq!(framed[..], [0x01, 0x02, 0x04, 0x06]);
    }

    #[test]
    fn sums_wrap_at_251() {
        // 1 + 250 wraps c0 back to 0
        assert_eq!(checksum([0xfau8]), [0x00, 0x00]);
        assert_eq!(checksum([0xfau8, 0x01]), [0x01, 0x01]);
        assert_eq!(checksum([0xffu8]), [0x05, 0x05]);
    }

    #[test]
    fn empty_data() {
        assert_eq!(frame([0u8; 0])[..], [0x01, 0x00]);
        assert_eq!(unframe(frame([0u8; 0])).unwrap().len(), 0);
    }

    #[test]
    fn unframe_test() {
        let data = Bytes::from_static(&[0x01, 0x09, 0x3d, 0x7f, 0x32, 0x00, 0x80]);
        let framed = frame(&data);
        assert_eq!(unframe(framed).unwrap(), data);

        assert_eq!(
            unframe(Bytes::from_static(&[0x01])),
            Err(ChecksumError::TooShort { len: 1 })
        );
    }

    #[test]
    fn corruption_is_detected() {
        let data: Vec<u8> = (0u8..64).map(|x| x.wrapping_mul(37)).collect();
        let framed = frame(&data);

        for i in 0..data.len() {
            let mut corrupted = framed.to_vec();
            corrupted[i] ^= 0x5a;
            assert!(
                matches!(
                    unframe(Bytes::from(corrupted)),
                    Err(ChecksumError::Mismatch { .. })
                ),
                "flipping bits of byte {i} should be detected"
            );
        }
    }
}
