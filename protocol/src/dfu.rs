//! DFU firmware images
//!
//! The bootloader consumes a sequence of blocks, each one preceded by a 64 byte header giving
//! its load address and length. The whole file ends with a standard DFU 1.1 suffix carrying
//! the USB ids of the target device and a CRC over everything before it.

use std::collections::{BTreeMap, BTreeSet};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use crc::{Crc, CRC_32_JAMCRC};
use thiserror::Error;

use crate::util::{TryBuf, TryBufError};

/// Alignment and granularity of image blocks
pub const BLOCK_SIZE: u32 = 256;

/// Value filling the gaps within a block
pub const PAD_VALUE: u8 = 0xff;

/// Size of the header preceding each block
pub const BLOCK_HEADER_LEN: usize = 64;

/// Block header format version
pub const BLOCK_HEADER_VERSION: u32 = 1;

/// DFU specification release implemented by the suffix
pub const BCD_DFU: u16 = 0x0100;

pub const SUFFIX_SIGNATURE: &[u8; 3] = b"UFD";

pub const SUFFIX_LEN: usize = 16;

// The suffix CRC is the reflected CRC-32 without the final inversion
const CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_JAMCRC);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DfuError {
    #[error("address 0x{address:08x} is written more than once")]
    Overlap { address: u32 },

    #[error("data at 0x{address:08x} runs past the end of the address space")]
    AddressOverflow { address: u32 },

    #[error("file is {len} bytes long, too short to hold a DFU suffix")]
    TooShort { len: usize },

    #[error("bad DFU suffix signature: {0:02x?}")]
    BadSignature([u8; 3]),

    #[error("unsupported DFU suffix length: {0}")]
    BadLength(u8),

    #[error("DFU suffix CRC mismatch, expected: 0x{expected:08x}, got: 0x{actual:08x}")]
    CrcMismatch { expected: u32, actual: u32 },

    #[error("truncated DFU suffix: {0}")]
    Truncated(#[from] TryBufError),
}

/// Sparse view of the target's flash contents
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryImage {
    bytes: BTreeMap<u32, u8>,
}

/// A contiguous, block aligned range of the image
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub address: u32,
    pub data: Bytes,
}

impl MemoryImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes explicitly written
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Stores `data` starting at `address`, rejecting writes to already written locations.
    ///
    /// A rejected write leaves the image untouched.
    pub fn write(&mut self, address: u32, data: &[u8]) -> Result<(), DfuError> {
        if data.len() as u64 + address as u64 > u32::MAX as u64 + 1 {
            return Err(DfuError::AddressOverflow { address });
        }
        if data.is_empty() {
            return Ok(());
        }

        let end = address + (data.len() - 1) as u32;
        if let Some((&address, _)) = self.bytes.range(address..=end).next() {
            return Err(DfuError::Overlap { address });
        }

        for (offset, &b) in data.iter().enumerate() {
            self.bytes.insert(address + offset as u32, b);
        }
        Ok(())
    }

    /// Groups the written bytes into [`BLOCK_SIZE`] aligned blocks, merging adjacent ones and
    /// padding the gaps with [`PAD_VALUE`]
    pub fn blocks(&self) -> Vec<Block> {
        let pages: BTreeSet<u32> = self.bytes.keys().map(|addr| addr / BLOCK_SIZE).collect();

        let mut runs: Vec<(u32, u32)> = Vec::new();
        for page in pages {
            match runs.last_mut() {
                Some((_, last)) if *last + 1 == page => *last = page,
                _ => runs.push((page, page)),
            }
        }

        runs.into_iter()
            .map(|(first, last)| {
                let start = first as u64 * BLOCK_SIZE as u64;
                let end = (last as u64 + 1) * BLOCK_SIZE as u64;
                let mut data = vec![PAD_VALUE; (end - start) as usize];
                for (&addr, &b) in self.bytes.range(start as u32..=(end - 1) as u32) {
                    data[(addr as u64 - start) as usize] = b;
                }

                log::trace!("block at 0x{:08x}, {} bytes", start, data.len());
                Block {
                    address: start as u32,
                    data: data.into(),
                }
            })
            .collect()
    }
}

/// Serializes blocks, each one preceded by its header
pub fn build_image(blocks: &[Block]) -> Bytes {
    let total = blocks
        .iter()
        .map(|b| BLOCK_HEADER_LEN + b.data.len())
        .sum();
    let mut buf = BytesMut::with_capacity(total);

    for block in blocks {
        buf.put_u32_le(BLOCK_HEADER_VERSION);
        buf.put_u32_le(block.address);
        buf.put_u32_le(block.data.len() as u32);
        buf.put_bytes(0, BLOCK_HEADER_LEN - 12);
        buf.extend_from_slice(&block.data);
    }

    buf.freeze()
}

/// USB ids recorded in the DFU suffix
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DfuSuffix {
    pub bcd_device: u16,
    pub product_id: u16,
    pub vendor_id: u16,
}

impl DfuSuffix {
    /// Appends the suffix to `image`
    pub fn append<T: AsRef<[u8]>>(&self, image: T) -> Bytes {
        let image = image.as_ref();
        let mut buf = BytesMut::with_capacity(image.len() + SUFFIX_LEN);
        buf.extend_from_slice(image);
        buf.put_u16_le(self.bcd_device);
        buf.put_u16_le(self.product_id);
        buf.put_u16_le(self.vendor_id);
        buf.put_u16_le(BCD_DFU);
        buf.extend_from_slice(SUFFIX_SIGNATURE);
        buf.put_u8(SUFFIX_LEN as u8);
        let crc = CRC.checksum(&buf);
        buf.put_u32_le(crc);
        buf.freeze()
    }

    /// Verifies and strips the suffix, returning it along with the image
    pub fn parse(file: Bytes) -> Result<(Self, Bytes), DfuError> {
        if file.len() < SUFFIX_LEN {
            return Err(DfuError::TooShort { len: file.len() });
        }

        let split = file.len() - SUFFIX_LEN;
        let mut suffix = file.slice(split..);
        let bcd_device = suffix.read_u16_le()?;
        let product_id = suffix.read_u16_le()?;
        let vendor_id = suffix.read_u16_le()?;
        let _bcd_dfu = suffix.read_u16_le()?;

        let mut signature = [0u8; 3];
        suffix.ensure_remaining(signature.len())?;
        suffix.copy_to_slice(&mut signature);
        if &signature != SUFFIX_SIGNATURE {
            return Err(DfuError::BadSignature(signature));
        }

        let len = suffix.read_u8()?;
        if len as usize != SUFFIX_LEN {
            return Err(DfuError::BadLength(len));
        }

        let actual = suffix.read_u32_le()?;
        let expected = CRC.checksum(&file[..file.len() - 4]);
        if expected != actual {
            return Err(DfuError::CrcMismatch { expected, actual });
        }

        Ok((
            Self {
                bcd_device,
                product_id,
                vendor_id,
            },
            file.slice(..split),
        ))
    }
}
