//! Intel HEX firmware images

use ihex::{Reader, ReaderError, Record};
use shupito_protocol::dfu::{DfuError, MemoryImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IhexError {
    #[error("invalid Intel HEX record: {0}")]
    Parse(#[from] ReaderError),

    #[error("{0}")]
    Image(#[from] DfuError),
}

/// Loads the data records of an Intel HEX file into a memory image
pub fn load(text: &str) -> Result<MemoryImage, IhexError> {
    let mut image = MemoryImage::new();
    let mut base = 0u32;

    for record in Reader::new(text) {
        match record? {
            Record::Data { offset, value } => {
                image.write(base.wrapping_add(offset as u32), &value)?;
            }
            Record::ExtendedSegmentAddress(segment) => base = (segment as u32) << 4,
            Record::ExtendedLinearAddress(upper) => base = (upper as u32) << 16,
            Record::EndOfFile => break,
            Record::StartSegmentAddress { .. } | Record::StartLinearAddress(_) => {}
        }
    }

    log::debug!("loaded {} bytes of firmware", image.len());
    Ok(image)
}
