use bytes::{Buf, Bytes};
use thiserror::Error;
use uuid::Uuid;

macro_rules! try_def {
    ($meth:ident, $ty:ty) => {
        fn $meth(&mut self) -> Result<$ty, TryBufError>;
    };
}

macro_rules! try_impl {
    ($meth:ident, $inner:ident, $ty:ty, $len:literal) => {
        fn $meth(&mut self) -> Result<$ty, TryBufError> {
            self.ensure_remaining($len)?;
            Ok(self.$inner())
        }
    };
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TryBufError {
    #[error("invalid read length, remaining: {remaining}, required: {required}")]
    InvalidLength { remaining: usize, required: usize },
}

/// Fallible counterparts of the [`Buf`] getters, returning an error instead of panicking
/// when the buffer is too short.
///
/// Named `read_*` so they don't collide with the `try_get_*` getters of newer `bytes` releases.
pub trait TryBuf {
    fn ensure_remaining(&self, required: usize) -> Result<(), TryBufError>;

    try_def!(read_u8, u8);
    try_def!(read_u16_le, u16);
    try_def!(read_u32_le, u32);
    try_def!(read_uuid, Uuid);

    fn read_bytes(&mut self, len: usize) -> Result<Bytes, TryBufError>;
}

impl<T> TryBuf for T
where
    T: Buf,
{
    fn ensure_remaining(&self, required: usize) -> Result<(), TryBufError> {
        if self.remaining() < required {
            Err(TryBufError::InvalidLength {
                remaining: self.remaining(),
                required,
            })
        } else {
            Ok(())
        }
    }

    try_impl!(read_u8, get_u8, u8, 1);
    try_impl!(read_u16_le, get_u16_le, u16, 2);
    try_impl!(read_u32_le, get_u32_le, u32, 4);

    fn read_uuid(&mut self) -> Result<Uuid, TryBufError> {
        self.ensure_remaining(16)?;
        let mut raw = [0u8; 16];
        self.copy_to_slice(&mut raw);
        Ok(Uuid::from_bytes(raw))
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes, TryBufError> {
        self.ensure_remaining(len)?;
        Ok(self.copy_to_bytes(len))
    }
}
