mod try_buf;
pub use try_buf::{TryBuf, TryBufError};
