//! Input file formats
pub mod c_source;
pub mod ihex;
