//! Reads byte tables back out of rendered C source
//!
//! Accepts both the bare rows and the full array declaration: every `0x` prefixed token is
//! taken as one byte, everything else is skipped.

use bytes::Bytes;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CSourceError {
    #[error("line {line}: invalid byte literal {token:?}")]
    InvalidByte { line: usize, token: String },

    #[error("no byte literals found")]
    Empty,
}

/// Collects the hex byte literals of a C table, in order
pub fn parse(text: &str) -> Result<Bytes, CSourceError> {
    let mut data = Vec::new();

    for (index, line) in text.lines().enumerate() {
        // Comments may contain anything
        let line = line.split("//").next().unwrap_or_default();
        let tokens = line
            .split(|c: char| c == ',' || c == '{' || c == '}' || c.is_whitespace())
            .filter(|token| token.starts_with("0x") || token.starts_with("0X"));

        for token in tokens {
            let byte = u8::from_str_radix(&token[2..], 16).map_err(|_| {
                CSourceError::InvalidByte {
                    line: index + 1,
                    token: token.to_owned(),
                }
            })?;
            data.push(byte);
        }
    }

    if data.is_empty() {
        return Err(CSourceError::Empty);
    }
    Ok(data.into())
}
