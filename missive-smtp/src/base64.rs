//! Standard base64 (RFC 4648 §4) with `=` padding and no line wrapping.
//!
//! Callers that need wrapped output (MIME bodies) split the encoded string
//! themselves.

use std::sync::OnceLock;

use thiserror::Error;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const PAD: u8 = b'=';

/// Decode table entry for `=` and every byte outside the alphabet.
pub const INVALID: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Base64 input length {0} is not a multiple of 4")]
    InvalidLength(usize),

    #[error("Invalid base64 symbol 0x{byte:02x} at offset {offset}")]
    InvalidSymbol { offset: usize, byte: u8 },

    #[error("Non-canonical base64 padding")]
    InvalidPadding,
}

fn decode_table() -> &'static [u8; 256] {
    static TABLE: OnceLock<[u8; 256]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [INVALID; 256];
        for (value, &symbol) in (0u8..).zip(ALPHABET.iter()) {
            table[usize::from(symbol)] = value;
        }
        table
    })
}

/// Build the decode table now rather than on the first [`decode`].
pub fn init() {
    let _ = decode_table();
}

/// Length of the encoding of `len` input bytes.
pub const fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

pub fn encode(data: &[u8]) -> String {
    let mut encoded = String::with_capacity(encoded_len(data.len()));

    for chunk in data.chunks(3) {
        let b0 = chunk[0];
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);

        encoded.push(char::from(ALPHABET[usize::from(b0 >> 2)]));
        encoded.push(char::from(
            ALPHABET[usize::from(((b0 & 0x03) << 4) | (b1 >> 4))],
        ));

        if chunk.len() > 1 {
            encoded.push(char::from(
                ALPHABET[usize::from(((b1 & 0x0F) << 2) | (b2 >> 6))],
            ));
        } else {
            encoded.push(char::from(PAD));
        }

        if chunk.len() > 2 {
            encoded.push(char::from(ALPHABET[usize::from(b2 & 0x3F)]));
        } else {
            encoded.push(char::from(PAD));
        }
    }

    encoded
}

/// Decode padded base64.
///
/// # Errors
/// Fails on the first problem: a length that is not a multiple of 4, a
/// symbol outside the alphabet (including `=` anywhere but the final one or
/// two positions), or non-canonical padding: three `=`, or padding that
/// hides non-zero bits.
pub fn decode(input: &str) -> Result<Vec<u8>, DecodeError> {
    let input = input.as_bytes();

    if input.len() % 4 != 0 {
        return Err(DecodeError::InvalidLength(input.len()));
    }

    let table = decode_table();
    let mut decoded = Vec::with_capacity(input.len() / 4 * 3);
    let quanta = input.len() / 4;

    for (index, quantum) in input.chunks_exact(4).enumerate() {
        let offset = index * 4;
        let last = index + 1 == quanta;

        let padding = if last {
            match quantum {
                [_, PAD, PAD, PAD] => return Err(DecodeError::InvalidPadding),
                [.., PAD, PAD] => 2,
                [.., PAD] => 1,
                _ => 0,
            }
        } else {
            0
        };

        let mut values = [0u8; 4];
        for (position, (&byte, value)) in quantum
            .iter()
            .zip(values.iter_mut())
            .enumerate()
            .take(4 - padding)
        {
            *value = table[usize::from(byte)];
            if *value == INVALID {
                return Err(DecodeError::InvalidSymbol {
                    offset: offset + position,
                    byte,
                });
            }
        }

        let [v0, v1, v2, v3] = values;
        decoded.push((v0 << 2) | (v1 >> 4));

        match padding {
            0 => {
                decoded.push((v1 << 4) | (v2 >> 2));
                decoded.push((v2 << 6) | v3);
            }
            1 => {
                if v2 & 0x03 != 0 {
                    return Err(DecodeError::InvalidPadding);
                }
                decoded.push((v1 << 4) | (v2 >> 2));
            }
            _ => {
                if v1 & 0x0F != 0 {
                    return Err(DecodeError::InvalidPadding);
                }
            }
        }
    }

    Ok(decoded)
}
