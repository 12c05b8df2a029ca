//! Apple PackBits: a stride-parameterised run-length codec. `stride` is the
//! width in bytes of the unit being repeated or copied literally -- 1 for
//! byte runs (most pixel planes), 2 for 16-bit word runs (555 RGB scanlines).

use libcommon::Reader;

use crate::resources::{Error, Result};

/// Decompresses exactly `len` compressed bytes read from `reader`, producing
/// the expanded byte stream. Stops once `len` compressed bytes have been
/// consumed, regardless of whether that lands mid-opcode (a truncated
/// trailing opcode is an error).
pub fn decompress(reader: &mut Reader<'_>, stride: usize, len: usize) -> Result<Vec<u8>> {
    decompress_bytes(&reader.read_bytes(len)?, stride)
}

/// Decompresses an in-memory compressed buffer.
pub fn decompress_bytes(input: &[u8], stride: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    while pos < input.len() {
        let n = input[pos] as i8;
        pos += 1;
        if n >= 0 {
            let count = (n as usize + 1) * stride;
            let end = pos + count;
            if end > input.len() {
                return Err(Error::PackbitsTruncated);
            }
            out.extend_from_slice(&input[pos..end]);
            pos = end;
        } else if n == -128 {
            // no-op
        } else {
            let repeat = 1 - i32::from(n);
            let end = pos + stride;
            if end > input.len() {
                return Err(Error::PackbitsTruncated);
            }
            let unit = &input[pos..end];
            for _ in 0..repeat {
                out.extend_from_slice(unit);
            }
            pos = end;
        }
    }
    Ok(out)
}

/// Compresses `data` (a byte sequence whose length is a multiple of
/// `stride`) into alternating PackBits runs.
#[must_use]
pub fn compress(data: &[u8], stride: usize) -> Vec<u8> {
    assert!(stride > 0 && data.len() % stride == 0, "data must be a whole number of stride-sized units");
    let units = data.len() / stride;
    let unit = |i: usize| &data[i * stride..(i + 1) * stride];

    let mut out = Vec::new();
    let mut i = 0usize;
    while i < units {
        let mut run = 1usize;
        while i + run < units && unit(i + run) == unit(i) && run < 128 {
            run += 1;
        }
        if run >= 2 {
            out.push((1i32 - run as i32) as i8 as u8);
            out.extend_from_slice(unit(i));
            i += run;
        } else {
            let lit_start = i;
            let mut lit_len = 1usize;
            i += 1;
            while i < units && lit_len < 128 {
                if i + 1 < units && unit(i) == unit(i + 1) {
                    break;
                }
                lit_len += 1;
                i += 1;
            }
            out.push((lit_len - 1) as u8);
            out.extend_from_slice(&data[lit_start * stride..(lit_start + lit_len) * stride]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s2_compresses_to_the_documented_bytes() {
        let input = [0xAA, 0xAA, 0xAA, 0xAA, 0x01, 0x02];
        let compressed = compress(&input, 1);
        assert_eq!(compressed, [0xFD, 0xAA, 0x01, 0x01, 0x02]);
        assert_eq!(decompress_bytes(&compressed, 1).unwrap(), input);
    }

    #[test]
    fn compress_then_decompress_round_trips_arbitrary_bytes() {
        let input: Vec<u8> = (0..=255u8).chain(std::iter::repeat(7).take(40)).collect();
        let compressed = compress(&input, 1);
        assert_eq!(decompress_bytes(&compressed, 1).unwrap(), input);
    }

    #[test]
    fn stride_two_round_trips_word_runs() {
        let input: Vec<u8> = vec![0x12, 0x34, 0x12, 0x34, 0x12, 0x34, 0x56, 0x78];
        let compressed = compress(&input, 2);
        assert_eq!(decompress_bytes(&compressed, 2).unwrap(), input);
    }

    #[test]
    fn no_op_opcode_is_skipped() {
        let input = [0x80u8, 0x00];
        assert_eq!(decompress_bytes(&input, 1).unwrap(), vec![0]);
    }

    #[test]
    fn truncated_repeat_payload_is_an_error() {
        let input = [0xFFu8];
        assert!(matches!(decompress_bytes(&input, 1), Err(Error::PackbitsTruncated)));
    }

    #[test]
    fn isolated_final_byte_is_a_one_byte_literal() {
        let input = [5u8];
        let compressed = compress(&input, 1);
        assert_eq!(compressed, [0x00, 5]);
    }
}
