//! Bit/byte stream primitives (spec.md §4.1).
//!
//! Grounded on `BufReaderExtension` in the teacher (fixed-width
//! little-endian byte reads over a `BufReader`), generalized here to
//! arbitrary bit widths with MSB-first ordering, since EXI packs
//! variable-width fields at the bit level rather than the byte level.

mod reader;
mod writer;

pub use reader::BitReader;
pub use writer::BitWriter;

/// A caller-supplied pull function for streaming reads: writes as many
/// bytes as it can into `buf` and returns the count written. Returning
/// `0` means no more data is currently available.
pub type FillFn<'a> = Box<dyn FnMut(&mut [u8]) -> usize + 'a>;

/// A caller-supplied push function for streaming writes: consumes as
/// many bytes as it can from `buf` and returns the count consumed. A
/// short write (less than `buf.len()`) is a `BufferEndReached` failure
/// per spec.md §4.1.
pub type DrainFn<'a> = Box<dyn FnMut(&[u8]) -> usize + 'a>;

#[cfg(test)]
mod roundtrip_tests {
    use super::*;
    use crate::error::ExiError;

    #[test]
    fn bit_roundtrip_all_widths() {
        for n in 0u32..=64 {
            let max: u128 = if n == 0 { 0 } else { (1u128 << n) - 1 };
            // Sample a handful of values per width rather than every one
            // for n close to 64 (quantified invariant, spec.md §8).
            let samples: Vec<u64> = if n <= 16 {
                (0..=max).map(|v| v as u64).collect()
            } else {
                vec![0, 1, max as u64, (max / 2) as u64, (max / 3) as u64]
            };
            for v in samples {
                let mut writer = BitWriter::new();
                writer.write_bits(v, n).unwrap();
                let bytes = writer.finish().unwrap();
                let mut reader = BitReader::new(&bytes);
                let got = reader.read_bits(n).unwrap();
                assert_eq!(got, v, "n={n} v={v}");
                assert_eq!(reader.bit_position(), n as u64);
            }
        }
    }

    #[test]
    fn zero_width_read_and_write_are_no_ops() {
        let mut writer = BitWriter::new();
        writer.write_bits(0xFF, 0).unwrap();
        assert_eq!(writer.bit_position(), 0);
        let bytes = writer.finish().unwrap();
        assert!(bytes.is_empty());

        let mut reader = BitReader::new(&[0xAB]);
        assert_eq!(reader.read_bits(0).unwrap(), 0);
        assert_eq!(reader.bit_position(), 0);
    }

    #[test]
    fn cross_byte_span_assembles_in_stream_order() {
        // 0b1010_1100 0b1111_0000 -> read 4 bits then 8 bits
        let bytes = [0b1010_1100u8, 0b1111_0000u8];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(reader.read_bits(4).unwrap(), 0b1010);
        assert_eq!(reader.read_bits(8).unwrap(), 0b1100_1111);
        assert_eq!(reader.read_bits(4).unwrap(), 0b0000);
    }

    #[test]
    fn read_past_end_is_buffer_end_reached() {
        let mut reader = BitReader::new(&[0xFF]);
        reader.read_bits(8).unwrap();
        let err = reader.read_bits(1).unwrap_err();
        assert!(matches!(err, ExiError::BufferEndReached { .. }));
    }

    #[test]
    fn write_flushes_through_drain_when_full() {
        let drained = std::cell::RefCell::new(Vec::<u8>::new());
        let mut writer = BitWriter::with_capacity(1, Some(Box::new(|b: &[u8]| {
            drained.borrow_mut().extend_from_slice(b);
            b.len()
        })));
        writer.write_bits(0xAB, 8).unwrap();
        writer.write_bits(0xCD, 8).unwrap();
        let tail = writer.finish().unwrap();
        let mut all = drained.borrow().clone();
        all.extend_from_slice(&tail);
        assert_eq!(all, vec![0xAB, 0xCD]);
    }

    #[test]
    fn partial_drain_fails_as_buffer_end_reached() {
        let mut writer = BitWriter::with_capacity(1, Some(Box::new(|b: &[u8]| b.len() - 1)));
        writer.write_bits(0xAB, 8).unwrap();
        let err = writer.write_bits(0xCD, 8).unwrap_err();
        assert!(matches!(err, ExiError::BufferEndReached { .. }));
    }

    #[test]
    fn trailing_bits_of_final_byte_are_zero() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3).unwrap();
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes, vec![0b1010_0000]);
    }

    #[test]
    fn align_to_byte_skips_remaining_bits() {
        let bytes = [0b1111_0000u8, 0b1010_1010u8];
        let mut reader = BitReader::new(&bytes);
        reader.read_bits(4).unwrap();
        reader.align_to_byte();
        assert_eq!(reader.read_bits(8).unwrap(), 0b1010_1010);
    }

    #[test]
    fn fill_callback_extends_reader_buffer() {
        let remaining = std::cell::RefCell::new(vec![0x02u8]);
        let mut reader = BitReader::with_fill(&[0x01], Some(Box::new(move |buf: &mut [u8]| {
            let mut r = remaining.borrow_mut();
            let n = r.len().min(buf.len());
            buf[..n].copy_from_slice(&r[..n]);
            r.drain(..n);
            n
        })));
        assert_eq!(reader.read_bits(8).unwrap(), 0x01);
        assert_eq!(reader.read_bits(8).unwrap(), 0x02);
    }
}
