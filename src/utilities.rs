//! Internal utility functions.

use std::fmt::Write;

const BYTES_PER_ROW: usize = 16;

/// Render `bytes` as a hex dump, 16 bytes per row.
///
/// Each row starts with the offset split into its high and low 32-bit
/// halves, e.g. `00000000 00000010: 00 01 02 ...`. `base` is added to every
/// offset so a slice from the middle of a payload shows its real position.
pub fn hex_dump(bytes: &[u8], base: usize) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(BYTES_PER_ROW) * 68);
    for (row, chunk) in bytes.chunks(BYTES_PER_ROW).enumerate() {
        let offset = (base + row * BYTES_PER_ROW) as u64;
        let _ = write!(out, "{:08x} {:08x}:", offset >> 32, offset & 0xffff_ffff);
        for byte in chunk {
            let _ = write!(out, " {byte:02x}");
        }
        out.push('\n');
    }
    out
}

/// Hex dump of the first and last `edge` bytes of a payload.
pub(crate) fn payload_edges(payload: &[u8], edge: usize) -> String {
    if payload.len() <= edge * 2 {
        return hex_dump(payload, 0);
    }
    let tail_start = payload.len() - edge;
    format!(
        "{}...\n{}",
        hex_dump(&payload[..edge], 0),
        hex_dump(&payload[tail_start..], tail_start),
    )
}

#[cfg(test)]
mod tests {
    use super::{hex_dump, payload_edges};

    #[test]
    fn hex_dump_rows() {
        let bytes: Vec<u8> = (0..20).collect();
        let dump = hex_dump(&bytes, 0);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "00000000 00000000: 00 01 02 03 04 05 06 07 08 09 0a 0b 0c 0d 0e 0f"
        );
        assert_eq!(lines[1], "00000000 00000010: 10 11 12 13");
    }

    #[test]
    fn hex_dump_empty() {
        assert!(hex_dump(&[], 0).is_empty());
    }

    #[test]
    fn payload_edges_keeps_offsets() {
        let bytes = vec![0xAB; 100];
        let dump = payload_edges(&bytes, 16);
        assert!(dump.contains("00000000 00000054:"));
        assert!(dump.contains("..."));
    }
}
