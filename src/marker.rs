//! Fixed byte signatures that delimit frame payloads.
//!
//! `ffmpeg -f image2pipe -vcodec png` writes PNG files back to back with no
//! container around them. Every PNG starts with the same 8-byte signature and
//! ends with an empty `IEND` chunk, whose 12 bytes (zero length, tag, CRC) are
//! also constant. Those two [`Marker`]s are all the scanner needs to cut the
//! stream into frames.

/// A fixed-length byte sequence searched for in a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Marker<const N: usize>([u8; N]);

/// PNG file signature. Starts every frame payload.
pub const PNG_START: Marker<8> = Marker::new([0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

/// Empty `IEND` chunk: length 0, tag `IEND`, CRC `AE 42 60 82`. Ends every
/// frame payload.
pub const PNG_END: Marker<12> = Marker::new([
    0x00, 0x00, 0x00, 0x00, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82,
]);

/// Outcome of a marker search over a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerSearch {
    /// The marker starts at this offset.
    Found(usize),
    /// The marker is not in the buffer yet. After more bytes are appended,
    /// searching again from `resume_at` finds a marker that straddles the old
    /// end of the buffer without rescanning earlier bytes.
    NeedMore {
        /// First offset that could still begin a match.
        resume_at: usize,
    },
}

impl<const N: usize> Marker<N> {
    /// Wrap a byte array.
    pub const fn new(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    /// Length of the marker in bytes.
    pub const fn len(&self) -> usize {
        N
    }

    /// Always `false` for the markers used by this crate; present for
    /// symmetry with [`len`](Marker::len).
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// The raw marker bytes.
    pub const fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// Whether the marker occurs in `bytes` exactly at `offset`.
    pub fn matches_at(&self, bytes: &[u8], offset: usize) -> bool {
        bytes
            .get(offset..offset + N)
            .is_some_and(|window| window == self.0)
    }

    /// Find the leftmost occurrence of the marker in `haystack` at or after
    /// `from`.
    pub fn find(&self, haystack: &[u8], from: usize) -> MarkerSearch {
        if let Some(tail) = haystack.get(from..) {
            if let Some(position) = tail.windows(N).position(|window| window == self.0) {
                return MarkerSearch::Found(from + position);
            }
        }
        let resume_at = haystack.len().saturating_sub(N.saturating_sub(1)).max(from);
        MarkerSearch::NeedMore { resume_at }
    }
}

impl<const N: usize> AsRef<[u8]> for Marker<N> {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{MarkerSearch, PNG_END, PNG_START};

    #[test]
    fn finds_leftmost_occurrence() {
        let mut haystack = vec![0xFF; 5];
        haystack.extend_from_slice(PNG_START.as_bytes());
        haystack.extend_from_slice(PNG_START.as_bytes());
        assert_eq!(PNG_START.find(&haystack, 0), MarkerSearch::Found(5));
        assert_eq!(PNG_START.find(&haystack, 6), MarkerSearch::Found(13));
    }

    #[test]
    fn resume_offset_keeps_partial_match_reachable() {
        let haystack = [1, 2, 3, 0, 0, 0, 0, b'I', b'E'];
        assert_eq!(
            PNG_END.find(&haystack, 0),
            MarkerSearch::NeedMore { resume_at: 0 }
        );

        let long = vec![7u8; 40];
        assert_eq!(
            PNG_END.find(&long, 0),
            MarkerSearch::NeedMore { resume_at: 29 }
        );
        assert_eq!(
            PNG_END.find(&long, 35),
            MarkerSearch::NeedMore { resume_at: 35 }
        );
    }

    #[test]
    fn search_past_end_is_not_a_panic() {
        assert_eq!(
            PNG_START.find(&[0x89, b'P'], 10),
            MarkerSearch::NeedMore { resume_at: 10 }
        );
    }

    #[test]
    fn matches_at_checks_bounds() {
        let bytes = PNG_END.as_bytes();
        assert!(PNG_END.matches_at(bytes, 0));
        assert!(!PNG_END.matches_at(bytes, 1));
        assert!(!PNG_START.matches_at(bytes, 0));
    }
}
