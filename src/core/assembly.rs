//! Audio segment assembly.
//!
//! Block audio is produced one node at a time, then stitched into a single
//! deliverable by raw byte concatenation in node order. No re-encoding
//! happens here; the provider returns every segment in the same encoding,
//! and players tolerate concatenated MP3 frames.

use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur during audio assembly.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssemblyError {
    /// There are no segments to assemble.
    #[error("no audio segments to assemble")]
    NoSegments,

    /// A segment contains no audio data.
    #[error("audio segment {0} is empty")]
    EmptySegment(usize),
}

/// Concatenates audio segments into one buffer, preserving order.
///
/// Every segment must be non-empty; an empty segment means synthesis
/// silently produced nothing and the result would be missing narration.
pub fn concat_segments(segments: &[Bytes]) -> Result<Bytes, AssemblyError> {
    if segments.is_empty() {
        return Err(AssemblyError::NoSegments);
    }
    for (index, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            return Err(AssemblyError::EmptySegment(index));
        }
    }

    let total: usize = segments.iter().map(|s| s.len()).sum();
    let mut combined = vec![0u8; total];
    let mut offset = 0;
    for segment in segments {
        combined[offset..offset + segment.len()].copy_from_slice(segment);
        offset += segment.len();
    }
    Ok(Bytes::from(combined))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_preserves_order() {
        let segments = vec![
            Bytes::from_static(b"first"),
            Bytes::from_static(b"-second"),
            Bytes::from_static(b"-third"),
        ];
        let combined = concat_segments(&segments).unwrap();
        assert_eq!(combined, Bytes::from_static(b"first-second-third"));
    }

    #[test]
    fn test_single_segment_passes_through() {
        let segments = vec![Bytes::from_static(b"only")];
        assert_eq!(
            concat_segments(&segments).unwrap(),
            Bytes::from_static(b"only")
        );
    }

    #[test]
    fn test_no_segments_is_an_error() {
        assert_eq!(concat_segments(&[]), Err(AssemblyError::NoSegments));
    }

    #[test]
    fn test_empty_segment_is_an_error() {
        let segments = vec![
            Bytes::from_static(b"audio"),
            Bytes::new(),
            Bytes::from_static(b"more"),
        ];
        assert_eq!(
            concat_segments(&segments),
            Err(AssemblyError::EmptySegment(1))
        );
    }

    #[test]
    fn test_total_length_is_sum_of_segments() {
        let segments = vec![Bytes::from(vec![1u8; 100]), Bytes::from(vec![2u8; 250])];
        let combined = concat_segments(&segments).unwrap();
        assert_eq!(combined.len(), 350);
        assert_eq!(combined[99], 1);
        assert_eq!(combined[100], 2);
    }
}
