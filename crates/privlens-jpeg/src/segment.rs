//! Segment walker
//!
//! A JPEG stream is `FF D8`, then `FF <marker> [len_hi len_lo payload]` segments up to
//! start-of-scan, then entropy-coded data to `FF D9`. The walker splits the header
//! region into borrowed segments and keeps everything from start-of-scan on as an
//! opaque tail, so concatenating SOI + segments + tail reproduces the input exactly.

use tracing::{debug, warn};

use crate::error::{JpegError, Result};

pub const SOI: [u8; 2] = [0xFF, 0xD8];

pub const MARKER_APP1: u8 = 0xE1;
pub const MARKER_APP2: u8 = 0xE2;
pub const MARKER_APP13: u8 = 0xED;
pub const MARKER_COM: u8 = 0xFE;
pub const MARKER_SOS: u8 = 0xDA;
pub const MARKER_EOI: u8 = 0xD9;

pub const EXIF_SIGNATURE: &[u8] = b"Exif\0\0";
pub const XMP_SIGNATURE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
pub const IPTC_SIGNATURE: &[u8] = b"Photoshop 3.0\0";
pub const ICC_SIGNATURE: &[u8] = b"ICC_PROFILE\0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Exif,
    Xmp,
    Iptc,
    Icc,
    Comment,
    Other,
}

/// One header segment, borrowed from the input including its `FF <marker>` prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub marker: u8,
    pub bytes: &'a [u8],
}

impl<'a> Segment<'a> {
    /// Whether the segment carries a length field
    pub fn has_length(&self) -> bool {
        self.bytes.len() >= 4
    }

    /// Declared length (including the two length bytes)
    pub fn length(&self) -> Option<u16> {
        self.has_length()
            .then(|| u16::from_be_bytes([self.bytes[2], self.bytes[3]]))
    }

    pub fn payload(&self) -> &'a [u8] {
        if self.has_length() { &self.bytes[4..] } else { &[] }
    }

    pub fn kind(&self) -> SegmentKind {
        let payload = self.payload();
        match self.marker {
            MARKER_APP1 if payload.starts_with(EXIF_SIGNATURE) => SegmentKind::Exif,
            MARKER_APP1 if payload.starts_with(XMP_SIGNATURE) => SegmentKind::Xmp,
            MARKER_APP13 if payload.starts_with(IPTC_SIGNATURE) => SegmentKind::Iptc,
            MARKER_APP2 if payload.starts_with(ICC_SIGNATURE) => SegmentKind::Icc,
            MARKER_COM => SegmentKind::Comment,
            _ => SegmentKind::Other,
        }
    }
}

/// Header segments plus the verbatim remainder of the stream
#[derive(Debug, Clone)]
pub struct JpegLayout<'a> {
    pub segments: Vec<Segment<'a>>,
    pub tail: &'a [u8],
}

fn is_standalone(marker: u8) -> bool {
    matches!(marker, 0x01 | 0xD0..=0xD7)
}

impl<'a> JpegLayout<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if !data.starts_with(&SOI) {
            return Err(JpegError::MissingStartOfImage);
        }

        let mut segments = Vec::new();
        let mut offset = SOI.len();

        while offset < data.len() {
            let rest = &data[offset..];
            if rest[0] != 0xFF || rest.len() < 2 {
                warn!(offset, "expected marker; copying remainder verbatim");
                return Ok(Self { segments, tail: rest });
            }

            let marker = rest[1];
            match marker {
                MARKER_SOS | MARKER_EOI => {
                    return Ok(Self { segments, tail: rest });
                }
                // fill byte before the next marker
                0xFF => {
                    segments.push(Segment { marker, bytes: &rest[..1] });
                    offset += 1;
                    continue;
                }
                m if is_standalone(m) => {
                    segments.push(Segment { marker, bytes: &rest[..2] });
                    offset += 2;
                    continue;
                }
                _ => {}
            }

            if rest.len() < 4 {
                warn!(offset, "segment header truncated; copying remainder verbatim");
                return Ok(Self { segments, tail: rest });
            }
            let length = usize::from(u16::from_be_bytes([rest[2], rest[3]]));
            if length < 2 || 2 + length > rest.len() {
                warn!(offset, length, "segment length out of bounds; copying remainder verbatim");
                return Ok(Self { segments, tail: rest });
            }

            debug!(offset, marker = format_args!("{marker:#04X}"), length, "segment");
            segments.push(Segment {
                marker,
                bytes: &rest[..2 + length],
            });
            offset += 2 + length;
        }

        Ok(Self {
            segments,
            tail: &data[data.len()..],
        })
    }

    pub fn find(&self, kind: SegmentKind) -> impl Iterator<Item = &Segment<'a>> {
        self.segments.iter().filter(move |s| s.kind() == kind)
    }

    /// Reassemble SOI + every segment + tail
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            SOI.len() + self.segments.iter().map(|s| s.bytes.len()).sum::<usize>() + self.tail.len(),
        );
        out.extend_from_slice(&SOI);
        for segment in &self.segments {
            out.extend_from_slice(segment.bytes);
        }
        out.extend_from_slice(self.tail);
        out
    }
}

/// Encode a length-prefixed segment
pub fn encode_segment(marker: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let length = payload.len() + 2;
    if length > usize::from(u16::MAX) {
        return Err(JpegError::SegmentTooLarge(length));
    }
    let mut out = Vec::with_capacity(length + 2);
    out.extend_from_slice(&[0xFF, marker]);
    out.extend_from_slice(&(length as u16).to_be_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(marker: u8, payload: &[u8]) -> Vec<u8> {
        encode_segment(marker, payload).unwrap()
    }

    fn cat(parts: &[&[u8]]) -> Vec<u8> {
        parts.concat()
    }

    fn jpeg(segments: &[Vec<u8>]) -> Vec<u8> {
        let mut data = SOI.to_vec();
        for s in segments {
            data.extend_from_slice(s);
        }
        data.extend_from_slice(&[0xFF, MARKER_SOS, 0x00, 0x02, 0x12, 0x34, 0xFF, 0x00, 0x56]);
        data.extend_from_slice(&[0xFF, MARKER_EOI]);
        data
    }

    #[test]
    fn test_rejects_non_jpeg() {
        assert_eq!(
            JpegLayout::parse(b"\x89PNG\r\n").unwrap_err(),
            JpegError::MissingStartOfImage
        );
    }

    #[test]
    fn test_classifies_segments() {
        let xmp = cat(&[XMP_SIGNATURE, b"<x:xmpmeta/>"]);
        let iptc = cat(&[IPTC_SIGNATURE, b"8BIM"]);
        let icc = cat(&[ICC_SIGNATURE, &[1, 1], b"profile"]);
        let data = jpeg(&[
            app(0xE0, b"JFIF\0\x01\x01"),
            app(MARKER_APP1, &xmp),
            app(MARKER_APP13, &iptc),
            app(MARKER_APP2, &icc),
            app(MARKER_COM, b"hello"),
        ]);

        let layout = JpegLayout::parse(&data).unwrap();
        let kinds: Vec<_> = layout.segments.iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SegmentKind::Other,
                SegmentKind::Xmp,
                SegmentKind::Iptc,
                SegmentKind::Icc,
                SegmentKind::Comment
            ]
        );
        assert!(layout.tail.starts_with(&[0xFF, MARKER_SOS]));
    }

    #[test]
    fn test_reassembly_is_byte_exact() {
        let data = jpeg(&[app(0xE0, b"JFIF\0"), app(0xDB, &[0u8; 65])]);
        let layout = JpegLayout::parse(&data).unwrap();
        assert_eq!(layout.to_bytes(), data);
    }

    #[test]
    fn test_signature_must_be_at_payload_start() {
        let shifted = cat(&[b"x", XMP_SIGNATURE]);
        let data = jpeg(&[app(MARKER_APP1, &shifted)]);
        let layout = JpegLayout::parse(&data).unwrap();
        assert_eq!(layout.segments[0].kind(), SegmentKind::Other);
    }

    #[test]
    fn test_bad_length_keeps_remainder() {
        let mut data = SOI.to_vec();
        data.extend_from_slice(&[0xFF, 0xE1, 0x10, 0x00, 0x01, 0x02]);
        let layout = JpegLayout::parse(&data).unwrap();
        assert!(layout.segments.is_empty());
        assert_eq!(layout.to_bytes(), data);
    }

    #[test]
    fn test_standalone_and_fill_markers() {
        let mut data = SOI.to_vec();
        data.extend_from_slice(&[0xFF, 0xFF, 0xD0]);
        data.extend_from_slice(&app(MARKER_COM, b"c"));
        data.extend_from_slice(&[0xFF, MARKER_EOI]);

        let layout = JpegLayout::parse(&data).unwrap();
        assert_eq!(layout.segments.len(), 3);
        assert_eq!(layout.segments[2].kind(), SegmentKind::Comment);
        assert_eq!(layout.to_bytes(), data);
    }

    #[test]
    fn test_encode_segment_rejects_oversize() {
        let payload = vec![0u8; 65534];
        assert_eq!(
            encode_segment(MARKER_APP1, &payload).unwrap_err(),
            JpegError::SegmentTooLarge(65536)
        );
    }
}
