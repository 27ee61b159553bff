//! Built-in tag reader for JPEG files

use privlens_core::{Container, Tag};
use tracing::warn;

use crate::error::Result;
use crate::redact::COMMENT_CONTAINER;
use crate::segment::{EXIF_SIGNATURE, ICC_SIGNATURE, IPTC_SIGNATURE, JpegLayout, SegmentKind, XMP_SIGNATURE};
use crate::tags::{THUMBNAIL_FIELD, tag_name};
use crate::tiff::{ExifDirectory, IfdGroup};

/// Decode every metadata element the redactor can act on, keyed the way
/// [`crate::Selection::from_keys`] expects.
pub fn read_tags(data: &[u8]) -> Result<Vec<Tag>> {
    let layout = JpegLayout::parse(data)?;
    let mut tags = Vec::new();

    for segment in &layout.segments {
        let payload = segment.payload();
        match segment.kind() {
            SegmentKind::Exif => match ExifDirectory::parse(&payload[EXIF_SIGNATURE.len()..]) {
                Ok(directory) => directory_tags(&directory, &mut tags),
                Err(err) => warn!(%err, "skipping unreadable tag directory"),
            },
            SegmentKind::Xmp => {
                let packet = String::from_utf8_lossy(&payload[XMP_SIGNATURE.len()..]);
                tags.push(Tag::new(Container::Xmp, "Packet", packet.trim_matches('\0').trim()));
            }
            SegmentKind::Iptc => {
                let size = payload.len() - IPTC_SIGNATURE.len();
                tags.push(Tag::new(Container::Iptc, "Photoshop", format!("{size} bytes")));
            }
            SegmentKind::Icc => {
                if let Some(summary) = icc_summary(&payload[ICC_SIGNATURE.len()..]) {
                    tags.push(Tag::new(Container::Icc, "Profile", summary));
                }
            }
            SegmentKind::Comment => {
                let text = String::from_utf8_lossy(payload);
                tags.push(Tag::new(
                    Container::Other(COMMENT_CONTAINER.to_string()),
                    "Comment",
                    text.trim_matches('\0').trim(),
                ));
            }
            SegmentKind::Other => {}
        }
    }

    Ok(tags)
}

fn directory_tags(directory: &ExifDirectory, tags: &mut Vec<Tag>) {
    let groups = [
        (IfdGroup::Primary, Container::Exif),
        (IfdGroup::Exif, Container::Exif),
        (IfdGroup::Interop, Container::Exif),
        (IfdGroup::Gps, Container::Gps),
    ];
    for (group, container) in groups {
        for entry in directory.entries(group) {
            tags.push(Tag::new(
                container.clone(),
                &tag_name(group, entry.tag),
                entry.display(directory.order),
            ));
        }
    }

    if let Some(thumbnail) = directory.thumbnail() {
        tags.push(Tag::new(Container::Exif, THUMBNAIL_FIELD, format!("{} bytes", thumbnail.len())));
    } else if !directory.entries(IfdGroup::Thumbnail).is_empty() {
        tags.push(Tag::new(Container::Exif, THUMBNAIL_FIELD, "present"));
    }
}

/// Only the first chunk carries the profile header; later chunks yield nothing
fn icc_summary(chunk: &[u8]) -> Option<String> {
    let [sequence, total, profile @ ..] = chunk else {
        return None;
    };
    if *sequence > 1 {
        return None;
    }
    if profile.len() < 20 {
        return Some(format!("{} bytes", profile.len()));
    }

    let size = u32::from_be_bytes([profile[0], profile[1], profile[2], profile[3]]);
    let text = |range: std::ops::Range<usize>| String::from_utf8_lossy(&profile[range]).trim().to_string();
    Some(format!(
        "{} bytes, CMM '{}', class '{}', space '{}', {} chunk(s)",
        size,
        text(4..8),
        text(12..16),
        text(16..20),
        total
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::{MARKER_APP1, MARKER_APP2, MARKER_COM, SOI, encode_segment};
    use crate::tiff::{ByteOrder, IfdEntry};
    use privlens_core::TagStore;

    fn jpeg(segments: &[Vec<u8>]) -> Vec<u8> {
        let mut data = SOI.to_vec();
        for s in segments {
            data.extend_from_slice(s);
        }
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    fn exif(directory: &ExifDirectory) -> Vec<u8> {
        let mut payload = EXIF_SIGNATURE.to_vec();
        payload.extend_from_slice(&directory.to_bytes());
        encode_segment(MARKER_APP1, &payload).unwrap()
    }

    #[test]
    fn test_reads_directory_entries() {
        let order = ByteOrder::BigEndian;
        let mut dir = ExifDirectory::new(order);
        dir.insert(IfdGroup::Primary, IfdEntry::ascii(0x010F, "Canon"));
        dir.insert(IfdGroup::Exif, IfdEntry::ascii(0xA431, "SN-1234"));
        dir.insert(IfdGroup::Gps, IfdEntry::ascii(0x0001, "N"));
        dir.set_thumbnail(vec![0xFF, 0xD8, 0xFF, 0xD9]);

        let store: TagStore = read_tags(&jpeg(&[exif(&dir)])).unwrap().into_iter().collect();
        assert_eq!(store.get("EXIF:Make"), Some("Canon"));
        assert_eq!(store.get("EXIF:BodySerialNumber"), Some("SN-1234"));
        assert_eq!(store.get("GPS:GPSLatitudeRef"), Some("N"));
        assert_eq!(store.get("EXIF:Thumbnail"), Some("4 bytes"));
    }

    #[test]
    fn test_reads_auxiliary_segments() {
        let mut xmp = XMP_SIGNATURE.to_vec();
        xmp.extend_from_slice(b"<x:xmpmeta/>\0");
        let mut icc = ICC_SIGNATURE.to_vec();
        icc.extend_from_slice(&[1, 2]);
        let mut profile = vec![0u8; 128];
        profile[..4].copy_from_slice(&3144u32.to_be_bytes());
        profile[4..8].copy_from_slice(b"lcms");
        profile[12..16].copy_from_slice(b"mntr");
        profile[16..20].copy_from_slice(b"RGB ");
        icc.extend_from_slice(&profile);

        let data = jpeg(&[
            encode_segment(MARKER_APP1, &xmp).unwrap(),
            encode_segment(MARKER_APP2, &icc).unwrap(),
            encode_segment(MARKER_COM, b"hello").unwrap(),
        ]);
        let store: TagStore = read_tags(&data).unwrap().into_iter().collect();

        assert_eq!(store.get("XMP:Packet"), Some("<x:xmpmeta/>"));
        assert_eq!(
            store.get("ICC:Profile"),
            Some("3144 bytes, CMM 'lcms', class 'mntr', space 'RGB', 2 chunk(s)")
        );
        assert_eq!(store.get("COM:Comment"), Some("hello"));
    }

    #[test]
    fn test_unreadable_directory_is_skipped() {
        let mut payload = EXIF_SIGNATURE.to_vec();
        payload.extend_from_slice(b"II*\0\xFF\xFF\0\0");
        let data = jpeg(&[encode_segment(MARKER_APP1, &payload).unwrap()]);
        assert!(read_tags(&data).unwrap().is_empty());
    }
}
