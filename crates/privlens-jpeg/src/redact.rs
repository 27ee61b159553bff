//! Binary redactor: removes selected directory entries and auxiliary segments

use std::collections::BTreeSet;

use privlens_core::{Container, tag::split_key};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::segment::{EXIF_SIGNATURE, JpegLayout, MARKER_APP1, SOI, Segment, SegmentKind, encode_segment};
use crate::tags::{THUMBNAIL_FIELD, tag_id, tag_name};
use crate::tiff::{ByteOrder, ExifDirectory, IfdGroup};

/// Field name used for JPEG comment segments
pub const COMMENT_CONTAINER: &str = "COM";

/// Tag keys partitioned into directory deletions and whole-segment removals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub exif_fields: BTreeSet<String>,
    pub gps_fields: BTreeSet<String>,
    pub thumbnail: bool,
    pub xmp: bool,
    pub iptc: bool,
    pub icc: bool,
    pub comment: bool,
    /// Keys this format cannot act on
    pub ignored: Vec<String>,
}

impl Selection {
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::default();
        for key in keys {
            let key = key.as_ref();
            let Ok((container, field)) = split_key(key) else {
                selection.ignored.push(key.to_string());
                continue;
            };
            match Container::from(container) {
                Container::Exif if field == THUMBNAIL_FIELD => selection.thumbnail = true,
                Container::Exif => {
                    selection.exif_fields.insert(field.to_string());
                }
                Container::Gps => {
                    selection.gps_fields.insert(field.to_string());
                }
                Container::Xmp => selection.xmp = true,
                Container::Iptc => selection.iptc = true,
                Container::Icc => selection.icc = true,
                Container::Other(name) if name == COMMENT_CONTAINER => selection.comment = true,
                _ => selection.ignored.push(key.to_string()),
            }
        }
        selection
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_directory() && !self.xmp && !self.iptc && !self.icc && !self.comment
    }

    fn touches_directory(&self) -> bool {
        !self.exif_fields.is_empty() || !self.gps_fields.is_empty() || self.thumbnail
    }

    fn drops_segment(&self, kind: SegmentKind) -> bool {
        match kind {
            SegmentKind::Xmp => self.xmp,
            SegmentKind::Iptc => self.iptc,
            SegmentKind::Icc => self.icc,
            SegmentKind::Comment => self.comment,
            SegmentKind::Exif | SegmentKind::Other => false,
        }
    }

    /// Delete the selected entries; returns how many were removed
    fn apply(&self, directory: &mut ExifDirectory) -> usize {
        let mut removed = 0;
        let targets = self
            .exif_fields
            .iter()
            .flat_map(|name| {
                [IfdGroup::Primary, IfdGroup::Exif, IfdGroup::Interop].map(|group| (group, name))
            })
            .chain(self.gps_fields.iter().map(|name| (IfdGroup::Gps, name)));

        for (group, name) in targets {
            // the name must round-trip so `Tag0xNNNN` never hits a known tag in another IFD
            let Some(id) = tag_id(group, name).filter(|id| tag_name(group, *id) == *name) else {
                continue;
            };
            if directory.remove(group, id) {
                debug!(?group, name = name.as_str(), "removed directory entry");
                removed += 1;
            }
        }
        if self.thumbnail && directory.remove_thumbnail() {
            removed += 1;
        }
        removed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionOutcome {
    pub bytes: Vec<u8>,
    pub removed_entries: usize,
    pub removed_segments: usize,
    /// The tag directory failed to parse and an empty one was used instead
    pub directory_recovered: bool,
}

/// Remove the selected elements from a JPEG, leaving every other byte untouched
pub fn redact(data: &[u8], selection: &Selection) -> Result<RedactionOutcome> {
    let layout = JpegLayout::parse(data)?;
    let mut outcome = RedactionOutcome {
        bytes: Vec::with_capacity(data.len()),
        removed_entries: 0,
        removed_segments: 0,
        directory_recovered: false,
    };
    outcome.bytes.extend_from_slice(&SOI);

    for segment in &layout.segments {
        let kind = segment.kind();
        if selection.drops_segment(kind) {
            debug!(?kind, len = segment.bytes.len(), "dropped segment");
            outcome.removed_segments += 1;
            continue;
        }
        if kind == SegmentKind::Exif && selection.touches_directory() {
            if let Some(rewritten) = rewrite_exif(segment, selection, &mut outcome)? {
                outcome.bytes.extend_from_slice(&rewritten);
                continue;
            }
        }
        outcome.bytes.extend_from_slice(segment.bytes);
    }
    outcome.bytes.extend_from_slice(layout.tail);

    info!(
        before = data.len(),
        after = outcome.bytes.len(),
        entries = outcome.removed_entries,
        segments = outcome.removed_segments,
        "redaction complete"
    );
    Ok(outcome)
}

/// Strip every metadata segment (EXIF, XMP, IPTC, ICC, comments)
pub fn strip_metadata(data: &[u8]) -> Result<RedactionOutcome> {
    let layout = JpegLayout::parse(data)?;
    let mut bytes = Vec::with_capacity(data.len());
    bytes.extend_from_slice(&SOI);
    let mut removed_segments = 0;

    for segment in &layout.segments {
        match segment.kind() {
            SegmentKind::Other => bytes.extend_from_slice(segment.bytes),
            _ => removed_segments += 1,
        }
    }
    bytes.extend_from_slice(layout.tail);

    Ok(RedactionOutcome {
        bytes,
        removed_entries: 0,
        removed_segments,
        directory_recovered: false,
    })
}

/// Returns `None` when the segment should be copied unchanged
fn rewrite_exif(
    segment: &Segment<'_>,
    selection: &Selection,
    outcome: &mut RedactionOutcome,
) -> Result<Option<Vec<u8>>> {
    let tiff = &segment.payload()[EXIF_SIGNATURE.len()..];
    let mut directory = match ExifDirectory::parse(tiff) {
        Ok(directory) => directory,
        Err(err) => {
            warn!(%err, "tag directory unreadable; continuing with an empty one");
            outcome.directory_recovered = true;
            ExifDirectory::new(ByteOrder::BigEndian)
        }
    };

    let removed = selection.apply(&mut directory);
    if removed == 0 {
        return Ok(None);
    }
    outcome.removed_entries += removed;

    let mut payload = EXIF_SIGNATURE.to_vec();
    payload.extend_from_slice(&directory.to_bytes());
    encode_segment(MARKER_APP1, &payload).map(Some)
}
