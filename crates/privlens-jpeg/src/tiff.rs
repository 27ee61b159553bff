//! TIFF tag directory carried in the EXIF APP1 segment
//!
//! Parses IFD0, the Exif/GPS/Interop sub-directories and IFD1 (thumbnail) into
//! owned entries, and re-serializes them in a canonical layout: each IFD is
//! followed by its out-of-line values (padded to even length), in the order
//! IFD0, Exif, Interop, GPS, IFD1, thumbnail bytes.

use tracing::warn;

use crate::error::{JpegError, Result};
use crate::tags::{
    EXIF_IFD_POINTER, GPS_IFD_POINTER, INTEROP_IFD_POINTER, JPEG_INTERCHANGE_FORMAT,
    JPEG_INTERCHANGE_FORMAT_LENGTH,
};

const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;
const TYPE_SBYTE: u16 = 6;
const TYPE_UNDEFINED: u16 = 7;
const TYPE_SSHORT: u16 = 8;
const TYPE_SLONG: u16 = 9;
const TYPE_SRATIONAL: u16 = 10;
const TYPE_FLOAT: u16 = 11;
const TYPE_DOUBLE: u16 = 12;
const TYPE_IFD: u16 = 13;

const HEADER_LEN: usize = 8;
const ENTRY_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    fn mark(&self) -> [u8; 4] {
        match self {
            ByteOrder::LittleEndian => *b"II*\0",
            ByteOrder::BigEndian => *b"MM\0*",
        }
    }

    pub fn read_u16(&self, b: &[u8]) -> u16 {
        let raw = [b[0], b[1]];
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(raw),
            ByteOrder::BigEndian => u16::from_be_bytes(raw),
        }
    }

    pub fn read_u32(&self, b: &[u8]) -> u32 {
        let raw = [b[0], b[1], b[2], b[3]];
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(raw),
            ByteOrder::BigEndian => u32::from_be_bytes(raw),
        }
    }

    fn read_u64(&self, b: &[u8]) -> u64 {
        let raw = [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]];
        match self {
            ByteOrder::LittleEndian => u64::from_le_bytes(raw),
            ByteOrder::BigEndian => u64::from_be_bytes(raw),
        }
    }

    pub fn u16_bytes(&self, v: u16) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => v.to_le_bytes(),
            ByteOrder::BigEndian => v.to_be_bytes(),
        }
    }

    pub fn u32_bytes(&self, v: u32) -> [u8; 4] {
        match self {
            ByteOrder::LittleEndian => v.to_le_bytes(),
            ByteOrder::BigEndian => v.to_be_bytes(),
        }
    }
}

/// Which directory an entry lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IfdGroup {
    Primary,
    Exif,
    Gps,
    Interop,
    Thumbnail,
}

/// Size in bytes of one value of a TIFF field type
pub fn unit_size(field_type: u16) -> Option<usize> {
    match field_type {
        TYPE_BYTE | TYPE_ASCII | TYPE_SBYTE | TYPE_UNDEFINED => Some(1),
        TYPE_SHORT | TYPE_SSHORT => Some(2),
        TYPE_LONG | TYPE_SLONG | TYPE_FLOAT | TYPE_IFD => Some(4),
        TYPE_RATIONAL | TYPE_SRATIONAL | TYPE_DOUBLE => Some(8),
        _ => None,
    }
}

/// One directory entry with its value bytes in the directory's byte order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u32,
    pub value: Vec<u8>,
}

impl IfdEntry {
    pub fn ascii(tag: u16, text: &str) -> Self {
        let mut value = text.as_bytes().to_vec();
        value.push(0);
        Self {
            tag,
            field_type: TYPE_ASCII,
            count: value.len() as u32,
            value,
        }
    }

    pub fn undefined(tag: u16, bytes: &[u8]) -> Self {
        Self {
            tag,
            field_type: TYPE_UNDEFINED,
            count: bytes.len() as u32,
            value: bytes.to_vec(),
        }
    }

    pub fn shorts(order: ByteOrder, tag: u16, values: &[u16]) -> Self {
        Self {
            tag,
            field_type: TYPE_SHORT,
            count: values.len() as u32,
            value: values.iter().flat_map(|v| order.u16_bytes(*v)).collect(),
        }
    }

    pub fn longs(order: ByteOrder, tag: u16, values: &[u32]) -> Self {
        Self {
            tag,
            field_type: TYPE_LONG,
            count: values.len() as u32,
            value: values.iter().flat_map(|v| order.u32_bytes(*v)).collect(),
        }
    }

    pub fn rationals(order: ByteOrder, tag: u16, values: &[(u32, u32)]) -> Self {
        Self {
            tag,
            field_type: TYPE_RATIONAL,
            count: values.len() as u32,
            value: values
                .iter()
                .flat_map(|(n, d)| order.u32_bytes(*n).into_iter().chain(order.u32_bytes(*d)))
                .collect(),
        }
    }

    /// Bytes this entry occupies in the data area (0 when stored inline)
    fn out_of_line_len(&self) -> usize {
        if self.value.len() <= 4 {
            0
        } else {
            self.value.len() + self.value.len() % 2
        }
    }

    fn first_u32(&self, order: ByteOrder) -> Option<u32> {
        match self.field_type {
            TYPE_SHORT if self.value.len() >= 2 => Some(u32::from(order.read_u16(&self.value))),
            TYPE_LONG | TYPE_IFD if self.value.len() >= 4 => Some(order.read_u32(&self.value)),
            _ => None,
        }
    }

    /// Human-readable rendering of the value
    pub fn display(&self, order: ByteOrder) -> String {
        let v = &self.value;
        match self.field_type {
            TYPE_ASCII => ascii_text(v),
            TYPE_BYTE | TYPE_SBYTE | TYPE_UNDEFINED => display_bytes(self.tag, v),
            TYPE_SHORT => join(v.chunks_exact(2).map(|c| order.read_u16(c).to_string())),
            TYPE_SSHORT => join(v.chunks_exact(2).map(|c| (order.read_u16(c) as i16).to_string())),
            TYPE_LONG | TYPE_IFD => join(v.chunks_exact(4).map(|c| order.read_u32(c).to_string())),
            TYPE_SLONG => join(v.chunks_exact(4).map(|c| (order.read_u32(c) as i32).to_string())),
            TYPE_RATIONAL => join(
                v.chunks_exact(8)
                    .map(|c| format!("{}/{}", order.read_u32(c), order.read_u32(&c[4..]))),
            ),
            TYPE_SRATIONAL => join(v.chunks_exact(8).map(|c| {
                format!("{}/{}", order.read_u32(c) as i32, order.read_u32(&c[4..]) as i32)
            })),
            TYPE_FLOAT => join(
                v.chunks_exact(4)
                    .map(|c| f32::from_bits(order.read_u32(c)).to_string()),
            ),
            TYPE_DOUBLE => join(
                v.chunks_exact(8)
                    .map(|c| f64::from_bits(order.read_u64(c)).to_string()),
            ),
            _ => format!("<{} bytes>", v.len()),
        }
    }
}

fn join(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(", ")
}

fn ascii_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim().to_string()
}

fn display_bytes(tag: u16, bytes: &[u8]) -> String {
    // Windows XP* tags are UTF-16LE
    if (0x9C9B..=0x9C9F).contains(&tag) {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .take_while(|u| *u != 0)
            .collect();
        return String::from_utf16_lossy(&units);
    }
    // UserComment carries an 8-byte character code prefix
    if let Some(text) = bytes.strip_prefix(b"ASCII\0\0\0") {
        return ascii_text(text);
    }
    let trimmed = match bytes.iter().rposition(|b| *b != 0) {
        Some(last) => &bytes[..=last],
        None => &[][..],
    };
    if !trimmed.is_empty() && trimmed.iter().all(|b| (0x20..0x7F).contains(b)) {
        return String::from_utf8_lossy(trimmed).to_string();
    }
    if bytes.len() <= 8 {
        return join(bytes.iter().map(|b| b.to_string()));
    }
    format!("<{} bytes>", bytes.len())
}

struct RawIfd {
    entries: Vec<IfdEntry>,
    pointers: Vec<(u16, usize)>,
    next: usize,
}

fn malformed(msg: impl Into<String>) -> JpegError {
    JpegError::MalformedDirectory(msg.into())
}

fn read_ifd(tiff: &[u8], offset: usize, order: ByteOrder, pointer_tags: &[u16]) -> Result<RawIfd> {
    if offset < HEADER_LEN || offset + 2 > tiff.len() {
        return Err(malformed(format!("IFD offset {offset} out of bounds")));
    }
    let count = usize::from(order.read_u16(&tiff[offset..]));
    let table_end = offset + 2 + count * ENTRY_LEN;
    if table_end > tiff.len() {
        return Err(malformed(format!("IFD at {offset} declares {count} entries past end")));
    }

    let mut entries = Vec::with_capacity(count);
    let mut pointers = Vec::new();
    for i in 0..count {
        let raw = &tiff[offset + 2 + i * ENTRY_LEN..offset + 2 + (i + 1) * ENTRY_LEN];
        let tag = order.read_u16(raw);
        let field_type = order.read_u16(&raw[2..]);
        let value_count = order.read_u32(&raw[4..]);

        if pointer_tags.contains(&tag) {
            pointers.push((tag, order.read_u32(&raw[8..]) as usize));
            continue;
        }

        let Some(unit) = unit_size(field_type) else {
            warn!(tag, field_type, "skipping entry with unknown field type");
            continue;
        };
        let size = (value_count as usize)
            .checked_mul(unit)
            .filter(|size| *size <= tiff.len())
            .ok_or_else(|| malformed(format!("tag {tag:#06x} value too large")))?;

        let value = if size <= 4 {
            raw[8..8 + size].to_vec()
        } else {
            let at = order.read_u32(&raw[8..]) as usize;
            tiff.get(at..at + size)
                .ok_or_else(|| malformed(format!("tag {tag:#06x} value out of bounds")))?
                .to_vec()
        };

        entries.push(IfdEntry {
            tag,
            field_type,
            count: value_count,
            value,
        });
    }

    let next = if table_end + 4 <= tiff.len() {
        order.read_u32(&tiff[table_end..]) as usize
    } else {
        0
    };

    Ok(RawIfd {
        entries,
        pointers,
        next,
    })
}

/// Owned model of the EXIF tag directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExifDirectory {
    pub order: ByteOrder,
    primary: Vec<IfdEntry>,
    exif: Vec<IfdEntry>,
    gps: Vec<IfdEntry>,
    interop: Vec<IfdEntry>,
    thumbnail_ifd: Vec<IfdEntry>,
    thumbnail: Option<Vec<u8>>,
}

impl ExifDirectory {
    pub fn new(order: ByteOrder) -> Self {
        Self {
            order,
            primary: Vec::new(),
            exif: Vec::new(),
            gps: Vec::new(),
            interop: Vec::new(),
            thumbnail_ifd: Vec::new(),
            thumbnail: None,
        }
    }

    /// Parse a TIFF blob (the APP1 payload after `Exif\0\0`)
    pub fn parse(tiff: &[u8]) -> Result<Self> {
        if tiff.len() < HEADER_LEN {
            return Err(malformed("header too short"));
        }
        let order = match &tiff[..4] {
            b"II*\0" => ByteOrder::LittleEndian,
            b"MM\0*" => ByteOrder::BigEndian,
            _ => return Err(malformed("bad byte-order mark")),
        };

        let mut dir = Self::new(order);
        let mut visited = Vec::new();
        let mut visit = |offset: usize| -> Result<()> {
            if visited.contains(&offset) {
                return Err(malformed(format!("directory cycle at {offset}")));
            }
            visited.push(offset);
            Ok(())
        };

        let ifd0_offset = order.read_u32(&tiff[4..]) as usize;
        visit(ifd0_offset)?;
        let ifd0 = read_ifd(tiff, ifd0_offset, order, &[EXIF_IFD_POINTER, GPS_IFD_POINTER])?;
        dir.primary = ifd0.entries;

        for (tag, offset) in ifd0.pointers {
            visit(offset)?;
            if tag == EXIF_IFD_POINTER {
                let exif = read_ifd(tiff, offset, order, &[INTEROP_IFD_POINTER])?;
                dir.exif = exif.entries;
                if let Some((_, interop_offset)) = exif.pointers.first() {
                    visit(*interop_offset)?;
                    dir.interop = read_ifd(tiff, *interop_offset, order, &[])?.entries;
                }
            } else {
                dir.gps = read_ifd(tiff, offset, order, &[])?.entries;
            }
        }

        if ifd0.next != 0 {
            visit(ifd0.next)?;
            let ifd1 = read_ifd(tiff, ifd0.next, order, &[])?;
            dir.thumbnail_ifd = ifd1.entries;
            dir.thumbnail = dir.extract_thumbnail(tiff);
        }

        Ok(dir)
    }

    fn extract_thumbnail(&mut self, tiff: &[u8]) -> Option<Vec<u8>> {
        let find = |tag: u16| {
            self.thumbnail_ifd
                .iter()
                .find(|e| e.tag == tag)
                .and_then(|e| e.first_u32(self.order))
                .map(|v| v as usize)
        };
        let offset = find(JPEG_INTERCHANGE_FORMAT)?;
        let length = find(JPEG_INTERCHANGE_FORMAT_LENGTH)?;
        let bytes = tiff.get(offset..offset.checked_add(length)?);
        if bytes.is_none() {
            warn!(offset, length, "thumbnail out of bounds; dropping it");
        }
        bytes.map(<[u8]>::to_vec)
    }

    pub fn entries(&self, group: IfdGroup) -> &[IfdEntry] {
        match group {
            IfdGroup::Primary => &self.primary,
            IfdGroup::Exif => &self.exif,
            IfdGroup::Gps => &self.gps,
            IfdGroup::Interop => &self.interop,
            IfdGroup::Thumbnail => &self.thumbnail_ifd,
        }
    }

    fn entries_mut(&mut self, group: IfdGroup) -> &mut Vec<IfdEntry> {
        match group {
            IfdGroup::Primary => &mut self.primary,
            IfdGroup::Exif => &mut self.exif,
            IfdGroup::Gps => &mut self.gps,
            IfdGroup::Interop => &mut self.interop,
            IfdGroup::Thumbnail => &mut self.thumbnail_ifd,
        }
    }

    /// Add or replace an entry
    pub fn insert(&mut self, group: IfdGroup, entry: IfdEntry) {
        let entries = self.entries_mut(group);
        entries.retain(|e| e.tag != entry.tag);
        entries.push(entry);
    }

    /// Remove every entry with `tag`; returns whether anything was removed
    pub fn remove(&mut self, group: IfdGroup, tag: u16) -> bool {
        let entries = self.entries_mut(group);
        let before = entries.len();
        entries.retain(|e| e.tag != tag);
        entries.len() != before
    }

    pub fn thumbnail(&self) -> Option<&[u8]> {
        self.thumbnail.as_deref()
    }

    pub fn set_thumbnail(&mut self, jpeg: Vec<u8>) {
        self.thumbnail = Some(jpeg);
    }

    /// Drop IFD1 and the embedded thumbnail
    pub fn remove_thumbnail(&mut self) -> bool {
        let had = !self.thumbnail_ifd.is_empty() || self.thumbnail.is_some();
        self.thumbnail_ifd.clear();
        self.thumbnail = None;
        had
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
            && self.exif.is_empty()
            && self.gps.is_empty()
            && self.interop.is_empty()
            && self.thumbnail_ifd.is_empty()
            && self.thumbnail.is_none()
    }

    /// Serialize to a TIFF blob in canonical layout.
    ///
    /// Out-of-line values are copied byte for byte but may move. Maker notes
    /// whose internal pointers are relative to the TIFF header (Canon, Nikon
    /// type 1) are not rebased and can dangle after a rewrite.
    pub fn to_bytes(&self) -> Vec<u8> {
        let order = self.order;
        let has_interop = !self.interop.is_empty();
        let has_exif = !self.exif.is_empty() || has_interop;
        let has_gps = !self.gps.is_empty();
        let has_ifd1 = !self.thumbnail_ifd.is_empty() || self.thumbnail.is_some();

        let pointer = |tag: u16| IfdEntry::longs(order, tag, &[0]);

        let mut primary = self.primary.clone();
        if has_exif {
            primary.push(pointer(EXIF_IFD_POINTER));
        }
        if has_gps {
            primary.push(pointer(GPS_IFD_POINTER));
        }
        let mut exif = self.exif.clone();
        if has_interop {
            exif.push(pointer(INTEROP_IFD_POINTER));
        }
        let mut ifd1 = self.thumbnail_ifd.clone();
        match &self.thumbnail {
            Some(thumb) => {
                ifd1.retain(|e| e.tag != JPEG_INTERCHANGE_FORMAT && e.tag != JPEG_INTERCHANGE_FORMAT_LENGTH);
                ifd1.push(pointer(JPEG_INTERCHANGE_FORMAT));
                ifd1.push(IfdEntry::longs(order, JPEG_INTERCHANGE_FORMAT_LENGTH, &[thumb.len() as u32]));
            }
            None => {
                ifd1.retain(|e| e.tag != JPEG_INTERCHANGE_FORMAT && e.tag != JPEG_INTERCHANGE_FORMAT_LENGTH);
            }
        }
        for list in [&mut primary, &mut exif, &mut ifd1] {
            list.sort_by_key(|e| e.tag);
        }
        let mut gps = self.gps.clone();
        gps.sort_by_key(|e| e.tag);
        let mut interop = self.interop.clone();
        interop.sort_by_key(|e| e.tag);

        let mut cursor = HEADER_LEN + block_len(&primary);
        let mut place = |present: bool, entries: &[IfdEntry]| {
            present.then(|| {
                let at = cursor;
                cursor += block_len(entries);
                at as u32
            })
        };
        let exif_at = place(has_exif, &exif);
        let interop_at = place(has_interop, &interop);
        let gps_at = place(has_gps, &gps);
        let ifd1_at = place(has_ifd1, &ifd1);
        let thumb_at = (has_ifd1 && self.thumbnail.is_some()).then_some(cursor as u32);

        set_long(order, &mut primary, EXIF_IFD_POINTER, exif_at);
        set_long(order, &mut primary, GPS_IFD_POINTER, gps_at);
        set_long(order, &mut exif, INTEROP_IFD_POINTER, interop_at);
        set_long(order, &mut ifd1, JPEG_INTERCHANGE_FORMAT, thumb_at);

        let mut out = Vec::with_capacity(cursor + self.thumbnail.as_ref().map_or(0, Vec::len));
        out.extend_from_slice(&order.mark()[..2]);
        out.extend_from_slice(&order.u16_bytes(42));
        out.extend_from_slice(&order.u32_bytes(HEADER_LEN as u32));

        write_ifd(&mut out, order, &primary, ifd1_at.unwrap_or(0));
        if has_exif {
            write_ifd(&mut out, order, &exif, 0);
        }
        if has_interop {
            write_ifd(&mut out, order, &interop, 0);
        }
        if has_gps {
            write_ifd(&mut out, order, &gps, 0);
        }
        if has_ifd1 {
            write_ifd(&mut out, order, &ifd1, 0);
            if let Some(thumb) = &self.thumbnail {
                out.extend_from_slice(thumb);
            }
        }
        out
    }
}

fn block_len(entries: &[IfdEntry]) -> usize {
    2 + entries.len() * ENTRY_LEN + 4 + entries.iter().map(IfdEntry::out_of_line_len).sum::<usize>()
}

fn set_long(order: ByteOrder, entries: &mut [IfdEntry], tag: u16, value: Option<u32>) {
    if let (Some(value), Some(entry)) = (value, entries.iter_mut().find(|e| e.tag == tag)) {
        entry.value = order.u32_bytes(value).to_vec();
    }
}

fn write_ifd(out: &mut Vec<u8>, order: ByteOrder, entries: &[IfdEntry], next: u32) {
    let data_start = out.len() + 2 + entries.len() * ENTRY_LEN + 4;
    let mut data = Vec::new();

    out.extend_from_slice(&order.u16_bytes(entries.len() as u16));
    for entry in entries {
        out.extend_from_slice(&order.u16_bytes(entry.tag));
        out.extend_from_slice(&order.u16_bytes(entry.field_type));
        out.extend_from_slice(&order.u32_bytes(entry.count));
        if entry.value.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..entry.value.len()].copy_from_slice(&entry.value);
            out.extend_from_slice(&inline);
        } else {
            out.extend_from_slice(&order.u32_bytes((data_start + data.len()) as u32));
            data.extend_from_slice(&entry.value);
            if data.len() % 2 == 1 {
                data.push(0);
            }
        }
    }
    out.extend_from_slice(&order.u32_bytes(next));
    out.extend_from_slice(&data);
}
