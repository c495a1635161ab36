use crate::boxes::{BoxHeader, BoxRef, FourCC, NodeKind};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid box size")]
    InvalidSize,
}

pub type Result<T> = std::result::Result<T, ParseError>;

pub fn read_box_header<R: Read + Seek>(r: &mut R) -> Result<BoxHeader> {
    let start = r.stream_position()?;
    let size32 = r.read_u32::<BigEndian>()?;
    let mut typ = [0u8; 4]; r.read_exact(&mut typ)?;
    let mut size = size32 as u64;

    if size32 == 1 {
        size = r.read_u64::<BigEndian>()?;
    }

    let mut uuid = None;
    if &typ == b"uuid" {
        let mut u = [0u8; 16];
        r.read_exact(&mut u)?;
        uuid = Some(u);
    }

    let header_size = match (size32 == 1, &typ == b"uuid") {
        (true, true)  => 8 + 8 + 16,
        (true, false) => 8 + 8,
        (false, true) => 8 + 16,
        (false, false)=> 8,
    } as u64;

    if size != 0 && size < header_size {
        return Err(ParseError::InvalidSize);
    }

    Ok(BoxHeader { size, typ: FourCC(typ), uuid, header_size, start })
}

/// Parse the whole box tree of a resource of `len` bytes.
pub fn parse_file<R: Read + Seek>(r: &mut R, len: u64) -> Result<Vec<BoxRef>> {
    r.seek(SeekFrom::Start(0))?;
    parse_children(r, len)
}

/// Parse sibling boxes from the current position up to `parent_end`.
pub fn parse_children<R: Read + Seek>(r: &mut R, parent_end: u64) -> Result<Vec<BoxRef>> {
    parse_children_in(r, parent_end, None)
}

fn parse_children_in<R: Read + Seek>(
    r: &mut R,
    parent_end: u64,
    parent: Option<FourCC>,
) -> Result<Vec<BoxRef>> {
    let mut kids = Vec::new();
    // Items of an iTunes metadata list are containers of `data` boxes,
    // whatever their type.
    let in_ilst = parent.is_some_and(|p| &p.0 == b"ilst");

    while r.stream_position()? + 8 <= parent_end {
        let h = read_box_header(r)?;
        let box_end = if h.size == 0 {
            parent_end
        } else {
            h.start.checked_add(h.size).ok_or(ParseError::InvalidSize)?
        };
        if box_end > parent_end {
            return Err(ParseError::InvalidSize);
        }
        let content_start = h.start + h.header_size;

        let kind = if &h.typ.0 == b"meta" {
            // ISO meta is a full box, QuickTime meta is a plain container.
            r.seek(SeekFrom::Start(content_start))?;
            let first = r.read_u32::<BigEndian>()?;
            let start = if first == 0 { content_start + 4 } else { content_start };
            r.seek(SeekFrom::Start(start))?;
            NodeKind::Container(parse_children_in(r, box_end, Some(h.typ))?)
        } else if in_ilst || is_container(&h) {
            r.seek(SeekFrom::Start(content_start))?;
            NodeKind::Container(parse_children_in(r, box_end, Some(h.typ))?)
        } else if is_full_box(&h) {
            r.seek(SeekFrom::Start(content_start))?;
            let version = r.read_u8()?;
            let mut f = [0u8;3]; r.read_exact(&mut f)?;
            let flags = ((f[0] as u32) << 16) | ((f[1] as u32) << 8) | (f[2] as u32);
            let data_offset = r.stream_position()?;
            let data_len = box_end.saturating_sub(data_offset);
            NodeKind::FullBox { version, flags, data_offset, data_len }
        } else {
            let data_len = box_end.saturating_sub(content_start);
            NodeKind::Leaf { data_offset: content_start, data_len }
        };

        // Skip to end of box
        r.seek(SeekFrom::Start(box_end))?;
        kids.push(BoxRef { hdr: h, kind });
    }
    Ok(kids)
}

// Containers the analysis walks through
fn is_container(h: &BoxHeader) -> bool {
    matches!(&h.typ.0,
        b"moov" | b"trak" | b"mdia" | b"minf" | b"stbl" | b"edts" |
        b"udta" | b"ilst" | b"moof" | b"traf" | b"mfra" | b"sinf" |
        b"schi" | b"dinf" | b"mvex" | b"tref"
    )
}

// "FullBox" (version+flags) types the analysis reads
fn is_full_box(h: &BoxHeader) -> bool {
    matches!(&h.typ.0,
        b"mvhd" | b"tkhd" | b"mdhd" | b"hdlr" | b"vmhd" | b"smhd" |
        b"nmhd" | b"dref" | b"stsd" | b"stts" | b"ctts" | b"stsc" |
        b"stsz" | b"stz2" | b"stco" | b"co64" | b"stss" | b"elst" |
        b"tfhd" | b"trun" | b"mfhd" | b"tfdt" | b"mehd" | b"trex" |
        b"esds" | b"sidx"
    )
}
