use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub fn as_str_lossy(&self) -> String {
        self.0.iter().map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}
impl fmt::Debug for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }
impl fmt::Display for FourCC { fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str_lossy()) } }

#[derive(Debug, Clone)]
pub struct BoxHeader {
    pub size: u64,          // total size including header, or 0=to parent end
    pub typ: FourCC,
    pub uuid: Option<[u8;16]>,
    pub header_size: u64,   // 8, 16, or 24
    pub start: u64,         // offset of header start
}

#[derive(Debug)]
pub enum NodeKind {
    Container(Vec<BoxRef>),
    FullBox { version: u8, flags: u32, data_offset: u64, data_len: u64 },
    Leaf { data_offset: u64, data_len: u64 },
}

#[derive(Debug)]
pub struct BoxRef {
    pub hdr: BoxHeader,
    pub kind: NodeKind,
}

impl BoxRef {
    pub fn is(&self, typ: &[u8; 4]) -> bool {
        &self.hdr.typ.0 == typ
    }

    pub fn children(&self) -> &[BoxRef] {
        match &self.kind {
            NodeKind::Container(kids) => kids,
            _ => &[],
        }
    }

    /// First direct child of the given type.
    pub fn child(&self, typ: &[u8; 4]) -> Option<&BoxRef> {
        self.children().iter().find(|c| c.is(typ))
    }

    pub fn children_of<'a>(&'a self, typ: &'a [u8; 4]) -> impl Iterator<Item = &'a BoxRef> {
        self.children().iter().filter(move |c| c.is(typ))
    }

    /// Follow a path of box types from this box, e.g. `[b"mdia", b"minf"]`.
    pub fn find(&self, path: &[&[u8; 4]]) -> Option<&BoxRef> {
        path.iter().try_fold(self, |b, typ| b.child(typ))
    }

    /// Payload geometry (offset, len); version/flags excluded for full boxes.
    pub fn payload(&self) -> Option<(u64, u64)> {
        match &self.kind {
            NodeKind::FullBox { data_offset, data_len, .. } => Some((*data_offset, *data_len)),
            NodeKind::Leaf { data_offset, data_len } => Some((*data_offset, *data_len)),
            NodeKind::Container(_) => None,
        }
    }

    pub fn version(&self) -> u8 {
        match &self.kind {
            NodeKind::FullBox { version, .. } => *version,
            _ => 0,
        }
    }
}

/// Find the first box of the given type in a list of siblings.
pub fn find_box<'a>(boxes: &'a [BoxRef], typ: &[u8; 4]) -> Option<&'a BoxRef> {
    boxes.iter().find(|b| b.is(typ))
}
