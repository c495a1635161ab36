use mediaprobe::boxes::{FourCC, NodeKind, find_box};
use mediaprobe::parser::{ParseError, parse_file, read_box_header};
use std::io::Cursor;

fn bx(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&(payload.len() as u32 + 8).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

fn ftyp() -> Vec<u8> {
    // major brand, minor version, one compatible brand
    let mut p = b"isom".to_vec();
    p.extend_from_slice(&512u32.to_be_bytes());
    p.extend_from_slice(b"isom");
    bx(b"ftyp", &p)
}

#[test]
fn read_single_ftyp_header() {
    let mut cur = Cursor::new(ftyp());
    let hdr = read_box_header(&mut cur).expect("read_box_header failed");

    assert_eq!(hdr.start, 0);
    assert_eq!(hdr.size, 24);
    assert_eq!(hdr.typ, FourCC(*b"ftyp"));
    assert_eq!(hdr.header_size, 8);
}

#[test]
fn largesize_header() {
    let mut data = 1u32.to_be_bytes().to_vec();
    data.extend_from_slice(b"mdat");
    data.extend_from_slice(&20u64.to_be_bytes());
    data.extend_from_slice(&[0u8; 4]);

    let hdr = read_box_header(&mut Cursor::new(data)).unwrap();
    assert_eq!(hdr.size, 20);
    assert_eq!(hdr.header_size, 16);
}

#[test]
fn nested_containers_and_full_boxes() {
    let mvhd = bx(b"mvhd", &[1, 0, 0, 0, 0xaa, 0xbb]);
    let trak = bx(b"trak", &bx(b"tkhd", &[0, 0, 0, 7]));
    let moov = bx(b"moov", &[mvhd, trak.clone(), trak].concat());
    let data = [ftyp(), moov].concat();
    let len = data.len() as u64;

    let boxes = parse_file(&mut Cursor::new(data), len).unwrap();
    assert_eq!(boxes.len(), 2);
    assert!(boxes[0].payload().is_some());

    let moov = find_box(&boxes, b"moov").unwrap();
    assert!(moov.payload().is_none());
    assert_eq!(moov.children_of(b"trak").count(), 2);

    let mvhd = moov.child(b"mvhd").unwrap();
    assert_eq!(mvhd.version(), 1);
    match mvhd.kind {
        NodeKind::FullBox { flags, data_len, .. } => {
            assert_eq!(flags, 0);
            assert_eq!(data_len, 2);
        }
        _ => panic!("mvhd should be a full box"),
    }
    assert!(moov.find(&[b"trak", b"tkhd"]).is_some());
}

#[test]
fn iso_and_quicktime_meta() {
    let item = bx(b"\xa9nam", &bx(b"data", &[0, 0, 0, 1, 0, 0, 0, 0, b'x']));
    let ilst = bx(b"ilst", &item);

    let iso = bx(b"meta", &[vec![0u8; 4], ilst.clone()].concat());
    let qt = bx(b"meta", &ilst);

    for meta in [iso, qt] {
        let len = meta.len() as u64;
        let boxes = parse_file(&mut Cursor::new(meta), len).unwrap();
        let data = boxes[0]
            .find(&[b"ilst", b"\xa9nam", b"data"])
            .expect("ilst items hold data boxes");
        assert_eq!(data.payload().map(|(_, len)| len), Some(9));
    }
}

#[test]
fn child_overrunning_parent_is_rejected() {
    // moov claims 16 bytes but its child claims 32
    let mut data = 16u32.to_be_bytes().to_vec();
    data.extend_from_slice(b"moov");
    data.extend_from_slice(&32u32.to_be_bytes());
    data.extend_from_slice(b"trak");
    let len = data.len() as u64;

    let err = parse_file(&mut Cursor::new(data), len).unwrap_err();
    assert!(matches!(err, ParseError::InvalidSize));
}

#[test]
fn largesize_past_u64_range_is_rejected() {
    let mut data = bx(b"free", &[]);
    data.extend_from_slice(&1u32.to_be_bytes());
    data.extend_from_slice(b"skip");
    data.extend_from_slice(&u64::MAX.to_be_bytes());
    data.extend_from_slice(&[0u8; 8]);
    let len = data.len() as u64;

    let err = parse_file(&mut Cursor::new(data), len).unwrap_err();
    assert!(matches!(err, ParseError::InvalidSize));
}
