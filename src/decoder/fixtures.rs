//! Byte-level JPEG builders for tests that run the real nom-exif decoder.

/// One TIFF directory entry value, little-endian on the wire.
#[derive(Clone, Copy)]
pub(crate) enum Tag<'a> {
    Ascii(&'a str),
    Byte(u8),
    Short(u16),
    Long(u32),
    Rational(&'a [(u32, u32)]),
    SRational(i32, i32),
}

impl Tag<'_> {
    /// (TIFF type, component count, value bytes)
    fn encode(&self) -> (u16, u32, Vec<u8>) {
        match self {
            Tag::Ascii(s) => {
                let mut bytes = s.as_bytes().to_vec();
                bytes.push(0);
                (2, bytes.len() as u32, bytes)
            }
            Tag::Byte(v) => (1, 1, vec![*v]),
            Tag::Short(v) => (3, 1, v.to_le_bytes().to_vec()),
            Tag::Long(v) => (4, 1, v.to_le_bytes().to_vec()),
            Tag::Rational(parts) => (
                5,
                parts.len() as u32,
                parts
                    .iter()
                    .flat_map(|(n, d)| n.to_le_bytes().into_iter().chain(d.to_le_bytes()))
                    .collect(),
            ),
            Tag::SRational(n, d) => (
                10,
                1,
                n.to_le_bytes().into_iter().chain(d.to_le_bytes()).collect(),
            ),
        }
    }
}

/// Lay out one IFD starting `at` bytes into the TIFF block. Values longer
/// than four bytes follow the entry table. The next-IFD link is zero.
fn encode_ifd(entries: &[(u16, Tag)], at: usize) -> Vec<u8> {
    let data_start = at + 2 + entries.len() * 12 + 4;
    let mut table = (entries.len() as u16).to_le_bytes().to_vec();
    let mut data = Vec::new();

    for (code, tag) in entries {
        let (kind, count, mut bytes) = tag.encode();
        table.extend(code.to_le_bytes());
        table.extend(kind.to_le_bytes());
        table.extend(count.to_le_bytes());
        if bytes.len() <= 4 {
            bytes.resize(4, 0);
            table.extend(bytes);
        } else {
            table.extend(((data_start + data.len()) as u32).to_le_bytes());
            data.extend(bytes);
            if data.len() % 2 == 1 {
                data.push(0);
            }
        }
    }

    table.extend(0u32.to_le_bytes());
    table.extend(data);
    table
}

/// A little-endian TIFF block: IFD0 plus an Exif sub-IFD and a GPS sub-IFD,
/// each linked from IFD0.
pub(crate) fn tiff(ifd0: &[(u16, Tag)], exif: &[(u16, Tag)], gps: &[(u16, Tag)]) -> Vec<u8> {
    const HEADER: usize = 8;
    const EXIF_OFFSET: u16 = 0x8769;
    const GPS_INFO: u16 = 0x8825;

    let link = |exif_at: u32, gps_at: u32| {
        let mut ifd = Vec::with_capacity(ifd0.len() + 2);
        ifd.extend_from_slice(ifd0);
        ifd.push((EXIF_OFFSET, Tag::Long(exif_at)));
        ifd.push((GPS_INFO, Tag::Long(gps_at)));
        ifd
    };

    // Pointer values are inline, so the IFD0 size does not depend on them.
    let ifd0_len = encode_ifd(&link(0, 0), HEADER).len();
    let exif_at = HEADER + ifd0_len;
    let exif_ifd = encode_ifd(exif, exif_at);
    let gps_at = exif_at + exif_ifd.len();
    let gps_ifd = encode_ifd(gps, gps_at);

    let mut out = b"II".to_vec();
    out.extend(42u16.to_le_bytes());
    out.extend((HEADER as u32).to_le_bytes());
    out.extend(encode_ifd(&link(exif_at as u32, gps_at as u32), HEADER));
    out.extend(exif_ifd);
    out.extend(gps_ifd);
    out
}

fn segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0xFF, marker];
    out.extend(((payload.len() + 2) as u16).to_be_bytes());
    out.extend(payload);
    out
}

/// A 1x1 grayscale baseline JPEG. `tiff` becomes an APP1 Exif segment after
/// the JFIF header; without it the file carries no Exif at all.
pub(crate) fn jpeg(tiff: Option<&[u8]>) -> Vec<u8> {
    let mut out = vec![0xFF, 0xD8];
    out.extend(segment(0xE0, b"JFIF\0\x01\x01\x00\x00\x01\x00\x01\x00\x00"));
    if let Some(tiff) = tiff {
        let mut payload = b"Exif\0\0".to_vec();
        payload.extend(tiff);
        out.extend(segment(0xE1, &payload));
    }
    out.extend(segment(0xC0, &[8, 0, 1, 0, 1, 1, 1, 0x11, 0]));
    out.extend(segment(0xDA, &[1, 1, 0x00, 0, 63, 0]));
    out.extend([0x00, 0x3F, 0xFF, 0xD9]);
    out
}

/// A JFIF JPEG with no APP1 segment.
pub(crate) fn jfif_without_exif() -> Vec<u8> {
    jpeg(None)
}

/// A JPEG from a southern-hemisphere, western-longitude camera, with the
/// capture fields split across IFD0, the Exif sub-IFD and the GPS sub-IFD.
pub(crate) fn jpeg_with_exif() -> Vec<u8> {
    let tiff = tiff(
        &[
            (0x010F, Tag::Ascii("FUJIFILM")),
            (0x0110, Tag::Ascii("X-T5")),
            (0x0112, Tag::Short(6)),
        ],
        &[
            (0x8827, Tag::Short(200)),
            (0x9003, Tag::Ascii("2024:05:01 09:30:00")),
            (0x9201, Tag::SRational(6, 1)),
            (0x9202, Tag::Rational(&[(4, 1)])),
            (0xA002, Tag::Long(4000)),
            (0xA003, Tag::Short(3000)),
        ],
        &[
            (0x0001, Tag::Ascii("S")),
            (0x0002, Tag::Rational(&[(33, 1), (51, 1), (3600, 100)])),
            (0x0003, Tag::Ascii("W")),
            (0x0004, Tag::Rational(&[(151, 1), (12, 1), (36, 1)])),
            (0x0005, Tag::Byte(1)),
            (0x0006, Tag::Rational(&[(125, 10)])),
        ],
    );
    jpeg(Some(&tiff))
}
