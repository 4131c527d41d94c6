//! Minimal EXIF reader for JPEG files.
//!
//! The sanitizer only needs three facts from the metadata it is about to
//! throw away:
//! - Orientation (IFD0 tag 0x0112): how to rotate the pixels
//! - GPS IFD pointer (IFD0 tag 0x8825): the upload carried a location
//! - Make / Model (IFD0 tags 0x010F / 0x0110): the upload identified a device
//!
//! EXIF lives in a JPEG APP1 segment that starts with `Exif\0\0`, followed by
//! a TIFF structure: byte-order mark, magic 42, then the offset of IFD0.
//!
//! Anything unparseable yields the default summary (upright, nothing found):
//! a broken metadata block must not make an otherwise decodable photo fail.

use super::orientation::Orientation;

/// Facts extracted from a JPEG's EXIF block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExifSummary {
    pub orientation: Orientation,
    pub has_gps: bool,
    pub has_device_info: bool,
}

const EXIF_HEADER: &[u8] = b"Exif\0\0";

const TAG_MAKE: u16 = 0x010F;
const TAG_MODEL: u16 = 0x0110;
const TAG_ORIENTATION: u16 = 0x0112;
const TAG_GPS_IFD: u16 = 0x8825;

/// Read the EXIF summary from JPEG bytes.
pub fn read_exif(jpeg: &[u8]) -> ExifSummary {
    jpeg_segments(jpeg)
        .into_iter()
        .find(|(marker, body)| *marker == 0xE1 && body.starts_with(EXIF_HEADER))
        .map(|(_, body)| parse_tiff(&body[EXIF_HEADER.len()..]))
        .unwrap_or_default()
}

/// Every marker segment before the image data, as `(marker, body)` pairs.
///
/// `body` excludes the marker and the two length bytes. Scanning stops at
/// start-of-scan (0xDA), end-of-image, or the first malformed segment.
pub fn jpeg_segments(data: &[u8]) -> Vec<(u8, &[u8])> {
    let mut segments = Vec::new();
    if !data.starts_with(&[0xFF, 0xD8]) {
        return segments;
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            break;
        }
        let marker = data[pos + 1];
        // Fill bytes between markers
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if marker == 0xDA || marker == 0xD9 {
            break;
        }
        // Standalone markers carry no length field
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }

        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if seg_len < 2 || pos + 2 + seg_len > data.len() {
            break;
        }
        segments.push((marker, &data[pos + 4..pos + 2 + seg_len]));
        pos += 2 + seg_len;
    }

    segments
}

/// Walk IFD0 of an EXIF TIFF block.
fn parse_tiff(data: &[u8]) -> ExifSummary {
    let mut summary = ExifSummary::default();
    if data.len() < 8 {
        return summary;
    }

    let big_endian = match &data[0..2] {
        b"MM" => true,
        b"II" => false,
        _ => return summary,
    };

    let read_u16 = |offset: usize| -> Option<u16> {
        let bytes = [*data.get(offset)?, *data.get(offset + 1)?];
        Some(if big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    };

    let read_u32 = |offset: usize| -> Option<u32> {
        let bytes = [
            *data.get(offset)?,
            *data.get(offset + 1)?,
            *data.get(offset + 2)?,
            *data.get(offset + 3)?,
        ];
        Some(if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    };

    if read_u16(2) != Some(42) {
        return summary;
    }
    let Some(ifd_offset) = read_u32(4).map(|o| o as usize) else {
        return summary;
    };
    let Some(entry_count) = read_u16(ifd_offset).map(usize::from) else {
        return summary;
    };

    for i in 0..entry_count {
        let entry = ifd_offset + 2 + i * 12;
        let Some(tag) = read_u16(entry) else {
            break;
        };
        match tag {
            // SHORT, stored left-justified in the value field
            TAG_ORIENTATION => {
                if let Some(orientation) = read_u16(entry + 8).and_then(Orientation::from_exif) {
                    summary.orientation = orientation;
                }
            }
            TAG_GPS_IFD => summary.has_gps = true,
            TAG_MAKE | TAG_MODEL => summary.has_device_info = true,
            _ => {}
        }
    }

    summary
}
