//! Field codec: MARC 21 (ISO 2709) transmission format <-> [`CatalogRecord`].
//!
//! ## Wire layout
//!
//! ```text
//! leader:     24 bytes   [0..5] record length, [12..17] base address of data
//! directory:  12 bytes per field, then 0x1E
//!             tag (3) | field length (4) | start offset from base (5)
//! data:       control field = raw bytes + 0x1E
//!             data field    = ind1 ind2 (0x1F code value)* 0x1E
//! trailer:    0x1D
//! ```
//!
//! Decoding keeps field order and every subfield occurrence. Encoding
//! recomputes the record length and base address; everything else in the
//! leader is carried through.

use crate::error::CodecError;
use crate::record::{CatalogRecord, Field, FieldBody, Indicators, Leader, Tag, LEADER_LEN};
use crate::subfields::Subfields;
use std::io::Read;

/// Subfield delimiter.
pub const SUBFIELD_DELIMITER: u8 = 0x1F;
/// Field terminator.
pub const FIELD_TERMINATOR: u8 = 0x1E;
/// Record terminator.
pub const RECORD_TERMINATOR: u8 = 0x1D;

const DIRECTORY_ENTRY_LEN: usize = 12;
const MAX_RECORD_LEN: usize = 99_999;
const MAX_FIELD_LEN: usize = 9_999;

// ============================================================================
// Decode
// ============================================================================

/// Decode one record from `bytes`.
///
/// `bytes` may extend past the record; only the declared length is read.
pub fn decode(bytes: &[u8]) -> Result<CatalogRecord, CodecError> {
    if bytes.len() < LEADER_LEN {
        return Err(CodecError::TooShort(bytes.len()));
    }
    let declared = parse_decimal(&bytes[0..5], "record length")?;
    if declared > bytes.len() {
        return Err(CodecError::Truncated {
            declared,
            available: bytes.len(),
        });
    }
    if declared < LEADER_LEN {
        return Err(CodecError::InvalidLeader(format!(
            "record length {declared} is shorter than the leader"
        )));
    }
    let record = &bytes[..declared];
    let base = parse_decimal(&record[12..17], "base address")?;
    if base <= LEADER_LEN || base > record.len() {
        return Err(CodecError::InvalidLeader(format!(
            "base address {base} outside record of {declared} bytes"
        )));
    }

    let leader = Leader::new(&String::from_utf8_lossy(&record[..LEADER_LEN]));

    // Directory runs from the leader to the terminator just before `base`.
    let directory = &record[LEADER_LEN..base];
    let dir_end = directory
        .iter()
        .position(|b| *b == FIELD_TERMINATOR)
        .ok_or_else(|| CodecError::InvalidDirectory("missing terminator".into()))?;
    let directory = &directory[..dir_end];
    if directory.len() % DIRECTORY_ENTRY_LEN != 0 {
        return Err(CodecError::InvalidDirectory(format!(
            "length {} is not a multiple of {DIRECTORY_ENTRY_LEN}",
            directory.len()
        )));
    }

    let body = &record[base..];
    let mut fields = Vec::with_capacity(directory.len() / DIRECTORY_ENTRY_LEN);
    for entry in directory.chunks_exact(DIRECTORY_ENTRY_LEN) {
        let tag_str = String::from_utf8_lossy(&entry[0..3]);
        let tag = Tag::parse(&tag_str)?;
        let len = parse_decimal(&entry[3..7], "field length")
            .map_err(|_| CodecError::InvalidDirectory(format!("bad length for {tag}")))?;
        let start = parse_decimal(&entry[7..12], "field start")
            .map_err(|_| CodecError::InvalidDirectory(format!("bad start for {tag}")))?;
        let raw = body
            .get(start..start + len)
            .ok_or_else(|| CodecError::FieldOutOfBounds {
                tag: tag.to_string(),
                start,
                len,
            })?;
        fields.push(decode_field(tag, raw));
    }

    Ok(CatalogRecord { leader, fields })
}

fn decode_field(tag: Tag, raw: &[u8]) -> Field {
    let raw = raw.strip_suffix(&[FIELD_TERMINATOR]).unwrap_or(raw);
    if tag.is_control() {
        return Field::control(tag, String::from_utf8_lossy(raw).into_owned());
    }

    // Short fields: pad missing indicators with blanks.
    let ind1 = raw.first().map(|b| *b as char).unwrap_or(' ');
    let ind2 = raw.get(1).map(|b| *b as char).unwrap_or(' ');
    let indicators = Indicators::new(sanitize_indicator(ind1), sanitize_indicator(ind2));

    let mut subfields = Subfields::new();
    let stream = raw.get(2..).unwrap_or(&[]);
    for chunk in stream.split(|b| *b == SUBFIELD_DELIMITER).skip(1) {
        // An empty chunk is a bare delimiter with no code; nothing to keep.
        let Some((&code, value)) = chunk.split_first() else {
            continue;
        };
        subfields.push(code as char, String::from_utf8_lossy(value).into_owned());
    }

    Field::with_subfields(tag, indicators, subfields)
}

fn sanitize_indicator(c: char) -> char {
    if c.is_ascii_graphic() {
        c
    } else {
        ' '
    }
}

fn parse_decimal(bytes: &[u8], what: &str) -> Result<usize, CodecError> {
    let s = std::str::from_utf8(bytes)
        .map_err(|_| CodecError::InvalidLeader(format!("{what} is not ASCII")))?;
    s.trim_start()
        .parse::<usize>()
        .map_err(|_| CodecError::InvalidLeader(format!("{what} {s:?} is not numeric")))
}

// ============================================================================
// Encode
// ============================================================================

/// Encode a record in field order.
pub fn encode(record: &CatalogRecord) -> Result<Vec<u8>, CodecError> {
    let mut directory = Vec::with_capacity(record.fields.len() * DIRECTORY_ENTRY_LEN + 1);
    let mut data = Vec::new();

    for field in &record.fields {
        let start = data.len();
        encode_field(field, &mut data)?;
        let len = data.len() - start;
        if len > MAX_FIELD_LEN {
            return Err(CodecError::TooLarge(format!("field {}", field.tag)));
        }
        if start > MAX_RECORD_LEN {
            return Err(CodecError::TooLarge("record".into()));
        }
        directory.extend_from_slice(field.tag.as_str().as_bytes());
        directory.extend_from_slice(format!("{len:04}{start:05}").as_bytes());
    }
    directory.push(FIELD_TERMINATOR);
    data.push(RECORD_TERMINATOR);

    let base = LEADER_LEN + directory.len();
    let total = base + data.len();
    if total > MAX_RECORD_LEN {
        return Err(CodecError::TooLarge("record".into()));
    }

    let leader = record.leader.as_str().as_bytes();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(format!("{total:05}").as_bytes());
    out.extend_from_slice(&leader[5..12]);
    out.extend_from_slice(format!("{base:05}").as_bytes());
    out.extend_from_slice(&leader[17..LEADER_LEN]);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&data);
    Ok(out)
}

fn encode_field(field: &Field, out: &mut Vec<u8>) -> Result<(), CodecError> {
    match &field.body {
        FieldBody::Control(value) => {
            push_checked(out, value, field.tag)?;
        }
        FieldBody::Data {
            indicators,
            subfields,
        } => {
            for ind in [indicators.ind1, indicators.ind2] {
                if !ind.is_ascii() || ind.is_ascii_control() {
                    return Err(CodecError::ReservedByte {
                        tag: field.tag.to_string(),
                    });
                }
                out.push(ind as u8);
            }
            for sf in subfields {
                if !sf.code.is_ascii() || sf.code.is_ascii_control() {
                    return Err(CodecError::ReservedByte {
                        tag: field.tag.to_string(),
                    });
                }
                out.push(SUBFIELD_DELIMITER);
                out.push(sf.code as u8);
                push_checked(out, &sf.value, field.tag)?;
            }
        }
    }
    out.push(FIELD_TERMINATOR);
    Ok(())
}

fn push_checked(out: &mut Vec<u8>, value: &str, tag: Tag) -> Result<(), CodecError> {
    if value
        .bytes()
        .any(|b| matches!(b, SUBFIELD_DELIMITER | FIELD_TERMINATOR | RECORD_TERMINATOR))
    {
        return Err(CodecError::ReservedByte {
            tag: tag.to_string(),
        });
    }
    out.extend_from_slice(value.as_bytes());
    Ok(())
}

// ============================================================================
// Streaming
// ============================================================================

/// Read the raw bytes of the next record from a stream.
///
/// Returns `Ok(None)` at a clean end of stream. The record length comes from
/// the record's own 5-digit prefix.
pub fn read_next<R: Read>(reader: &mut R) -> std::io::Result<Option<Vec<u8>>> {
    let mut prefix = [0u8; 5];
    let mut filled = 0;
    while filled < prefix.len() {
        let n = reader.read(&mut prefix[filled..])?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "truncated record length prefix",
            ));
        }
        filled += n;
    }
    let declared = parse_decimal(&prefix, "record length")
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    if declared < LEADER_LEN {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("record length {declared} is shorter than the leader"),
        ));
    }
    let mut buf = vec![0u8; declared];
    buf[..5].copy_from_slice(&prefix);
    reader.read_exact(&mut buf[5..])?;
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CatalogRecord {
        let mut rec = CatalogRecord::new();
        rec.push(Field::control(Tag::from_static(b"001"), "ocm00012345"));
        rec.push(Field::control(
            Tag::from_static(b"008"),
            "850101s1985    dcu           f000 0 eng d",
        ));
        rec.push(
            Field::data(Tag::from_static(b"245"), Indicators::new('1', '0'))
                .subfield('a', "Annual report /")
                .subfield('c', "Bureau of Mines."),
        );
        rec.push(
            Field::data(Tag::from_static(b"650"), Indicators::new(' ', '0'))
                .subfield('a', "Mines")
                .subfield('z', "United States")
                .subfield('a', "Statistics"),
        );
        rec.push(Field::data(Tag::from_static(b"500"), Indicators::BLANK));
        rec
    }

    #[test]
    fn roundtrip_preserves_order_and_repeats() {
        let rec = sample();
        let bytes = encode(&rec).unwrap();
        let back = decode(&bytes).unwrap();
        assert_eq!(back.fields, rec.fields);
        assert_eq!(back.normalized(), rec.normalized());
        assert_eq!(back.fields[3].values('a'), vec!["Mines", "Statistics"]);
    }

    #[test]
    fn empty_data_field_survives() {
        let bytes = encode(&sample()).unwrap();
        let back = decode(&bytes).unwrap();
        let note = back.first_field("500").unwrap();
        assert!(note.subfields().unwrap().is_empty());
        assert_eq!(note.indicators(), Some(Indicators::BLANK));
    }

    #[test]
    fn leader_length_and_base_are_recomputed() {
        let bytes = encode(&sample()).unwrap();
        let len: usize = std::str::from_utf8(&bytes[0..5]).unwrap().parse().unwrap();
        assert_eq!(len, bytes.len());
        assert_eq!(*bytes.last().unwrap(), RECORD_TERMINATOR);
        let base: usize = std::str::from_utf8(&bytes[12..17]).unwrap().parse().unwrap();
        assert_eq!(bytes[base - 1], FIELD_TERMINATOR);
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut bytes = encode(&sample()).unwrap();
        bytes.extend_from_slice(b"garbage");
        assert_eq!(decode(&bytes).unwrap().fields, sample().fields);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(decode(b"0001"), Err(CodecError::TooShort(4))));
        assert!(matches!(
            decode(b"abcdefghijklmnopqrstuvwxyz"),
            Err(CodecError::InvalidLeader(_))
        ));
        let bytes = encode(&sample()).unwrap();
        assert!(matches!(
            decode(&bytes[..bytes.len() - 10]),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn rejects_delimiters_in_values() {
        let mut rec = CatalogRecord::new();
        rec.push(Field::data(Tag::from_static(b"245"), Indicators::BLANK).subfield('a', "bad\x1evalue"));
        assert!(matches!(encode(&rec), Err(CodecError::ReservedByte { .. })));
    }

    #[test]
    fn read_next_walks_a_stream() {
        let a = encode(&sample()).unwrap();
        let mut b_rec = sample();
        b_rec.push(Field::data(Tag::from_static(b"490"), Indicators::BLANK).subfield('a', "Series"));
        let b = encode(&b_rec).unwrap();
        let mut stream = Vec::new();
        stream.extend_from_slice(&a);
        stream.extend_from_slice(&b);

        let mut cursor = std::io::Cursor::new(stream);
        assert_eq!(read_next(&mut cursor).unwrap().unwrap(), a);
        assert_eq!(read_next(&mut cursor).unwrap().unwrap(), b);
        assert!(read_next(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn decode_handles_short_data_fields() {
        // One data field "245" whose body is just the terminator.
        let mut rec = CatalogRecord::new();
        rec.push(Field::control(Tag::from_static(b"001"), "x"));
        let mut bytes = encode(&rec).unwrap();
        // Rewrite tag 001 -> 245 in the directory so the body has no indicators.
        bytes[24..27].copy_from_slice(b"245");
        let back = decode(&bytes).unwrap();
        assert_eq!(back.fields[0].indicators(), Some(Indicators::new('x', ' ')));
        assert!(back.fields[0].subfields().unwrap().is_empty());
    }
}
