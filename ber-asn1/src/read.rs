//! BER/DER read routines
//!
//! Decoding functions for primitive values and constructed-object headers.
//! All functions take a [`Stream`] positioned at the tag octet (unless noted
//! otherwise) and leave it at the first byte after the decoded item.
//!
//! # Tag Selection
//!
//! Most readers take `tag: Option<u32>`: `None` expects the type's universal
//! tag, `Some(n)` expects the context-specific tag `[n]` instead. Character
//! strings are the exception, the caller always supplies the literal tag
//! because the tag is what distinguishes the string types.
//!
//! # Length Handling
//!
//! Ordinary reads cap declared lengths at [`MAX_SHORT_LENGTH`]; the
//! `read_long_*` variants cap at [`MAX_LONG_LENGTH`] and always tolerate
//! indefinite lengths. Length octets from non-conformant encoders may carry
//! leading zero bytes; up to 8 raw octets are accepted as long as no more
//! than 2 (short reads) or 4 (long reads) significant bytes remain.

use ber_core::limits::{MAX_LONG_LENGTH, MAX_OID_SIZE, MAX_SHORT_LENGTH};
use ber_core::{Asn1Error, Asn1Result, Stream};

use crate::tags::{Tag, TagClass};

/// Decoded length field of a TLV
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    /// Definite length in bytes
    Definite(usize),
    /// Indefinite length, content runs until a matching EOC
    Indefinite,
}

impl Length {
    /// The definite byte count, or `None` for indefinite
    pub fn definite(self) -> Option<usize> {
        match self {
            Length::Definite(n) => Some(n),
            Length::Indefinite => None,
        }
    }
}

/// How a length field is to be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LengthForm {
    /// Ordinary ceiling, indefinite is an error
    Short,
    /// Ordinary ceiling, indefinite reported to the caller
    ShortIndef,
    /// Long-object ceiling, indefinite reported to the caller
    LongIndef,
}

/// Read the length octets for an ASN.1 item.
///
/// Tolerates the non-canonical encodings some encoders produce (up to 8
/// length octets with leading zeros) while still bounding the significant
/// part to 2 or 4 bytes.
pub(crate) fn read_length_value(stream: &mut Stream, form: LengthForm) -> Asn1Result<Length> {
    let short_form = matches!(form, LengthForm::Short | LengthForm::ShortIndef);

    let first = stream.read_byte()?;
    if first & 0x80 == 0 {
        return Ok(Length::Definite(first as usize));
    }

    let mut count = (first & 0x7F) as usize;
    if count == 0 {
        if form == LengthForm::Short {
            return Err(stream.set_error(Asn1Error::BadData(
                "indefinite length not allowed here".to_string(),
            )));
        }
        return Ok(Length::Indefinite);
    }
    if count > 8 {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "length-of-length {} exceeds 8 octets",
            count
        ))));
    }
    let mut octets = [0u8; 8];
    stream.read_into(&mut octets[..count])?;

    // Leading zero octets from broken encoders (some use a fixed-width
    // big-endian length for everything), strip them before range checks
    let mut start = 0;
    while start < count && octets[start] == 0 {
        start += 1;
    }
    count -= start;
    if count == 0 {
        return Ok(Length::Definite(0));
    }

    if count > 4 {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "{} significant length octets",
            count
        ))));
    }
    if short_form && count > 2 {
        return Err(stream.set_error(Asn1Error::Overflow(format!(
            "{} significant length octets for a short read",
            count
        ))));
    }

    let mut length: i64 = 0;
    for &byte in &octets[start..start + count] {
        length = (length << 8) | byte as i64;
    }
    let ceiling = if short_form {
        MAX_SHORT_LENGTH
    } else {
        MAX_LONG_LENGTH
    };
    if length > ceiling {
        return Err(stream.set_error(Asn1Error::Overflow(format!(
            "length {} exceeds ceiling {}",
            length, ceiling
        ))));
    }
    Ok(Length::Definite(length as usize))
}

/// Read a short-form length that the form guarantees to be definite
fn read_definite_length(stream: &mut Stream, form: LengthForm) -> Asn1Result<usize> {
    match read_length_value(stream, form)? {
        Length::Definite(n) => Ok(n),
        Length::Indefinite => Err(stream.set_error(Asn1Error::Internal(
            "indefinite length past a definite-only read".to_string(),
        ))),
    }
}

/// Map an optional context tag number to the expected tag
fn select_tag(tag: Option<u32>, default: Tag) -> Tag {
    match tag {
        None => default,
        Some(n) => Tag::context(n),
    }
}

/// Read a tag and require it to be exactly `expected`
fn expect_tag(stream: &mut Stream, expected: Tag) -> Asn1Result<()> {
    let tag = Tag::read(stream)?;
    if tag != expected {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "expected tag {:?}, got {:?}",
            expected, tag
        ))));
    }
    Ok(())
}

/// Check for end-of-contents octets at the current position.
///
/// Returns `Ok(true)` and consumes the two octets if an EOC is present,
/// `Ok(false)` without advancing otherwise. An EOC tag followed by a
/// non-zero length octet is malformed.
pub fn check_eoc(stream: &mut Stream) -> Asn1Result<bool> {
    if stream.peek_byte()? != 0x00 {
        return Ok(false);
    }
    stream.read_byte()?;
    if stream.read_byte()? != 0 {
        return Err(stream.set_error(Asn1Error::BadData(
            "EOC tag with non-zero length".to_string(),
        )));
    }
    Ok(true)
}

/// Read an INTEGER header and strip sign-padding zero bytes.
///
/// Returns the number of magnitude bytes left to read (possibly zero: some
/// broken encoders emit numeric zero as a zero-length value). The encoded
/// form is signed while the value is handled as an unsigned magnitude, so
/// every leading zero byte goes, including ones from encodings of zero
/// itself.
fn read_integer_header(stream: &mut Stream, tag: Option<u32>) -> Asn1Result<usize> {
    expect_tag(stream, select_tag(tag, Tag::INTEGER))?;
    let mut length = read_definite_length(stream, LengthForm::Short)?;
    while length > 0 && stream.peek_byte()? == 0 {
        stream.read_byte()?;
        length -= 1;
    }
    Ok(length)
}

/// Copy `length` declared bytes into `dest`, truncating at the buffer size.
///
/// The copy never overflows the destination: excess declared bytes are
/// skipped and the truncated count is returned.
fn read_constrained_data(stream: &mut Stream, dest: &mut [u8], length: usize) -> Asn1Result<usize> {
    let copied = length.min(dest.len());
    stream.read_into(&mut dest[..copied])?;
    if length > copied {
        stream.skip(length - copied)?;
    }
    Ok(copied)
}

/// Read a BOOLEAN
pub fn read_boolean(stream: &mut Stream, tag: Option<u32>) -> Asn1Result<bool> {
    expect_tag(stream, select_tag(tag, Tag::BOOLEAN))?;
    let length = stream.read_byte()?;
    if length != 1 {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "BOOLEAN length {} (must be 1)",
            length
        ))));
    }
    // Any non-zero content byte reads as true; strict DER says 0xFF but
    // enough encoders emit other values that rejecting them loses real data
    Ok(stream.read_byte()? != 0)
}

/// Read a NULL
pub fn read_null(stream: &mut Stream, tag: Option<u32>) -> Asn1Result<()> {
    expect_tag(stream, select_tag(tag, Tag::NULL))?;
    if stream.read_byte()? != 0 {
        return Err(stream.set_error(Asn1Error::BadData(
            "NULL with non-zero length".to_string(),
        )));
    }
    Ok(())
}

/// Read an INTEGER small enough for a numeric return value.
///
/// Values wider than 31 bits of magnitude are rejected; larger integers go
/// through [`read_integer`] as byte blobs.
pub fn read_short_integer(stream: &mut Stream, tag: Option<u32>) -> Asn1Result<i64> {
    let length = read_integer_header(stream, tag)?;
    if length == 0 {
        return Ok(0);
    }
    if length > 4 {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "integer magnitude {} bytes wide",
            length
        ))));
    }
    let mut value: i64 = 0;
    for _ in 0..length {
        value = (value << 8) | stream.read_byte()? as i64;
    }
    if value > i32::MAX as i64 {
        return Err(stream.set_error(Asn1Error::BadData(
            "integer value overflow".to_string(),
        )));
    }
    Ok(value)
}

/// Read an ENUMERATED value (encoded like INTEGER)
pub fn read_enumerated(stream: &mut Stream, tag: Option<u32>) -> Asn1Result<i32> {
    expect_tag(stream, select_tag(tag, Tag::ENUMERATED))?;
    let mut length = read_definite_length(stream, LengthForm::Short)?;
    while length > 0 && stream.peek_byte()? == 0 {
        stream.read_byte()?;
        length -= 1;
    }
    if length > 4 {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "enumeration {} bytes wide",
            length
        ))));
    }
    let mut value: i64 = 0;
    for _ in 0..length {
        value = (value << 8) | stream.read_byte()? as i64;
    }
    // Sanity cap, no enumeration in scope goes anywhere near this
    if value > 1000 {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "enumeration value {}",
            value
        ))));
    }
    Ok(value as i32)
}

/// Read a (possibly large) INTEGER as an unsigned big-endian magnitude.
///
/// Returns the number of bytes written to `dest`; a declared length larger
/// than the buffer truncates the copy.
pub fn read_integer(stream: &mut Stream, dest: &mut [u8], tag: Option<u32>) -> Asn1Result<usize> {
    let length = read_integer_header(stream, tag)?;
    if length == 0 {
        return Ok(0);
    }
    read_constrained_data(stream, dest, length)
}

/// Read and discard one universal item whose tag has been consumed already
pub fn read_universal_data(stream: &mut Stream) -> Asn1Result<()> {
    match read_definite_length(stream, LengthForm::Short)? {
        0 => Ok(()),
        n => stream.skip(n),
    }
}

/// Read and discard one unknown or unwanted universal item
pub fn read_universal(stream: &mut Stream) -> Asn1Result<()> {
    Tag::read(stream)?;
    read_universal_data(stream)
}

/// Read one complete small TLV (tag, length, content) into `dest`.
///
/// Used for blob types like OIDs that are only ever handled in encoded
/// form. Only single-byte and `81 xx` length encodings are accepted, so
/// indefinite and over-256-byte objects are rejected up front. Returns the
/// total number of bytes written.
pub fn read_raw_object(stream: &mut Stream, dest: &mut [u8], tag: Tag) -> Asn1Result<usize> {
    let mut offset = 0;
    let object_tag = Tag::read(stream)?;
    if object_tag != tag {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "expected tag {:?}, got {:?}",
            tag, object_tag
        ))));
    }
    let encoded_tag = tag.encode();
    if dest.len() < encoded_tag.len() + 1 {
        return Err(stream.set_error(Asn1Error::Overflow(
            "raw object buffer too small for header".to_string(),
        )));
    }
    dest[..encoded_tag.len()].copy_from_slice(&encoded_tag);
    offset += encoded_tag.len();

    let mut length = stream.read_byte()? as usize;
    dest[offset] = length as u8;
    offset += 1;
    if length & 0x80 != 0 {
        // Indefinite or longer than 256 bytes is not a small object
        if length != 0x81 {
            return Err(stream.set_error(Asn1Error::BadData(
                "raw object with oversize length encoding".to_string(),
            )));
        }
        length = stream.read_byte()? as usize;
        if offset >= dest.len() {
            return Err(stream.set_error(Asn1Error::Overflow(
                "raw object buffer too small for header".to_string(),
            )));
        }
        dest[offset] = length as u8;
        offset += 1;
    }
    if offset + length > dest.len() {
        return Err(stream.set_error(Asn1Error::Overflow(format!(
            "raw object of {} bytes exceeds buffer",
            offset + length
        ))));
    }
    if length > 0 {
        stream.read_into(&mut dest[offset..offset + length])?;
    }
    Ok(offset + length)
}

/// One entry of an OID selection table: the full encoding (tag and length
/// included) plus the id handed back when it matches
#[derive(Debug, Clone, Copy)]
pub struct OidInfo<'a> {
    pub oid: &'a [u8],
    pub selection: i32,
}

/// Read an OID and match it against a table of permitted values.
///
/// Returns the matching entry's selection id; an OID not in the table is
/// malformed data as far as the caller is concerned.
pub fn read_oid(stream: &mut Stream, table: &[OidInfo]) -> Asn1Result<i32> {
    let mut buffer = [0u8; MAX_OID_SIZE];
    let length = read_raw_object(stream, &mut buffer, Tag::OBJECT_IDENTIFIER)?;
    if length < 2 || length != 2 + buffer[1] as usize {
        return Err(stream.set_error(Asn1Error::BadData(
            "OID length does not match header".to_string(),
        )));
    }
    for entry in table {
        if entry.oid.len() == length && entry.oid == &buffer[..length] {
            return Ok(entry.selection);
        }
    }
    Err(stream.set_error(Asn1Error::BadData(
        "OID not in permitted set".to_string(),
    )))
}

/// Read an OID and require it to be exactly `oid` (full encoding)
pub fn read_fixed_oid(stream: &mut Stream, oid: &[u8]) -> Asn1Result<()> {
    read_oid(stream, &[OidInfo { oid, selection: 0 }]).map(|_| ())
}

/// Read a raw OID in encoded form into `dest`, returning its total size.
///
/// The result must be at least a minimal-length OID: tag, length, and three
/// content bytes.
pub fn read_encoded_oid(stream: &mut Stream, dest: &mut [u8]) -> Asn1Result<usize> {
    let length = read_raw_object(stream, dest, Tag::OBJECT_IDENTIFIER)?;
    if length < 1 + 1 + 3 {
        return Err(stream.set_error(Asn1Error::BadData(
            "OID below minimal length".to_string(),
        )));
    }
    Ok(length)
}

/// Shared body of the octet/character string readers
fn read_string(
    stream: &mut Stream,
    dest: &mut [u8],
    min_length: usize,
    tag: Tag,
) -> Asn1Result<usize> {
    expect_tag(stream, tag)?;
    let length = read_definite_length(stream, LengthForm::Short)?;
    if length < min_length {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "string length {} below minimum {}",
            length, min_length
        ))));
    }
    if length == 0 {
        return Ok(0);
    }
    read_constrained_data(stream, dest, length)
}

/// Read an OCTET STRING, truncating at the destination size
pub fn read_octet_string(
    stream: &mut Stream,
    dest: &mut [u8],
    min_length: usize,
    tag: Option<u32>,
) -> Asn1Result<usize> {
    read_string(stream, dest, min_length, select_tag(tag, Tag::OCTET_STRING))
}

/// Read any of the character string types.
///
/// Polymorphic over the tag: the caller always supplies it literally since
/// the tag is what identifies the string type.
pub fn read_character_string(stream: &mut Stream, dest: &mut [u8], tag: Tag) -> Asn1Result<usize> {
    read_string(stream, dest, 1, tag)
}

/// Read a BIT STRING into an integer value.
///
/// ASN.1 numbers bits from bit 0 of the first content byte, so the bit
/// order is reversed relative to the machine representation. Bit strings
/// wider than 32 bits are not representable and are rejected.
pub fn read_bit_string(stream: &mut Stream, tag: Option<u32>) -> Asn1Result<u32> {
    expect_tag(stream, select_tag(tag, Tag::BIT_STRING))?;
    let declared = stream.read_byte()? as i32 - 1;
    let unused = stream.read_byte()?;
    if declared < 0 || declared > 4 || unused > 7 {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "bit string of {} bytes with {} unused bits",
            declared, unused
        ))));
    }
    if declared == 0 {
        return Ok(0);
    }
    let bit_count = declared * 8 - unused as i32;

    let mut data = stream.read_byte()? as u32;
    let mut mask = 0x80u32;
    let mut remaining = bit_count - 8;
    while remaining > 0 {
        data = (data << 8) | stream.read_byte()? as u32;
        mask <<= 8;
        remaining -= 8;
    }
    let mut value = 0u32;
    let mut flag = 1u32;
    for _ in 0..bit_count {
        if data & mask != 0 {
            value |= flag;
        }
        flag = flag.wrapping_shl(1);
        data = data.wrapping_shl(1);
    }
    Ok(value)
}

/// What tag a constructed-object header read will accept
#[derive(Debug, Clone, Copy)]
enum Expected {
    /// Exactly this tag
    Exact(Tag),
    /// Any context-specific tag, or one of the universal types that can
    /// carry nested content: BIT STRING, OCTET STRING (either form),
    /// SEQUENCE, SET
    AnyHole,
}

fn read_object_tag(stream: &mut Stream, expected: Expected) -> Asn1Result<Tag> {
    let tag = Tag::read(stream)?;
    let ok = match expected {
        Expected::Exact(want) => tag == want,
        Expected::AnyHole => {
            tag.class() == TagClass::ContextSpecific
                || tag == Tag::BIT_STRING
                || tag == Tag::OCTET_STRING
                || tag == Tag::OCTET_STRING_CONSTRUCTED
                || tag == Tag::SEQUENCE
                || tag == Tag::SET
        }
    };
    if !ok {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "unexpected tag {:?} for constructed object",
            tag
        ))));
    }
    Ok(tag)
}

/// Read the header of a constructed object or string hole, leaving the
/// stream at the first content byte
fn read_object_header(
    stream: &mut Stream,
    min_length: usize,
    expected: Expected,
    is_bit_string: bool,
    indef_ok: bool,
) -> Asn1Result<Length> {
    read_object_tag(stream, expected)?;
    let form = if indef_ok {
        LengthForm::ShortIndef
    } else {
        LengthForm::Short
    };
    let mut length = read_length_value(stream, form)?;

    // A bit string hole carries the unused-bits octet in front of the
    // content proper; consume it and account for it in the length
    if is_bit_string {
        if let Length::Definite(n) = length {
            if n == 0 {
                return Err(stream.set_error(Asn1Error::BadData(
                    "bit string without unused-bits octet".to_string(),
                )));
            }
            length = Length::Definite(n - 1);
        }
        stream.read_byte()?;
    }

    if let Length::Definite(n) = length {
        if n < min_length {
            return Err(stream.set_error(Asn1Error::BadData(format!(
                "constructed object length {} below minimum {}",
                n, min_length
            ))));
        }
    }
    Ok(length)
}

fn definite_only(length: Length) -> Asn1Result<usize> {
    match length {
        Length::Definite(n) => Ok(n),
        Length::Indefinite => Err(Asn1Error::Internal(
            "indefinite length past a definite-only read".to_string(),
        )),
    }
}

/// Read a SEQUENCE header, returning the content length
pub fn read_sequence(stream: &mut Stream) -> Asn1Result<usize> {
    read_object_header(stream, 0, Expected::Exact(Tag::SEQUENCE), false, false)
        .and_then(definite_only)
}

/// Read a SEQUENCE header, tolerating indefinite length
pub fn read_sequence_indef(stream: &mut Stream) -> Asn1Result<Length> {
    read_object_header(stream, 0, Expected::Exact(Tag::SEQUENCE), false, true)
}

/// Read a SET header, returning the content length
pub fn read_set(stream: &mut Stream) -> Asn1Result<usize> {
    read_object_header(stream, 0, Expected::Exact(Tag::SET), false, false).and_then(definite_only)
}

/// Read a SET header, tolerating indefinite length
pub fn read_set_indef(stream: &mut Stream) -> Asn1Result<Length> {
    read_object_header(stream, 0, Expected::Exact(Tag::SET), false, true)
}

/// Read a constructed-object header: SEQUENCE by default, or the
/// context-specific constructed tag `[n]`
pub fn read_constructed(stream: &mut Stream, tag: Option<u32>) -> Asn1Result<usize> {
    let expected = match tag {
        None => Tag::SEQUENCE,
        Some(n) => Tag::context_constructed(n),
    };
    read_object_header(stream, 0, Expected::Exact(expected), false, false).and_then(definite_only)
}

/// Indefinite-tolerant form of [`read_constructed`]
pub fn read_constructed_indef(stream: &mut Stream, tag: Option<u32>) -> Asn1Result<Length> {
    let expected = match tag {
        None => Tag::SEQUENCE,
        Some(n) => Tag::context_constructed(n),
    };
    read_object_header(stream, 0, Expected::Exact(expected), false, true)
}

/// Read the header of an OCTET STRING hole, leaving the content unread
pub fn read_octet_string_hole(
    stream: &mut Stream,
    min_length: usize,
    tag: Option<u32>,
) -> Asn1Result<usize> {
    let expected = select_tag(tag, Tag::OCTET_STRING);
    read_object_header(stream, min_length, Expected::Exact(expected), false, false)
        .and_then(definite_only)
}

/// Read the header of a BIT STRING hole, consuming the unused-bits octet
/// and leaving the content unread
pub fn read_bit_string_hole(
    stream: &mut Stream,
    min_length: usize,
    tag: Option<u32>,
) -> Asn1Result<usize> {
    let expected = select_tag(tag, Tag::BIT_STRING);
    read_object_header(stream, min_length, Expected::Exact(expected), true, false)
        .and_then(definite_only)
}

/// Read the header of any hole-capable object: an exact tag if given,
/// otherwise any context-specific tag or nesting-capable universal type
pub fn read_generic_hole(
    stream: &mut Stream,
    min_length: usize,
    tag: Option<Tag>,
) -> Asn1Result<usize> {
    let expected = tag.map(Expected::Exact).unwrap_or(Expected::AnyHole);
    read_object_header(stream, min_length, expected, false, false).and_then(definite_only)
}

/// Indefinite-tolerant form of [`read_generic_hole`]
pub fn read_generic_hole_indef(
    stream: &mut Stream,
    min_length: usize,
    tag: Option<Tag>,
) -> Asn1Result<Length> {
    let expected = tag.map(Expected::Exact).unwrap_or(Expected::AnyHole);
    read_object_header(stream, min_length, expected, false, true)
}

/// Read a long-object header.
///
/// Used where potentially huge but trusted data would fail the ordinary
/// sanity ceiling. Indefinite lengths are always tolerated, they are likely
/// for large objects.
fn read_long_object_header(stream: &mut Stream, expected: Expected) -> Asn1Result<Length> {
    read_object_tag(stream, expected)?;
    read_length_value(stream, LengthForm::LongIndef)
}

/// Read an abnormally large SEQUENCE header
pub fn read_long_sequence(stream: &mut Stream) -> Asn1Result<Length> {
    read_long_object_header(stream, Expected::Exact(Tag::SEQUENCE))
}

/// Read an abnormally large SET header
pub fn read_long_set(stream: &mut Stream) -> Asn1Result<Length> {
    read_long_object_header(stream, Expected::Exact(Tag::SET))
}

/// Read an abnormally large constructed-object header
pub fn read_long_constructed(stream: &mut Stream, tag: Option<u32>) -> Asn1Result<Length> {
    let expected = match tag {
        None => Tag::SEQUENCE,
        Some(n) => Tag::context_constructed(n),
    };
    read_long_object_header(stream, Expected::Exact(expected))
}

/// Read an abnormally large generic hole header
pub fn read_long_generic_hole(stream: &mut Stream, tag: Option<Tag>) -> Asn1Result<Length> {
    let expected = tag.map(Expected::Exact).unwrap_or(Expected::AnyHole);
    read_long_object_header(stream, expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_short_form() {
        let data = [0x7F];
        let mut stream = Stream::new(&data);
        assert_eq!(
            read_length_value(&mut stream, LengthForm::Short).unwrap(),
            Length::Definite(127)
        );
    }

    #[test]
    fn test_length_long_form() {
        let data = [0x82, 0x01, 0x00];
        let mut stream = Stream::new(&data);
        assert_eq!(
            read_length_value(&mut stream, LengthForm::Short).unwrap(),
            Length::Definite(256)
        );
    }

    #[test]
    fn test_length_leading_zeros_tolerated() {
        // Big-endian 32-bit length encoding of 5, seen from non-conformant
        // encoders
        let data = [0x84, 0x00, 0x00, 0x00, 0x05];
        let mut stream = Stream::new(&data);
        assert_eq!(
            read_length_value(&mut stream, LengthForm::Short).unwrap(),
            Length::Definite(5)
        );
    }

    #[test]
    fn test_length_short_ceiling() {
        let data = [0x82, 0x80, 0x00];
        let mut stream = Stream::new(&data);
        assert!(matches!(
            read_length_value(&mut stream, LengthForm::Short),
            Err(Asn1Error::Overflow(_))
        ));
    }

    #[test]
    fn test_length_long_accepts_wide_values() {
        let data = [0x83, 0x10, 0x00, 0x00];
        let mut stream = Stream::new(&data);
        assert_eq!(
            read_length_value(&mut stream, LengthForm::LongIndef).unwrap(),
            Length::Definite(0x100000)
        );
    }

    #[test]
    fn test_length_indefinite_policy() {
        let mut stream = Stream::new(&[0x80]);
        assert!(read_length_value(&mut stream, LengthForm::Short).is_err());

        let mut stream = Stream::new(&[0x80]);
        assert_eq!(
            read_length_value(&mut stream, LengthForm::ShortIndef).unwrap(),
            Length::Indefinite
        );
    }

    #[test]
    fn test_read_boolean() {
        let mut stream = Stream::new(&[0x01, 0x01, 0xFF]);
        assert!(read_boolean(&mut stream, None).unwrap());

        let mut stream = Stream::new(&[0x01, 0x01, 0x00]);
        assert!(!read_boolean(&mut stream, None).unwrap());

        // Length must be exactly one
        let mut stream = Stream::new(&[0x01, 0x02, 0x00, 0xFF]);
        assert!(read_boolean(&mut stream, None).is_err());
    }

    #[test]
    fn test_read_boolean_context_tag() {
        let mut stream = Stream::new(&[0x83, 0x01, 0xFF]);
        assert!(read_boolean(&mut stream, Some(3)).unwrap());
    }

    #[test]
    fn test_read_null() {
        let mut stream = Stream::new(&[0x05, 0x00]);
        read_null(&mut stream, None).unwrap();

        let mut stream = Stream::new(&[0x05, 0x01, 0x00]);
        assert!(read_null(&mut stream, None).is_err());
    }

    #[test]
    fn test_read_short_integer() {
        let mut stream = Stream::new(&[0x02, 0x01, 0x00]);
        assert_eq!(read_short_integer(&mut stream, None).unwrap(), 0);

        // Sign-avoidance padding byte stripped
        let mut stream = Stream::new(&[0x02, 0x02, 0x00, 0x80]);
        assert_eq!(read_short_integer(&mut stream, None).unwrap(), 0x80);

        // All leading zero bytes stripped, even redundant ones
        let mut stream = Stream::new(&[0x02, 0x03, 0x00, 0x00, 0x05]);
        assert_eq!(read_short_integer(&mut stream, None).unwrap(), 5);

        // Zero-length zero from broken encoders
        let mut stream = Stream::new(&[0x02, 0x00]);
        assert_eq!(read_short_integer(&mut stream, None).unwrap(), 0);
    }

    #[test]
    fn test_read_short_integer_high_bit_unsigned() {
        // Missing sign padding, value is read as an unsigned magnitude
        let mut stream = Stream::new(&[0x02, 0x01, 0x80]);
        assert_eq!(read_short_integer(&mut stream, None).unwrap(), 0x80);
    }

    #[test]
    fn test_read_integer_truncates() {
        let mut stream = Stream::new(&[0x02, 0x04, 0x01, 0x02, 0x03, 0x04]);
        let mut dest = [0u8; 2];
        assert_eq!(read_integer(&mut stream, &mut dest, None).unwrap(), 2);
        assert_eq!(dest, [0x01, 0x02]);
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn test_read_enumerated() {
        let mut stream = Stream::new(&[0x0A, 0x01, 0x02]);
        assert_eq!(read_enumerated(&mut stream, None).unwrap(), 2);

        // Sanity cap
        let mut stream = Stream::new(&[0x0A, 0x02, 0x04, 0x00]);
        assert!(read_enumerated(&mut stream, None).is_err());
    }

    #[test]
    fn test_read_octet_string() {
        let data = [0x04, 0x05, b'h', b'e', b'l', b'l', b'o'];
        let mut stream = Stream::new(&data);
        let mut dest = [0u8; 16];
        let n = read_octet_string(&mut stream, &mut dest, 0, None).unwrap();
        assert_eq!(&dest[..n], b"hello");
    }

    #[test]
    fn test_read_character_string_literal_tag() {
        let data = [0x16, 0x03, b'a', b'b', b'c'];
        let mut stream = Stream::new(&data);
        let mut dest = [0u8; 8];
        let n = read_character_string(&mut stream, &mut dest, Tag::IA5_STRING).unwrap();
        assert_eq!(&dest[..n], b"abc");

        // Wrong string tag is wrong data
        let data = [0x13, 0x03, b'a', b'b', b'c'];
        let mut stream = Stream::new(&data);
        assert!(read_character_string(&mut stream, &mut dest, Tag::IA5_STRING).is_err());
    }

    #[test]
    fn test_read_bit_string() {
        // Bit 0 set, one content byte, 7 unused bits
        let mut stream = Stream::new(&[0x03, 0x02, 0x07, 0x80]);
        assert_eq!(read_bit_string(&mut stream, None).unwrap(), 1);

        // keyUsage-style two-bit value: bits 0 and 1
        let mut stream = Stream::new(&[0x03, 0x02, 0x06, 0xC0]);
        assert_eq!(read_bit_string(&mut stream, None).unwrap(), 0b11);

        // Unused-bit count out of range
        let mut stream = Stream::new(&[0x03, 0x02, 0x08, 0x80]);
        assert!(read_bit_string(&mut stream, None).is_err());
    }

    #[test]
    fn test_read_oid_table() {
        const RSA: &[u8] = &[
            0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x01, 0x01,
        ];
        const DSA: &[u8] = &[0x06, 0x07, 0x2A, 0x86, 0x48, 0xCE, 0x38, 0x04, 0x01];
        let table = [
            OidInfo { oid: RSA, selection: 1 },
            OidInfo { oid: DSA, selection: 2 },
        ];

        let mut stream = Stream::new(DSA);
        assert_eq!(read_oid(&mut stream, &table).unwrap(), 2);

        let unknown = [0x06, 0x03, 0x55, 0x04, 0x03];
        let mut stream = Stream::new(&unknown);
        assert!(read_oid(&mut stream, &table).is_err());
    }

    #[test]
    fn test_read_encoded_oid() {
        let oid = [0x06, 0x03, 0x55, 0x04, 0x03];
        let mut stream = Stream::new(&oid);
        let mut dest = [0u8; MAX_OID_SIZE];
        let n = read_encoded_oid(&mut stream, &mut dest).unwrap();
        assert_eq!(&dest[..n], &oid);
    }

    #[test]
    fn test_read_sequence() {
        let data = [0x30, 0x03, 0x02, 0x01, 0x05];
        let mut stream = Stream::new(&data);
        assert_eq!(read_sequence(&mut stream).unwrap(), 3);
        assert_eq!(stream.position(), 2);
    }

    #[test]
    fn test_read_sequence_rejects_indefinite() {
        let data = [0x30, 0x80, 0x00, 0x00];
        let mut stream = Stream::new(&data);
        assert!(read_sequence(&mut stream).is_err());

        let mut stream = Stream::new(&data);
        assert_eq!(
            read_sequence_indef(&mut stream).unwrap(),
            Length::Indefinite
        );
    }

    #[test]
    fn test_read_constructed_context_tag() {
        let data = [0xA0, 0x03, 0x02, 0x01, 0x00];
        let mut stream = Stream::new(&data);
        assert_eq!(read_constructed(&mut stream, Some(0)).unwrap(), 3);
    }

    #[test]
    fn test_read_bit_string_hole() {
        // Hole read consumes tag, length and unused-bits octet only
        let data = [0x03, 0x04, 0x00, 0x30, 0x01, 0x00];
        let mut stream = Stream::new(&data);
        assert_eq!(read_bit_string_hole(&mut stream, 0, None).unwrap(), 3);
        assert_eq!(stream.position(), 3);
    }

    #[test]
    fn test_read_generic_hole_any() {
        // Context tag accepted
        let data = [0xA3, 0x02, 0x05, 0x00];
        let mut stream = Stream::new(&data);
        assert_eq!(read_generic_hole(&mut stream, 0, None).unwrap(), 2);

        // Primitive INTEGER is not a hole
        let data = [0x02, 0x01, 0x00];
        let mut stream = Stream::new(&data);
        assert!(read_generic_hole(&mut stream, 0, None).is_err());
    }

    #[test]
    fn test_check_eoc() {
        let data = [0x00, 0x00, 0x02, 0x01, 0x05];
        let mut stream = Stream::new(&data);
        assert!(check_eoc(&mut stream).unwrap());
        assert!(!check_eoc(&mut stream).unwrap());
        assert_eq!(stream.position(), 2);
    }
}
