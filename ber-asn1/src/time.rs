//! UTCTime and GeneralizedTime codecs
//!
//! Values are Unix timestamps (`i64` seconds). Only the zulu-suffixed
//! encodings are accepted: 13-byte (or obsolete 11-byte, no seconds) UTCTime
//! and 15-byte GeneralizedTime. Everything else that X.680 permits (offsets,
//! fractional seconds) never appears in the PKI data this codec exists for.

use ber_core::{Asn1Error, Asn1Result, Stream};
use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

use crate::tags::Tag;

fn digits(buffer: &[u8], index: usize) -> u32 {
    ((buffer[index] - b'0') as u32 * 10) + (buffer[index + 1] - b'0') as u32
}

/// Parse the content of a time value, the tag having been consumed already.
///
/// The UTCTime century pivot maps two-digit years of 50 and up to 19xx and
/// below 50 to 20xx. Dates anywhere in January 1970 clamp to exactly the
/// epoch: near-epoch times can turn negative once converted, and a negative
/// time value is worse for callers than a slightly wrong one.
fn read_time(stream: &mut Stream, is_utc: bool) -> Asn1Result<i64> {
    let length = stream.read_byte()? as usize;
    if (is_utc && length != 13 && length != 11) || (!is_utc && length != 15) {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "time value of {} bytes",
            length
        ))));
    }

    let mut buffer = [0u8; 16];
    stream.read_into(&mut buffer[..length])?;
    for &byte in &buffer[..length - 1] {
        if !byte.is_ascii_digit() {
            return Err(stream.set_error(Asn1Error::BadData(
                "non-digit in time value".to_string(),
            )));
        }
    }
    if buffer[length - 1] != b'Z' {
        return Err(stream.set_error(Asn1Error::BadData(
            "time value without zulu suffix".to_string(),
        )));
    }

    let (year, base) = if is_utc {
        let two_digit = digits(&buffer, 0);
        let year = if two_digit >= 50 {
            1900 + two_digit
        } else {
            2000 + two_digit
        };
        (year, 0)
    } else {
        (digits(&buffer, 0) * 100 + digits(&buffer, 2), 2)
    };
    let month = digits(&buffer, base + 2);
    let day = digits(&buffer, base + 4);
    let hour = digits(&buffer, base + 6);
    let minute = digits(&buffer, base + 8);
    // The obsolete 11-byte UTCTime form omits seconds
    let second = if length - base > 11 {
        digits(&buffer, base + 10)
    } else {
        0
    };

    if year == 1970 && month == 1 {
        return Ok(0);
    }

    let time = Utc
        .with_ymd_and_hms(year as i32, month, day, hour, minute, second)
        .single()
        .ok_or_else(|| Asn1Error::BadData("time value out of calendar range".to_string()))
        .map_err(|e| stream.set_error(e))?;
    Ok(time.timestamp())
}

/// Read a UTCTime value as Unix seconds
pub fn read_utc_time(stream: &mut Stream, tag: Option<u32>) -> Asn1Result<i64> {
    let expected = match tag {
        None => Tag::UTC_TIME,
        Some(n) => Tag::context(n),
    };
    let read = Tag::read(stream)?;
    if read != expected {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "expected time tag {:?}, got {:?}",
            expected, read
        ))));
    }
    read_time(stream, true)
}

/// Read a GeneralizedTime value as Unix seconds
pub fn read_generalized_time(stream: &mut Stream, tag: Option<u32>) -> Asn1Result<i64> {
    let expected = match tag {
        None => Tag::GENERALIZED_TIME,
        Some(n) => Tag::context(n),
    };
    let read = Tag::read(stream)?;
    if read != expected {
        return Err(stream.set_error(Asn1Error::BadData(format!(
            "expected time tag {:?}, got {:?}",
            expected, read
        ))));
    }
    read_time(stream, false)
}

/// Format a timestamp as canonical time-value content (no tag or length):
/// 13 bytes for UTCTime, 15 for GeneralizedTime.
///
/// Timestamps from 1990 or earlier are refused: nothing this codec writes
/// legitimately predates it, so such a value is a caller defect.
pub(crate) fn format_time(value: i64, is_utc: bool) -> Asn1Result<Vec<u8>> {
    let time: DateTime<Utc> = Utc
        .timestamp_opt(value, 0)
        .single()
        .ok_or_else(|| Asn1Error::BadData(format!("unrepresentable timestamp {}", value)))?;
    if time.year() <= 1990 {
        return Err(Asn1Error::BadData(format!(
            "implausible timestamp year {}",
            time.year()
        )));
    }

    let formatted = if is_utc {
        format!(
            "{:02}{:02}{:02}{:02}{:02}{:02}Z",
            time.year() % 100,
            time.month(),
            time.day(),
            time.hour(),
            time.minute(),
            time.second()
        )
    } else {
        format!(
            "{:04}{:02}{:02}{:02}{:02}{:02}Z",
            time.year(),
            time.month(),
            time.day(),
            time.hour(),
            time.minute(),
            time.second()
        )
    };
    Ok(formatted.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc_stream(content: &[u8]) -> Vec<u8> {
        let mut data = vec![0x17, content.len() as u8];
        data.extend_from_slice(content);
        data
    }

    #[test]
    fn test_utc_century_pivot() {
        let data = utc_stream(b"500101000000Z");
        let mut stream = Stream::new(&data);
        let value = read_utc_time(&mut stream, None).unwrap();
        assert_eq!(
            value,
            Utc.with_ymd_and_hms(1950, 1, 1, 0, 0, 0).unwrap().timestamp()
        );

        let data = utc_stream(b"490101000000Z");
        let mut stream = Stream::new(&data);
        let value = read_utc_time(&mut stream, None).unwrap();
        assert_eq!(
            value,
            Utc.with_ymd_and_hms(2049, 1, 1, 0, 0, 0).unwrap().timestamp()
        );
    }

    #[test]
    fn test_utc_obsolete_form_without_seconds() {
        let data = utc_stream(b"9606151030Z");
        let mut stream = Stream::new(&data);
        let value = read_utc_time(&mut stream, None).unwrap();
        assert_eq!(
            value,
            Utc.with_ymd_and_hms(1996, 6, 15, 10, 30, 0).unwrap().timestamp()
        );
    }

    #[test]
    fn test_january_1970_clamps_to_epoch() {
        let data = utc_stream(b"700115120000Z");
        let mut stream = Stream::new(&data);
        assert_eq!(read_utc_time(&mut stream, None).unwrap(), 0);
    }

    #[test]
    fn test_generalized_time() {
        let data = [
            0x18, 0x0F, b'2', b'0', b'2', b'1', b'0', b'3', b'0', b'4', b'1', b'2', b'3', b'0',
            b'4', b'5', b'Z',
        ];
        let mut stream = Stream::new(&data);
        let value = read_generalized_time(&mut stream, None).unwrap();
        assert_eq!(
            value,
            Utc.with_ymd_and_hms(2021, 3, 4, 12, 30, 45).unwrap().timestamp()
        );
    }

    #[test]
    fn test_malformed_time_rejected() {
        // Wrong length
        let data = utc_stream(b"96061510Z");
        let mut stream = Stream::new(&data);
        assert!(read_utc_time(&mut stream, None).is_err());

        // Non-digit content
        let data = utc_stream(b"9606x5103000Z");
        let mut stream = Stream::new(&data);
        assert!(read_utc_time(&mut stream, None).is_err());

        // Missing zulu suffix
        let data = utc_stream(b"9606151030001");
        let mut stream = Stream::new(&data);
        assert!(read_utc_time(&mut stream, None).is_err());

        // Month out of range
        let data = utc_stream(b"961306103000Z");
        let mut stream = Stream::new(&data);
        assert!(read_utc_time(&mut stream, None).is_err());
    }

    #[test]
    fn test_format_round_trip() {
        let value = Utc.with_ymd_and_hms(2024, 11, 30, 23, 59, 59).unwrap().timestamp();

        let content = format_time(value, true).unwrap();
        assert_eq!(content.len(), 13);
        let mut data = vec![0x17, 13];
        data.extend_from_slice(&content);
        let mut stream = Stream::new(&data);
        assert_eq!(read_utc_time(&mut stream, None).unwrap(), value);

        let content = format_time(value, false).unwrap();
        assert_eq!(content.len(), 15);
        assert_eq!(&content[..4], b"2024");
    }

    #[test]
    fn test_format_refuses_implausible_year() {
        assert!(format_time(0, true).is_err());
    }
}
