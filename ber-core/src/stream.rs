//! Position- and error-tracking cursor over a fixed byte buffer
//!
//! All codec operations borrow a [`Stream`] mutably for the duration of one
//! call. The stream carries a sticky error: once any operation fails, every
//! later operation returns the same error without advancing, so callers only
//! need to check status at call and recursion boundaries.

use crate::error::{Asn1Error, Asn1Result};

/// Saved stream state for speculative parsing.
///
/// Captures position and error state together; restoring one without the
/// other would let a failed probe leak an observable side effect.
#[derive(Debug, Clone)]
pub struct Snapshot {
    position: usize,
    error: Option<Asn1Error>,
}

/// Forward-only cursor over a caller-owned buffer
///
/// # Error Handling
///
/// The stream records the first error raised against it and replays it from
/// every subsequent operation ("sticky error"). Position never advances once
/// an error is set. [`Stream::restore`] is the only way to clear the state,
/// and is intended solely for speculative-parse rollback.
pub struct Stream<'a> {
    buffer: &'a [u8],
    position: usize,
    error: Option<Asn1Error>,
}

impl<'a> Stream<'a> {
    /// Create a stream over a buffer
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
            error: None,
        }
    }

    /// Current position in the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left between the current position and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Current error state: `Ok` if the stream is clean, otherwise a clone
    /// of the recorded error
    pub fn status(&self) -> Asn1Result<()> {
        match &self.error {
            None => Ok(()),
            Some(e) => Err(e.clone()),
        }
    }

    /// Record an error against the stream and return the active one.
    ///
    /// The first recorded error wins; later calls return it unchanged.
    pub fn set_error(&mut self, error: Asn1Error) -> Asn1Error {
        self.error.get_or_insert(error).clone()
    }

    /// Save position and error state for a later [`Stream::restore`]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            position: self.position,
            error: self.error.clone(),
        }
    }

    /// Roll the stream back to a previously saved state.
    ///
    /// This is the only backward movement the stream supports.
    pub fn restore(&mut self, snapshot: Snapshot) {
        self.position = snapshot.position;
        self.error = snapshot.error;
    }

    /// Read the byte at the current position without advancing
    pub fn peek_byte(&mut self) -> Asn1Result<u8> {
        self.status()?;
        if self.position >= self.buffer.len() {
            return Err(self.set_error(Asn1Error::Underflow(
                "peek past end of buffer".to_string(),
            )));
        }
        Ok(self.buffer[self.position])
    }

    /// Read one byte, advancing the position
    pub fn read_byte(&mut self) -> Asn1Result<u8> {
        self.status()?;
        if self.position >= self.buffer.len() {
            return Err(self.set_error(Asn1Error::Underflow(
                "buffer exhausted while reading byte".to_string(),
            )));
        }
        let byte = self.buffer[self.position];
        self.position += 1;
        Ok(byte)
    }

    /// Read `count` bytes as a slice of the underlying buffer
    pub fn read_bytes(&mut self, count: usize) -> Asn1Result<&'a [u8]> {
        self.status()?;
        if self.remaining() < count {
            return Err(self.set_error(Asn1Error::Underflow(format!(
                "buffer exhausted: need {} bytes, have {}",
                count,
                self.remaining()
            ))));
        }
        let start = self.position;
        self.position += count;
        Ok(&self.buffer[start..start + count])
    }

    /// Read exactly `dest.len()` bytes into a caller buffer
    pub fn read_into(&mut self, dest: &mut [u8]) -> Asn1Result<()> {
        let data = self.read_bytes(dest.len())?;
        dest.copy_from_slice(data);
        Ok(())
    }

    /// Advance the position by `count` bytes without looking at them
    pub fn skip(&mut self, count: usize) -> Asn1Result<()> {
        self.status()?;
        if self.remaining() < count {
            return Err(self.set_error(Asn1Error::Underflow(format!(
                "cannot skip {} bytes, only {} remain",
                count,
                self.remaining()
            ))));
        }
        self.position += count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_and_position() {
        let data = [0x30, 0x03, 0x02, 0x01, 0x05];
        let mut stream = Stream::new(&data);
        assert_eq!(stream.read_byte().unwrap(), 0x30);
        assert_eq!(stream.peek_byte().unwrap(), 0x03);
        assert_eq!(stream.position(), 1);
        assert_eq!(stream.read_bytes(2).unwrap(), &[0x03, 0x02]);
        assert_eq!(stream.remaining(), 2);
    }

    #[test]
    fn test_error_is_sticky() {
        let data = [0x01];
        let mut stream = Stream::new(&data);
        stream.read_byte().unwrap();
        let err = stream.read_byte().unwrap_err();
        assert!(matches!(err, Asn1Error::Underflow(_)));

        // Every later operation replays the first error and stays put
        assert_eq!(stream.peek_byte().unwrap_err(), err);
        assert_eq!(stream.skip(0).unwrap_err(), err);
        assert_eq!(stream.position(), 1);
    }

    #[test]
    fn test_first_error_wins() {
        let mut stream = Stream::new(&[]);
        let first = stream.set_error(Asn1Error::BadData("first".to_string()));
        let second = stream.set_error(Asn1Error::Overflow("second".to_string()));
        assert_eq!(first, second);
        assert!(matches!(second, Asn1Error::BadData(_)));
    }

    #[test]
    fn test_snapshot_restore_clears_error() {
        let data = [0xAA, 0xBB];
        let mut stream = Stream::new(&data);
        let saved = stream.snapshot();
        stream.read_byte().unwrap();
        stream.set_error(Asn1Error::BadData("probe failed".to_string()));
        assert!(stream.status().is_err());

        stream.restore(saved);
        assert!(stream.status().is_ok());
        assert_eq!(stream.position(), 0);
        assert_eq!(stream.read_byte().unwrap(), 0xAA);
    }

    #[test]
    fn test_skip_past_end() {
        let data = [0u8; 4];
        let mut stream = Stream::new(&data);
        assert!(stream.skip(5).is_err());
        assert_eq!(stream.position(), 0);
    }
}
