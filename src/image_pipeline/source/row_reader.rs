//! Sequential row reads over a frame stream that tolerate truncation.

use std::io::{self, Read};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::source::data_source::ImageDataSource;

/// Streams a frame row by row. Short final reads are reported, not raised.
pub struct RowReader {
    inner: Box<dyn Read + Send>,
    exhausted: bool,
}

impl RowReader {
    /// Open `source` and skip the first `offset` bytes.
    pub fn open(source: &dyn ImageDataSource, offset: u64) -> Result<Self> {
        let mut reader = Self {
            inner: source.open_stream()?,
            exhausted: false,
        };
        reader.skip(offset)?;
        Ok(reader)
    }

    /// Fill `buf` as far as the stream allows. Returns the byte count, which
    /// is only short of `buf.len()` at end of stream.
    pub fn read_row(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() && !self.exhausted {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => self.exhausted = true,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    pub fn skip(&mut self, count: u64) -> io::Result<u64> {
        let skipped = io::copy(&mut (&mut self.inner).take(count), &mut io::sink())?;
        if skipped < count {
            self.exhausted = true;
        }
        Ok(skipped)
    }
}
