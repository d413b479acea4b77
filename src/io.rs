//! Byte capabilities handed to the machine for `.` and `,`.

use crate::{Error, Result};
use std::io::{ErrorKind, Read, Write};

/// ASCII encoding of a byte: anything above 0x7F becomes `?`.
pub fn to_ascii(byte: u8) -> u8 {
    if byte.is_ascii() {
        byte
    } else {
        b'?'
    }
}

pub trait ByteSink {
    fn put(&mut self, byte: u8) -> Result<()>;
}

/// Blocking source of input bytes. Returns [`Error::InputExhausted`] once
/// no more bytes will ever arrive.
pub trait ByteSource {
    fn get(&mut self) -> Result<u8>;
}

impl<T: ByteSink + ?Sized> ByteSink for &mut T {
    fn put(&mut self, byte: u8) -> Result<()> {
        (**self).put(byte)
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &mut T {
    fn get(&mut self) -> Result<u8> {
        (**self).get()
    }
}

impl ByteSink for Vec<u8> {
    fn put(&mut self, byte: u8) -> Result<()> {
        self.push(byte);
        Ok(())
    }
}

/// Writes each byte through to `W` and flushes, so interactive output
/// appears before the next `,` blocks.
pub struct WriterSink<W: Write> {
    inner: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteSink for WriterSink<W> {
    fn put(&mut self, byte: u8) -> Result<()> {
        self.inner.write_all(&[byte])?;
        self.inner.flush()?;
        Ok(())
    }
}

/// In-memory input.
#[derive(Debug, Clone, Default)]
pub struct SliceSource {
    bytes: Vec<u8>,
    pos: usize,
}

impl SliceSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            pos: 0,
        }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

impl ByteSource for SliceSource {
    fn get(&mut self) -> Result<u8> {
        let byte = *self.bytes.get(self.pos).ok_or(Error::InputExhausted)?;
        self.pos += 1;
        Ok(byte)
    }
}

pub struct ReaderSource<R: Read> {
    inner: R,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn get(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        match self.inner.read_exact(&mut buf) {
            Ok(()) => Ok(buf[0]),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => Err(Error::InputExhausted),
            Err(err) => Err(err.into()),
        }
    }
}

/// Source with no input at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSource;

impl ByteSource for NullSource {
    fn get(&mut self) -> Result<u8> {
        Err(Error::InputExhausted)
    }
}
