// OPC UA DataType registry and binary codec for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2021 Alexander Schrode
use crate::error::{Result, TypeError};
use opcua_types::{BinaryEncoder, DecodingOptions, EncodingResult};
use std::io::{self, Read};

/// Reads one value with its opcua-types decoder
pub(crate) fn read<T: BinaryEncoder<T>>(
    stream: &mut SliceReader<'_>,
    opts: &DecodingOptions,
) -> Result<T> {
    let res = T::decode(stream, opts);
    stream.lift(res)
}

/// Reader over a complete message, remembers if a read ran past the end
/// so short input can be told apart from malformed input.
pub(crate) struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
    exhausted: bool,
}

impl<'a> SliceReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            exhausted: false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Converts the result of an opcua-types decoder
    pub fn lift<T>(&self, res: EncodingResult<T>) -> Result<T> {
        res.map_err(|status| {
            if self.exhausted {
                TypeError::Truncated
            } else {
                TypeError::Decode(status.to_string())
            }
        })
    }

    /// Fails if a length prefix promises more bytes than are left
    pub fn ensure_available(&mut self, bytes: usize) -> Result<()> {
        if bytes > self.remaining() {
            self.exhausted = true;
            Err(TypeError::Truncated)
        } else {
            Ok(())
        }
    }

    /// A message must be consumed completely
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(TypeError::Decode(format!("{} trailing bytes", n))),
        }
    }
}

impl Read for SliceReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rest = &self.data[self.pos..];
        if buf.len() > rest.len() {
            self.exhausted = true;
        }
        let n = buf.len().min(rest.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}
