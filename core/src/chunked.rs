// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! HTTP/1.1 chunked transfer encoding with chunk extensions and trailers.
//!
//! [`ChunkEncoder`] wraps a payload reader and lazily frames it:
//!
//! ```text
//! S(L);ext1=v1;ext2=v2\r\n
//! <L bytes of payload>\r\n
//! ...
//! S(0);ext1=v1;ext2=v2\r\n
//! trailer1:v1\r\n
//! \r\n
//! ```
//!
//! Extensions are computed for every chunk, the zero-length terminator
//! included, in declared order. Trailers are computed once, after the
//! terminator, with the terminator's (empty) payload.

use std::fmt::Debug;
use std::fmt::Formatter;
use std::io;
use std::io::Read;

use bytes::Buf;
use bytes::BufMut;
use bytes::BytesMut;
use log::trace;

use crate::Error;
use crate::ErrorKind;
use crate::Result;

const CRLF: &[u8] = b"\r\n";

/// A chunk extension, emitted as `;name=value` after the chunk size.
pub trait ChunkExtension: Send {
    /// Name of the extension, fixed for the life of the encoder.
    fn name(&self) -> &str;

    /// Compute the extension value for the raw payload of one chunk.
    ///
    /// Called once per chunk, in chunk order, including the empty
    /// terminator chunk.
    fn value(&mut self, chunk: &[u8]) -> Result<Vec<u8>>;
}

/// A trailer, emitted as `name:value` after the terminator chunk.
pub trait Trailer: Send {
    /// Name of the trailer, fixed for the life of the encoder.
    fn name(&self) -> &str;

    /// Compute the trailer value.
    ///
    /// Called exactly once, after every extension of the terminator chunk
    /// has been computed. `chunk` is the terminator's payload, which is
    /// always empty.
    fn value(&mut self, chunk: &[u8]) -> Result<Vec<u8>>;
}

/// Encoder for the chunk size field.
pub type SizeEncoder = Box<dyn Fn(usize) -> Vec<u8> + Send>;

/// Lowercase hex chunk size, as HTTP/1.1 requires.
pub fn hex_chunk_size(len: usize) -> Vec<u8> {
    format!("{len:x}").into_bytes()
}

/// Closure based [`ChunkExtension`].
pub struct FnExtension<F> {
    name: String,
    f: F,
}

/// Build a [`ChunkExtension`] from a name and a closure.
pub fn extension_fn<F>(name: impl Into<String>, f: F) -> FnExtension<F>
where
    F: FnMut(&[u8]) -> Result<Vec<u8>> + Send,
{
    FnExtension {
        name: name.into(),
        f,
    }
}

impl<F> ChunkExtension for FnExtension<F>
where
    F: FnMut(&[u8]) -> Result<Vec<u8>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        (self.f)(chunk)
    }
}

/// Closure based [`Trailer`].
pub struct FnTrailer<F> {
    name: String,
    f: F,
}

/// Build a [`Trailer`] from a name and a closure.
pub fn trailer_fn<F>(name: impl Into<String>, f: F) -> FnTrailer<F>
where
    F: FnMut(&[u8]) -> Result<Vec<u8>> + Send,
{
    FnTrailer {
        name: name.into(),
        f,
    }
}

impl<F> Trailer for FnTrailer<F>
where
    F: FnMut(&[u8]) -> Result<Vec<u8>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        (self.f)(chunk)
    }
}

/// What the frame buffer currently holds.
#[derive(Debug)]
enum State {
    /// Nothing buffered yet, the next step reads from the source.
    Reading,
    /// A data chunk.
    EmittingChunk,
    /// The zero-length terminator chunk.
    EmittingTerminator,
    /// The trailer block and the final CRLF.
    EmittingTrailers,
    Done,
    /// Terminal error, replayed on every read.
    Failed {
        io_kind: io::ErrorKind,
        kind: Option<ErrorKind>,
        message: String,
    },
}

/// Lazy chunk-encoding reader.
///
/// Reads at most `chunk_size` bytes from the source per data chunk and
/// never buffers more than one framed chunk.
pub struct ChunkEncoder<R> {
    source: R,
    chunk_size: usize,
    size_encoder: SizeEncoder,
    extensions: Vec<Box<dyn ChunkExtension>>,
    trailers: Vec<Box<dyn Trailer>>,

    chunk: Vec<u8>,
    frame: BytesMut,
    state: State,
}

impl<R: Read> ChunkEncoder<R> {
    /// Create a new encoder.
    ///
    /// Fails with `InvalidArgument` if `chunk_size` is zero or an extension
    /// or trailer has a name that can't appear on the wire.
    pub fn new(
        source: R,
        chunk_size: usize,
        size_encoder: SizeEncoder,
        extensions: Vec<Box<dyn ChunkExtension>>,
        trailers: Vec<Box<dyn Trailer>>,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::invalid_argument("chunk size must be positive"));
        }
        for name in extensions.iter().map(|v| v.name()) {
            check_name(name, "extension")?;
        }
        for name in trailers.iter().map(|v| v.name()) {
            check_name(name, "trailer")?;
        }

        Ok(Self {
            source,
            chunk_size,
            size_encoder,
            extensions,
            trailers,

            chunk: Vec::with_capacity(chunk_size),
            frame: BytesMut::new(),
            state: State::Reading,
        })
    }

    /// Start building an encoder with hex chunk sizes and no extensions
    /// or trailers.
    pub fn builder(source: R, chunk_size: usize) -> ChunkEncoderBuilder<R> {
        ChunkEncoderBuilder {
            source,
            chunk_size,
            size_encoder: Box::new(hex_chunk_size),
            extensions: Vec::new(),
            trailers: Vec::new(),
        }
    }

    /// Check if the whole message, trailers included, has been emitted.
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Move to the next state once the frame buffer is drained.
    ///
    /// Returns `false` when there is nothing left to emit.
    fn advance(&mut self) -> io::Result<bool> {
        match self.state {
            State::Reading | State::EmittingChunk => {
                self.fill_chunk()?;
                if self.chunk.is_empty() {
                    trace!("source exhausted, emitting terminator chunk");
                    self.frame_terminator()?;
                    self.state = State::EmittingTerminator;
                } else {
                    trace!("emitting data chunk of {} bytes", self.chunk.len());
                    self.frame_chunk()?;
                    self.state = State::EmittingChunk;
                }
                Ok(true)
            }
            State::EmittingTerminator => {
                trace!("emitting {} trailers", self.trailers.len());
                self.frame_trailers()?;
                self.state = State::EmittingTrailers;
                Ok(true)
            }
            State::EmittingTrailers | State::Done => {
                self.state = State::Done;
                Ok(false)
            }
            State::Failed {
                io_kind,
                kind,
                ref message,
            } => Err(match kind {
                Some(kind) => Error::new(kind, message.clone()).into(),
                None => io::Error::new(io_kind, message.clone()),
            }),
        }
    }

    /// Read up to `chunk_size` bytes, tolerating short reads.
    fn fill_chunk(&mut self) -> io::Result<()> {
        self.chunk.clear();
        self.source
            .by_ref()
            .take(self.chunk_size as u64)
            .read_to_end(&mut self.chunk)?;
        Ok(())
    }

    /// `S(L)(;name=value)*\r\n`
    fn frame_header(&mut self, len: usize) -> Result<()> {
        let size = (self.size_encoder)(len);
        if size.is_empty() {
            return Err(Error::encoding_invariant(
                "size encoder produced an empty chunk size",
            ));
        }
        self.frame.put_slice(&size);

        for ext in self.extensions.iter_mut() {
            let value = ext.value(&self.chunk)?;
            self.frame.put_u8(b';');
            self.frame.put_slice(ext.name().as_bytes());
            self.frame.put_u8(b'=');
            self.frame.put_slice(&value);
        }
        self.frame.put_slice(CRLF);
        Ok(())
    }

    fn frame_chunk(&mut self) -> Result<()> {
        self.frame_header(self.chunk.len())?;
        self.frame.put_slice(&self.chunk);
        self.frame.put_slice(CRLF);
        Ok(())
    }

    fn frame_terminator(&mut self) -> Result<()> {
        debug_assert!(self.chunk.is_empty());
        self.frame_header(0)
    }

    fn frame_trailers(&mut self) -> Result<()> {
        for trailer in self.trailers.iter_mut() {
            let value = trailer.value(&[])?;
            self.frame.put_slice(trailer.name().as_bytes());
            self.frame.put_u8(b':');
            self.frame.put_slice(&value);
            self.frame.put_slice(CRLF);
        }
        self.frame.put_slice(CRLF);
        Ok(())
    }

    /// Enter the terminal error state and release held buffers.
    fn fail(&mut self, err: io::Error) -> io::Error {
        let kind = err
            .get_ref()
            .and_then(|e| e.downcast_ref::<Error>())
            .map(Error::kind);
        self.state = State::Failed {
            io_kind: err.kind(),
            kind,
            message: err.to_string(),
        };
        self.frame = BytesMut::new();
        self.chunk = Vec::new();
        err
    }
}

impl<R: Read> Read for ChunkEncoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if self.frame.has_remaining() {
                let n = buf.len().min(self.frame.remaining());
                self.frame.copy_to_slice(&mut buf[..n]);
                return Ok(n);
            }

            match self.advance() {
                Ok(true) => continue,
                Ok(false) => return Ok(0),
                Err(err) if matches!(self.state, State::Failed { .. }) => return Err(err),
                Err(err) => return Err(self.fail(err)),
            }
        }
    }
}

impl<R> Debug for ChunkEncoder<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkEncoder")
            .field("chunk_size", &self.chunk_size)
            .field(
                "extensions",
                &self.extensions.iter().map(|v| v.name()).collect::<Vec<_>>(),
            )
            .field(
                "trailers",
                &self.trailers.iter().map(|v| v.name()).collect::<Vec<_>>(),
            )
            .field("state", &self.state)
            .finish()
    }
}

/// Builder for [`ChunkEncoder`].
pub struct ChunkEncoderBuilder<R> {
    source: R,
    chunk_size: usize,
    size_encoder: SizeEncoder,
    extensions: Vec<Box<dyn ChunkExtension>>,
    trailers: Vec<Box<dyn Trailer>>,
}

impl<R: Read> ChunkEncoderBuilder<R> {
    /// Replace the chunk size encoder.
    pub fn size_encoder(mut self, f: impl Fn(usize) -> Vec<u8> + Send + 'static) -> Self {
        self.size_encoder = Box::new(f);
        self
    }

    /// Append an extension.
    pub fn extension(mut self, ext: impl ChunkExtension + 'static) -> Self {
        self.extensions.push(Box::new(ext));
        self
    }

    /// Append a trailer.
    pub fn trailer(mut self, trailer: impl Trailer + 'static) -> Self {
        self.trailers.push(Box::new(trailer));
        self
    }

    /// Build the encoder.
    pub fn build(self) -> Result<ChunkEncoder<R>> {
        ChunkEncoder::new(
            self.source,
            self.chunk_size,
            self.size_encoder,
            self.extensions,
            self.trailers,
        )
    }
}

fn check_name(name: &str, what: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_argument(format!("{what} name must not be empty")));
    }
    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, ';' | '=' | ':') || c.is_whitespace() || c.is_control())
    {
        return Err(Error::invalid_argument(format!(
            "{what} name {name:?} contains invalid character {c:?}"
        )));
    }
    Ok(())
}
