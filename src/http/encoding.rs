//! Content-Encoding negotiation and streaming compression
//!
//! Only gzip and deflate (zlib-wrapped, as HTTP defines it) are offered.
//! Compression runs chunk by chunk over the file stream, so a response is
//! never buffered whole.

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use futures_util::{stream, Stream, StreamExt};
use hyper::body::Bytes;
use std::io::{self, Write};

/// Encoding applied to a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
    Deflate,
    Identity,
}

impl ContentEncoding {
    /// Pick an encoding from the `Accept-Encoding` value
    ///
    /// Plain substring checks, gzip preferred. q-values are not weighed and a
    /// missing header means identity.
    pub fn negotiate(accept_encoding: Option<&str>) -> Self {
        match accept_encoding {
            Some(v) if v.contains("gzip") => Self::Gzip,
            Some(v) if v.contains("deflate") => Self::Deflate,
            _ => Self::Identity,
        }
    }

    /// `Content-Encoding` header value, `None` for identity
    pub const fn header_value(self) -> Option<&'static str> {
        match self {
            Self::Gzip => Some("gzip"),
            Self::Deflate => Some("deflate"),
            Self::Identity => None,
        }
    }
}

/// Incremental encoder writing into an in-memory buffer that is drained
/// after every chunk
enum Encoder {
    Gzip(GzEncoder<Vec<u8>>),
    Deflate(ZlibEncoder<Vec<u8>>),
}

impl Encoder {
    fn new(encoding: ContentEncoding) -> Option<Self> {
        match encoding {
            ContentEncoding::Gzip => Some(Self::Gzip(GzEncoder::new(Vec::new(), Compression::default()))),
            ContentEncoding::Deflate => {
                Some(Self::Deflate(ZlibEncoder::new(Vec::new(), Compression::default())))
            }
            ContentEncoding::Identity => None,
        }
    }

    /// Feed one chunk, returning whatever compressed output is ready
    fn push(&mut self, chunk: &[u8]) -> io::Result<Bytes> {
        let buf = match self {
            Self::Gzip(enc) => {
                enc.write_all(chunk)?;
                enc.get_mut()
            }
            Self::Deflate(enc) => {
                enc.write_all(chunk)?;
                enc.get_mut()
            }
        };
        Ok(Bytes::from(std::mem::take(buf)))
    }

    /// Flush the trailer
    fn finish(self) -> io::Result<Bytes> {
        let buf = match self {
            Self::Gzip(enc) => enc.finish()?,
            Self::Deflate(enc) => enc.finish()?,
        };
        Ok(Bytes::from(buf))
    }
}

/// Compress a byte stream with `encoding`
///
/// Identity passes the source through untouched.
pub fn compress_stream<S>(
    source: S,
    encoding: ContentEncoding,
) -> stream::BoxStream<'static, io::Result<Bytes>>
where
    S: Stream<Item = io::Result<Bytes>> + Send + Unpin + 'static,
{
    let Some(encoder) = Encoder::new(encoding) else {
        return source.boxed();
    };

    stream::unfold((source, Some(encoder)), |(mut source, encoder)| async move {
        let mut encoder = encoder?;
        loop {
            match source.next().await {
                Some(Ok(chunk)) => match encoder.push(&chunk) {
                    Ok(out) if out.is_empty() => {}
                    Ok(out) => return Some((Ok(out), (source, Some(encoder)))),
                    Err(e) => return Some((Err(e), (source, None))),
                },
                Some(Err(e)) => return Some((Err(e), (source, None))),
                None => return Some((encoder.finish(), (source, None))),
            }
        }
    })
    .boxed()
}
