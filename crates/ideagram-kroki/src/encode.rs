//! URL-safe payload encoding for Kroki GET requests.
//!
//! Kroki accepts diagram source in the URL path as zlib-deflated,
//! URL-safe base64 encoded text. The encoding is reversible, which keeps
//! render requests cacheable by intermediaries and easy to reproduce by
//! hand with `zlib.decompress`.

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use flate2::Compression;
use flate2::write::ZlibEncoder;

/// Encode diagram source for use as a Kroki URL path segment.
///
/// Compresses with zlib at best compression, then encodes with the
/// URL-safe base64 alphabet (`-` and `_` instead of `+` and `/`).
#[must_use]
pub fn encode_source(source: &str) -> String {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    // Writing to a Vec cannot fail
    encoder
        .write_all(source.as_bytes())
        .expect("write to in-memory buffer");
    let compressed = encoder.finish().expect("finish in-memory zlib stream");

    URL_SAFE.encode(compressed)
}
