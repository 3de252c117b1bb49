//! Inspector bridge framing IO.
//! - read_message/write_message: Content-Length framed payloads
//! - serve: read function calls, dispatch, write tagged results

use std::io::{self, BufRead, Write};

use crate::agent::InspectorAgent;
use crate::protocol::{FunctionCall, TaggedResult};

const CONTENT_LENGTH: &str = "Content-Length";

/// Read one framed payload; `None` on clean end-of-stream.
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut content_length = None;
    let mut line = String::new();

    loop {
        line.clear();
        let bytes = reader.read_line(&mut line)?;
        if bytes == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some((name, value)) = trimmed.split_once(':') {
            if name.trim().eq_ignore_ascii_case(CONTENT_LENGTH) {
                if let Ok(length) = value.trim().parse::<usize>() {
                    content_length = Some(length);
                }
            }
        }
    }

    let length = content_length.ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "missing Content-Length header")
    })?;

    let mut buffer = vec![0u8; length];
    reader.read_exact(&mut buffer)?;
    let payload = String::from_utf8(buffer)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid utf-8 payload"))?;
    Ok(Some(payload))
}

/// Write one framed payload.
pub fn write_message<W: Write>(writer: &mut W, payload: &str) -> io::Result<()> {
    let length = payload.len();
    write!(writer, "Content-Length: {length}\r\n\r\n")?;
    writer.write_all(payload.as_bytes())?;
    writer.flush()
}

/// Serve function calls until end-of-stream. Malformed payloads produce an
/// error-tagged result on the stream rather than tearing the loop down.
pub fn serve<R: BufRead, W: Write>(
    agent: &mut InspectorAgent,
    reader: &mut R,
    writer: &mut W,
) -> io::Result<()> {
    while let Some(payload) = read_message(reader)? {
        let result = match serde_json::from_str::<FunctionCall>(&payload) {
            Ok(call) => agent.dispatch(&call),
            Err(err) => {
                tracing::warn!(error = %err, "malformed function call payload");
                TaggedResult::error("invalid function call payload")
            }
        };
        let serialized = serde_json::to_string(&result)
            .unwrap_or_else(|_| r#"{"status":"error","detail":"unserializable result"}"#.to_string());
        write_message(writer, &serialized)?;
    }
    Ok(())
}
