//! Newline framing for the stdio transport
//!
//! Stdio tool servers emit one JSON object per line, but reads arrive in
//! arbitrary chunks. `LineDecoder` keeps the partial-line remainder between
//! pushes so callers only ever see complete lines.

/// Incremental line-framing decoder with explicit partial-buffer state
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of raw bytes
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Take the next complete line, without its terminator
    ///
    /// Returns `None` until a newline has been buffered. A trailing `\r`
    /// is stripped so `\r\n`-framed servers work too. Invalid UTF-8 is
    /// replaced rather than dropped; the JSON parse downstream rejects it.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
        line.pop(); // the \n
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Bytes currently buffered without a terminating newline
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"{\"id\":1}\n");
        assert_eq!(decoder.next_line().as_deref(), Some("{\"id\":1}"));
        assert_eq!(decoder.next_line(), None);
    }

    #[test]
    fn test_partial_then_complete() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"{\"id\"");
        assert_eq!(decoder.next_line(), None);
        assert_eq!(decoder.pending_len(), 5);

        decoder.push(b":1}\n{\"id\":2}");
        assert_eq!(decoder.next_line().as_deref(), Some("{\"id\":1}"));
        assert_eq!(decoder.next_line(), None);

        decoder.push(b"\n");
        assert_eq!(decoder.next_line().as_deref(), Some("{\"id\":2}"));
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"a\nb\nc\n");
        assert_eq!(decoder.next_line().as_deref(), Some("a"));
        assert_eq!(decoder.next_line().as_deref(), Some("b"));
        assert_eq!(decoder.next_line().as_deref(), Some("c"));
        assert_eq!(decoder.next_line(), None);
    }

    #[test]
    fn test_crlf_framing() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"hello\r\nworld\r\n");
        assert_eq!(decoder.next_line().as_deref(), Some("hello"));
        assert_eq!(decoder.next_line().as_deref(), Some("world"));
    }

    #[test]
    fn test_empty_line() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"\n\nx\n");
        assert_eq!(decoder.next_line().as_deref(), Some(""));
        assert_eq!(decoder.next_line().as_deref(), Some(""));
        assert_eq!(decoder.next_line().as_deref(), Some("x"));
    }
}
