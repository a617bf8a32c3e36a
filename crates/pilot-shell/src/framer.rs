//! Incremental marker matching over a raw output stream.

use crate::marker::Marker;

/// Result of a successful marker match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framed {
    /// Cleaned output that belongs to the command: everything before the
    /// marker, with the marker line, echoed command lines, and
    /// leading/trailing whitespace stripped.
    pub text: String,
    /// Bytes that arrived after the marker line. They belong to whatever
    /// runs next and must be carried over by the caller.
    pub remainder: String,
}

/// Accumulates output chunks until a command's end marker appears.
///
/// One framer serves exactly one command; the session creates a fresh one
/// (with a fresh [`Marker`]) per `execute` call, which is what makes
/// output attribution exclusive.
#[derive(Debug)]
pub struct Framer {
    marker: String,
    command: String,
    buffer: String,
}

impl Framer {
    /// Create a framer for one command and its end marker.
    pub fn new(marker: &Marker, command: &str) -> Self {
        Self {
            marker: marker.as_str().to_string(),
            command: command.to_string(),
            buffer: String::new(),
        }
    }

    /// Feed a chunk of output. Returns the framed result on the first
    /// occurrence of the marker, `None` while still waiting. The marker
    /// may span chunk boundaries.
    pub fn push(&mut self, chunk: &str) -> Option<Framed> {
        self.buffer.push_str(chunk);

        let idx = self.buffer.find(&self.marker)?;
        let after = &self.buffer[idx + self.marker.len()..];
        let remainder = after
            .strip_prefix("\r\n")
            .or_else(|| after.strip_prefix('\n'))
            .unwrap_or(after)
            .to_string();
        let text = clean_output(&self.buffer[..idx], &self.command);

        Some(Framed { text, remainder })
    }

    /// Everything captured so far. Used when the process exits before the
    /// marker ever appears.
    pub fn into_captured(self) -> String {
        self.buffer
    }
}

/// Strip the echoed command (terminals with a tty echo input lines back)
/// and surrounding whitespace from a command's raw output.
fn clean_output(raw: &str, command: &str) -> String {
    let command = command.trim();
    raw.lines()
        .filter(|line| line.trim() != command)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Drop every line containing `marker` from `text` and trim the rest.
/// Used for the boot banner, where the probe's own echo must not appear.
pub fn strip_marker_lines(text: &str, marker: &str) -> String {
    text.lines()
        .filter(|line| !line.contains(marker))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framer_for(command: &str) -> (Framer, String) {
        let marker = Marker::generate();
        let token = marker.as_str().to_string();
        (Framer::new(&marker, command), token)
    }

    #[test]
    fn test_single_chunk() {
        let (mut framer, token) = framer_for("echo hello");
        let framed = framer.push(&format!("hello\n{token}\n")).unwrap();
        assert_eq!(framed.text, "hello");
        assert_eq!(framed.remainder, "");
    }

    #[test]
    fn test_marker_split_across_chunks() {
        let (mut framer, token) = framer_for("ls");
        let (head, tail) = token.split_at(4);

        assert!(framer.push("file-a\nfile-b\n").is_none());
        assert!(framer.push(head).is_none());
        let framed = framer.push(&format!("{tail}\n")).unwrap();
        assert_eq!(framed.text, "file-a\nfile-b");
    }

    #[test]
    fn test_no_marker_keeps_waiting() {
        let (mut framer, _token) = framer_for("cat big-file");
        assert!(framer.push("partial output ").is_none());
        assert!(framer.push("more output").is_none());
        assert_eq!(framer.into_captured(), "partial output more output");
    }

    #[test]
    fn test_echoed_command_is_stripped() {
        let (mut framer, token) = framer_for("echo hi");
        let framed = framer.push(&format!("echo hi\nhi\n{token}\n")).unwrap();
        assert_eq!(framed.text, "hi");
    }

    #[test]
    fn test_trailing_newline_stripped() {
        let (mut framer, token) = framer_for("pwd");
        let framed = framer.push(&format!("/root\n\n{token}\n")).unwrap();
        assert_eq!(framed.text, "/root");
    }

    #[test]
    fn test_remainder_after_marker() {
        let (mut framer, token) = framer_for("true");
        let framed = framer.push(&format!("{token}\nleftover")).unwrap();
        assert_eq!(framed.text, "");
        assert_eq!(framed.remainder, "leftover");
    }

    #[test]
    fn test_crlf_after_marker() {
        let (mut framer, token) = framer_for("true");
        let framed = framer.push(&format!("done\r\n{token}\r\nnext")).unwrap();
        assert_eq!(framed.text, "done");
        assert_eq!(framed.remainder, "next");
    }

    #[test]
    fn test_strip_marker_lines() {
        let text = "Welcome\n__PROBE__\nready\n";
        assert_eq!(strip_marker_lines(text, "__PROBE__"), "Welcome\nready");
        assert_eq!(strip_marker_lines("__PROBE__\n", "__PROBE__"), "");
    }
}
