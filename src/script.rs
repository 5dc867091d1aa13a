//! Embedded enumeration script.

/// The script as compiled into the binary.
pub const SCRIPT: &[u8] = include_bytes!("../assets/lse.sh");

/// Convert CRLF line endings to LF and drop stray carriage returns.
///
/// A script checked out on Windows must not feed carriage returns into a
/// Linux shell.
pub fn normalize_line_endings(script: &[u8]) -> Vec<u8> {
    let mut normalized = Vec::with_capacity(script.len());
    let mut bytes = script.iter().peekable();
    while let Some(&b) = bytes.next() {
        if b == b'\r' {
            if bytes.peek() == Some(&&b'\n') {
                bytes.next();
                normalized.push(b'\n');
            }
            continue;
        }
        normalized.push(b);
    }
    normalized
}
