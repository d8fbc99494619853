//! Frame line parsing.

use homewire_app::ports::Frame;

/// Parse one `code:dump` line; `None` for anything else.
#[must_use]
pub fn parse_frame(line: &str) -> Option<Frame> {
    let (code, dump) = line.trim().split_once(':')?;
    if dump.contains(':') {
        return None;
    }
    Some(Frame::new(code, dump))
}
