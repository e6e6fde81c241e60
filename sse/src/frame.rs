//! Encoding of events into SSE wire text.
//!
//! Field order within a frame is fixed: `id:`, then `event:`, then one or more
//! `data:` lines, then a blank line.

use axum::body::Bytes;
use std::fmt::Write as _;
use std::time::Duration;

const PING: &str = "data: \n\n";

/// Encode a data-bearing frame.
///
/// Multi-line data is split on `\r\n`, `\n` and `\r`, each line getting its own
/// `data:` field. Absent or empty data still yields a single empty `data:` line.
pub fn encode(id: u64, event: Option<&str>, data: Option<&str>) -> Bytes {
    let data = data.unwrap_or_default();
    let mut out = String::with_capacity(data.len() + 32);

    let _ = writeln!(out, "id: {id}");
    if let Some(event) = event {
        let _ = writeln!(out, "event: {event}");
    }
    for line in split_lines(data) {
        out.push_str("data: ");
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');

    Bytes::from(out)
}

/// The keep-alive frame: no id, no event name, one empty `data:` line.
pub fn ping() -> Bytes {
    Bytes::from_static(PING.as_bytes())
}

/// The reconnection directive written at the start of every stream.
pub fn retry(interval: Duration) -> String {
    format!("retry: {}\n\n", interval.as_millis())
}

/// Split on every line break, treating `\r\n` as one break.
fn split_lines(data: &str) -> impl Iterator<Item = &str> {
    data.split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(bytes: Bytes) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_single_line_without_event() {
        assert_eq!(text(encode(1, None, Some("something"))), "id: 1\ndata: something\n\n");
    }

    #[test]
    fn test_event_line_comes_between_id_and_data() {
        assert_eq!(
            text(encode(7, Some("myEvent"), Some("x"))),
            "id: 7\nevent: myEvent\ndata: x\n\n"
        );
    }

    #[test]
    fn test_multi_line_payload_gets_one_data_line_each() {
        assert_eq!(
            text(encode(3, None, Some("a\nb\r\nc\rd"))),
            "id: 3\ndata: a\ndata: b\ndata: c\ndata: d\n\n"
        );
    }

    #[test]
    fn test_empty_lines_inside_payload_are_kept() {
        assert_eq!(
            text(encode(3, None, Some("a\n\nb"))),
            "id: 3\ndata: a\ndata: \ndata: b\n\n"
        );
    }

    #[test]
    fn test_absent_payload_yields_empty_data_line() {
        assert_eq!(text(encode(2, Some("tick"), None)), "id: 2\nevent: tick\ndata: \n\n");
        assert_eq!(text(encode(2, Some("tick"), Some(""))), "id: 2\nevent: tick\ndata: \n\n");
    }

    #[test]
    fn test_ping_has_no_id_or_event() {
        let ping = text(ping());
        assert_eq!(ping, "data: \n\n");
        assert!(!ping.contains("id:"));
        assert!(!ping.contains("event:"));
    }

    #[test]
    fn test_retry_directive_uses_milliseconds() {
        assert_eq!(retry(Duration::from_millis(4321)), "retry: 4321\n\n");
    }
}
