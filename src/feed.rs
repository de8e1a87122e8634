//! Newline-delimited JSON event feed.
//!
//! One [`ChainEvent`] per line. Blank lines are ignored. Events are returned in chain
//! order (block number, then log index) regardless of their order in the file.

use crate::domain::ChainEvent;
use std::io::BufRead;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to read event feed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed event on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse every event in `reader` and sort them into chain order.
pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<ChainEvent>, FeedError> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event: ChainEvent = serde_json::from_str(&line).map_err(|source| FeedError::Parse {
            line: index + 1,
            source,
        })?;
        events.push(event);
    }

    // stable: ties keep file order
    events.sort_by_key(ChainEvent::ordering_key);
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventKind;
    use std::io::Cursor;

    fn line(block: u64, log_index: u64, token_id: u64) -> String {
        serde_json::json!({
            "context": {
                "address": "0xc36442b4a4522e871399cd717abdd847ab11fe88",
                "block_number": block,
                "block_timestamp": 1_700_000_000u64 + block,
                "tx_hash": format!("0x{}", "ab".repeat(32)),
                "log_index": log_index,
                "tx_from": "0x000000000000000000000000000000000000beef"
            },
            "event": {
                "kind": "Transfer",
                "from": "0x0000000000000000000000000000000000000000",
                "to": "0x000000000000000000000000000000000000beef",
                "token_id": token_id.to_string()
            }
        })
        .to_string()
    }

    #[test]
    fn test_events_sorted_by_block_then_log_index() {
        let input = [line(12, 1, 3), String::new(), line(10, 7, 1), line(12, 0, 2)].join("\n");
        let events = read_events(Cursor::new(input)).unwrap();

        let keys: Vec<_> = events.iter().map(ChainEvent::ordering_key).collect();
        assert_eq!(keys, vec![(10, 7), (12, 0), (12, 1)]);
        assert!(matches!(events[0].event, EventKind::Transfer(_)));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let input = format!("{}\n{{\"context\": 1}}\n", line(1, 0, 1));
        match read_events(Cursor::new(input)) {
            Err(FeedError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other.map(|e| e.len())),
        }
    }

    #[test]
    fn test_empty_feed() {
        assert!(read_events(Cursor::new("")).unwrap().is_empty());
    }
}
