use crate::error::{LedgerError, Result};
use serde::Deserialize;
use std::io::Read;

/// One inbound event as handed over by the transport: who sent what.
///
/// The transport is responsible for resolving the caller to an identity
/// string; an empty `identity` means resolution failed and the core will
/// refuse identity-bound commands.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct InboundEvent {
    pub identity: String,
    pub command: String,
    #[serde(default)]
    pub args: String,
}

/// Reads inbound events from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over
/// `Result<InboundEvent>`. It handles whitespace trimming and flexible record
/// lengths automatically.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    /// Creates a new `EventReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes events.
    pub fn events(self) -> impl Iterator<Item = Result<InboundEvent>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_valid_stream() {
        let data = "identity,command,args\n42, check-in,\n9001, credit, 42 10";
        let reader = EventReader::new(data.as_bytes());
        let events: Vec<Result<InboundEvent>> = reader.events().collect();

        assert_eq!(events.len(), 2);
        let first = events[0].as_ref().unwrap();
        assert_eq!(first.identity, "42");
        assert_eq!(first.command, "check-in");
        assert_eq!(first.args, "");

        let second = events[1].as_ref().unwrap();
        assert_eq!(second.args, "42 10");
    }

    #[test]
    fn test_reader_preserves_empty_identity() {
        // An unresolvable caller arrives as an empty identity; the reader
        // passes it through so the core can refuse it itself.
        let data = "identity,command,args\n,info,";
        let reader = EventReader::new(data.as_bytes());
        let events: Vec<Result<InboundEvent>> = reader.events().collect();
        assert_eq!(events[0].as_ref().unwrap().identity, "");
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "identity,command,args\n\"unterminated";
        let reader = EventReader::new(data.as_bytes());
        let events: Vec<Result<InboundEvent>> = reader.events().collect();
        assert!(events[0].is_err());
    }
}
