//! JSON-lines event scripts
//!
//! One [`PatchEvent`] per line. Blank lines and `#` comments are skipped.

use std::io::BufRead;

use thiserror::Error;

use crate::patchbay::PatchEvent;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub fn read_events(reader: impl BufRead) -> Result<Vec<PatchEvent>, ReplayError> {
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event = serde_json::from_str(trimmed).map_err(|source| ReplayError::Parse {
            line: index + 1,
            source,
        })?;
        events.push(event);
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_script() {
        let script = r#"
# two capture ports
{"event":"add_port","name":"system:capture_1","port_type":"audio","flags":6}
{"event":"add_port","name":"system:capture_2","port_type":"audio","flags":6}

{"event":"update_group_position","direction":"output","group":"system","x":10,"y":20}
"#;
        let events = read_events(script.as_bytes()).unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[2], PatchEvent::UpdateGroupPosition { x: 10, .. }));
    }

    #[test]
    fn test_reports_bad_line() {
        let script = "{\"event\":\"remove_port\",\"name\":\"a:b\"}\n{\"event\":\"bogus\"}\n";
        match read_events(script.as_bytes()) {
            Err(ReplayError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
