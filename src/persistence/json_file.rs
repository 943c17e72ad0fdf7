// src/persistence/json_file.rs
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use serde_json::{from_str, to_string};
use thiserror::Error;

use crate::domain::{handle, Command, Errors, Repository};

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Failed to access journal: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse command on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize command: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("Command on line {line} no longer applies: {source}")]
    Replay {
        line: usize,
        #[source]
        source: Errors,
    },
}

/// Reads a journal with one JSON command per line. A missing file is an
/// empty journal.
pub fn read_commands<P: AsRef<Path>>(path: P) -> Result<Vec<Command>, JournalError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let reader = BufReader::new(file);

    let mut commands = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let command = from_str(&line).map_err(|source| JournalError::Parse { line: index + 1, source })?;
        commands.push(command);
    }
    Ok(commands)
}

pub fn append_command<P: AsRef<Path>>(path: P, command: &Command) -> Result<(), JournalError> {
    let json = to_string(command).map_err(JournalError::Serialize)?;
    let mut file = OpenOptions::new().append(true).create(true).open(path)?;
    writeln!(file, "{}", json)?;
    file.flush()?;
    Ok(())
}

/// Rebuilds the repository by handling every command again, in order.
pub fn replay(commands: Vec<Command>) -> Result<Repository, JournalError> {
    commands
        .into_iter()
        .enumerate()
        .try_fold(Repository::default(), |repository, (index, command)| {
            handle(command, repository)
                .map(|(_, next)| next)
                .map_err(|source| JournalError::Replay { line: index + 1, source })
        })
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Repository, JournalError> {
    replay(read_commands(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CommissionConfig, ContactForm};
    use chrono::{TimeZone, Utc};
    use std::fs;
    use uuid::Uuid;

    fn submit(n: u128) -> Command {
        Command::SubmitContactQuery {
            at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            query_id: Uuid::from_u128(n),
            form: ContactForm {
                name: Some("Jane".into()),
                email: Some("jane@example.com".into()),
                user_type: Some("bidder".into()),
                message: Some("Where is my car?".into()),
                ..ContactForm::default()
            },
            ip_address: None,
            user_agent: None,
        }
    }

    #[test]
    fn missing_journal_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_commands(dir.path().join("none.jsonl")).unwrap().is_empty());
    }

    #[test]
    fn appended_commands_replay_to_the_same_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        let commands = vec![
            submit(1),
            submit(2),
            Command::UpdateCommission {
                at: Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap(),
                config: CommissionConfig { seller_fee_bps: 250, ..CommissionConfig::default() },
            },
        ];
        let mut expected = Repository::default();
        for command in &commands {
            append_command(&path, command).unwrap();
            expected = handle(command.clone(), expected).unwrap().1;
        }

        assert_eq!(read_commands(&path).unwrap(), commands);
        assert_eq!(load(&path).unwrap(), expected);
    }

    #[test]
    fn reports_the_broken_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.jsonl");
        append_command(&path, &submit(1)).unwrap();
        let mut content = fs::read_to_string(&path).unwrap();
        content.push_str("{not json}\n");
        fs::write(&path, content).unwrap();

        match read_commands(&path) {
            Err(JournalError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn replay_stops_at_commands_that_fail() {
        match replay(vec![submit(1), submit(1)]) {
            Err(JournalError::Replay { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected replay error, got {:?}", other),
        }
    }
}
