//! Event Log - append-only event streams
//!
//! Each payload type has its own JSONL stream file. Every record is stamped
//! by the shared [`Sequencer`], so "everything after sequence S" is a single
//! query across all streams.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use crate::types::{Envelope, EventPayload, RawEnvelope};

use super::error::StoreResult;
use super::sequencer::Sequencer;

/// Append-only, sequenced event streams
pub struct EventLog {
    events_dir: PathBuf,
    sequencer: Arc<Sequencer>,
    /// Held across sequence issue and write so each stream stays in sequence order
    write_lock: Mutex<()>,
}

impl EventLog {
    /// Create an event log rooted at `events_dir`
    pub fn new<P: AsRef<Path>>(events_dir: P, sequencer: Arc<Sequencer>) -> Self {
        Self {
            events_dir: events_dir.as_ref().to_path_buf(),
            sequencer,
            write_lock: Mutex::new(()),
        }
    }

    pub fn sequencer(&self) -> &Arc<Sequencer> {
        &self.sequencer
    }

    fn stream_path(&self, stream: &str) -> PathBuf {
        self.events_dir.join(format!("{}.jsonl", stream))
    }

    /// Append an event recorded now
    pub fn append<T: EventPayload>(&self, payload: T) -> StoreResult<Envelope<T>> {
        self.append_at(payload, Utc::now())
    }

    /// Append an event with an explicit timestamp.
    ///
    /// The line is fsync'd before the envelope is returned. If the write fails
    /// after a sequence was issued, that number is simply never used.
    pub fn append_at<T: EventPayload>(
        &self,
        payload: T,
        timestamp: DateTime<Utc>,
    ) -> StoreResult<Envelope<T>> {
        let _guard = self.write_lock.lock();

        fs::create_dir_all(&self.events_dir)?;

        let sequence = self.sequencer.next()?;
        let envelope = Envelope::new(sequence, timestamp, payload);
        let json_line = envelope.to_json_line()?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(self.stream_path(T::STREAM))?;
        let len = file.metadata()?.len();

        let mut line = String::with_capacity(json_line.len() + 2);
        if len > 0 && !ends_with_newline(&mut file)? {
            // Leftover of an interrupted write; keep it on its own line
            tracing::warn!(stream = T::STREAM, "stream ends with a partial line");
            line.push('\n');
        }
        line.push_str(&json_line);
        line.push('\n');

        if let Err(e) = file.write_all(line.as_bytes()) {
            if let Err(trunc) = file.set_len(len) {
                tracing::warn!(stream = T::STREAM, error = %trunc, "failed to roll back partial append");
            }
            return Err(e.into());
        }
        file.sync_all()?;

        tracing::debug!(stream = T::STREAM, sequence, "appended event");
        Ok(envelope)
    }

    /// Load every event of one stream, oldest first
    pub fn load<T: EventPayload>(&self) -> StoreResult<Vec<Envelope<T>>> {
        read_stream(&self.stream_path(T::STREAM), T::STREAM)
    }

    /// Load events of one stream with a sequence greater than `after`
    pub fn load_after<T: EventPayload>(&self, after: u64) -> StoreResult<Vec<Envelope<T>>> {
        Ok(self
            .load::<T>()?
            .into_iter()
            .filter(|e| e.sequence > after)
            .collect())
    }

    /// Names of all streams that have been written
    pub fn streams(&self) -> StoreResult<Vec<String>> {
        if !self.events_dir.exists() {
            return Ok(Vec::new());
        }

        let mut streams = Vec::new();
        for entry in fs::read_dir(&self.events_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "jsonl").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    streams.push(stem.to_string());
                }
            }
        }
        streams.sort();
        Ok(streams)
    }

    /// Every event in every stream with a sequence greater than `after`,
    /// merged into sequence order
    pub fn load_all_after(&self, after: u64) -> StoreResult<Vec<RawEnvelope>> {
        let mut events = Vec::new();

        for stream in self.streams()? {
            let records: Vec<RawEnvelope> = read_stream(&self.stream_path(&stream), &stream)?;
            events.extend(records.into_iter().filter(|e| e.sequence > after).map(|mut e| {
                e.stream = stream.clone();
                e
            }));
        }

        events.sort_by_key(|e| e.sequence);
        Ok(events)
    }
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Read a JSONL stream, skipping lines that do not parse
fn read_stream<R: DeserializeOwned>(path: &Path, stream: &str) -> StoreResult<Vec<R>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(stream, line = line_num + 1, error = %e, "skipping malformed event");
            }
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        GemAward, GemAwardEvent, GemReason, MasteryState, MasteryTransitionEvent, Rarity,
        ReviewAnswerEvent,
    };
    use tempfile::TempDir;

    fn create_test_log() -> (EventLog, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let sequencer = Arc::new(Sequencer::open(temp_dir.path().join("sequence")).unwrap());
        let log = EventLog::new(temp_dir.path().join("events"), sequencer);
        (log, temp_dir)
    }

    fn answer(skill: &str, correct: bool) -> ReviewAnswerEvent {
        ReviewAnswerEvent {
            skill_id: skill.to_string(),
            correct,
            session_id: None,
        }
    }

    #[test]
    fn test_append_and_load() {
        let (log, _temp_dir) = create_test_log();

        let first = log.append(answer("add-1", true)).unwrap();
        let second = log.append(answer("add-2", false)).unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);

        let events = log.load::<ReviewAnswerEvent>().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].payload.skill_id, "add-1");
        assert!(!events[1].payload.correct);
    }

    #[test]
    fn test_missing_stream_is_empty() {
        let (log, _temp_dir) = create_test_log();
        assert!(log.load::<GemAwardEvent>().unwrap().is_empty());
        assert!(log.streams().unwrap().is_empty());
        assert!(log.load_all_after(0).unwrap().is_empty());
    }

    #[test]
    fn test_load_after() {
        let (log, _temp_dir) = create_test_log();

        for i in 1..=5 {
            log.append(answer(&format!("skill-{}", i), true)).unwrap();
        }

        let events = log.load_after::<ReviewAnswerEvent>(3).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].sequence, 4);
        assert_eq!(events[1].sequence, 5);
    }

    #[test]
    fn test_sequence_is_shared_across_streams() {
        let (log, _temp_dir) = create_test_log();

        log.append(answer("a", true)).unwrap();
        log.append(MasteryTransitionEvent {
            skill_id: "a".to_string(),
            from_state: MasteryState::Learning,
            to_state: MasteryState::Mastered,
            trigger: "practice".to_string(),
            fluency_score: 0.8,
            session_id: None,
        })
        .unwrap();
        log.append(GemAwardEvent {
            award: GemAward {
                rarity: Rarity::Common,
                reason: GemReason::SkillMastered,
                skill_id: Some("a".to_string()),
            },
            session_id: None,
        })
        .unwrap();
        log.append(answer("b", false)).unwrap();

        assert_eq!(
            log.streams().unwrap(),
            vec!["gem_awards", "mastery_transitions", "review_answers"]
        );

        let merged = log.load_all_after(1).unwrap();
        let order: Vec<(u64, &str)> = merged
            .iter()
            .map(|e| (e.sequence, e.stream.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (2, "mastery_transitions"),
                (3, "gem_awards"),
                (4, "review_answers")
            ]
        );
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let (log, temp_dir) = create_test_log();

        log.append(answer("a", true)).unwrap();
        let path = temp_dir.path().join("events").join("review_answers.jsonl");
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();
        writeln!(file).unwrap();
        drop(file);
        log.append(answer("b", true)).unwrap();

        let events = log.load::<ReviewAnswerEvent>().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].payload.skill_id, "b");
    }

    #[test]
    fn test_append_after_partial_line_is_kept() {
        let (log, temp_dir) = create_test_log();

        log.append(answer("a", true)).unwrap();
        let path = temp_dir.path().join("events").join("review_answers.jsonl");
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        write!(file, "{{\"sequence\": 9, \"timest").unwrap();
        drop(file);

        log.append(answer("b", false)).unwrap();

        let events = log.load::<ReviewAnswerEvent>().unwrap();
        let skills: Vec<&str> = events.iter().map(|e| e.payload.skill_id.as_str()).collect();
        assert_eq!(skills, vec!["a", "b"]);
        assert!(std::fs::read_to_string(&path).unwrap().ends_with("}\n"));
    }

    #[test]
    fn test_append_at_keeps_timestamp() {
        let (log, _temp_dir) = create_test_log();
        let ts = DateTime::parse_from_rfc3339("2025-01-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        log.append_at(answer("a", true), ts).unwrap();
        let events = log.load::<ReviewAnswerEvent>().unwrap();
        assert_eq!(events[0].timestamp, ts);
    }
}
