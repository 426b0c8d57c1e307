//! Event table: labeled, scored observations keyed by id.
//!
//! The table is the single input to the sweep. It is built once from a
//! whitespace-separated triple file and read-only afterwards. Ids are
//! non-negative and unique; feeding the same id twice overwrites the earlier
//! observation (last write wins).
//!
//! Input parsing is deliberately lenient: each line is consumed greedily as
//! `(id, label, score)` triples, and the first token run that does not form
//! a complete, parseable triple ends the line. Unreadable files, by
//! contrast, are a hard error.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::{btree_map, BTreeMap};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// One labeled, scored observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// True when the input label was exactly 1.
    pub is_event: bool,
    /// Prediction strength; compared against sweep thresholds with `>`.
    pub score: f64,
}

/// Summary of a loaded table, for startup logging.
///
/// Score statistics are NaN when the table is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub observations: usize,
    pub events: usize,
    pub score_mean: f64,
    pub score_std_dev: f64,
    pub score_min: f64,
    pub score_max: f64,
}

/// Observations keyed by id, ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    observations: BTreeMap<u64, Observation>,
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a table from a triple file.
    ///
    /// An unreadable file is an error. Malformed content inside a readable
    /// file is skipped per [`EventTable::ingest_line`]; an empty file yields
    /// an empty table.
    pub fn from_path(path: &Path) -> io::Result<EventTable> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load a table from any line-oriented reader.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<EventTable> {
        let mut table = EventTable::new();
        for line in reader.lines() {
            table.ingest_line(&line?);
        }
        Ok(table)
    }

    /// Consume `(id, label, score)` triples from one input line.
    ///
    /// Triples are read greedily left to right; a line may carry any number
    /// of them. Reading stops at the first incomplete or unparseable triple
    /// and the rest of the line is ignored. Returns the number of triples
    /// stored.
    pub fn ingest_line(&mut self, line: &str) -> usize {
        let mut tokens = line.split_whitespace();
        let mut stored = 0;
        loop {
            let Some(id_token) = tokens.next() else {
                return stored;
            };
            let (Some(label_token), Some(score_token)) = (tokens.next(), tokens.next()) else {
                debug!(token = id_token, "incomplete triple at end of line");
                return stored;
            };
            let Ok(id) = id_token.parse::<u64>() else {
                debug!(token = id_token, "unparseable id, skipping rest of line");
                return stored;
            };
            let Ok(label) = label_token.parse::<u32>() else {
                debug!(token = label_token, "unparseable label, skipping rest of line");
                return stored;
            };
            let Ok(score) = fast_float::parse::<f64, _>(score_token) else {
                debug!(token = score_token, "unparseable score, skipping rest of line");
                return stored;
            };
            self.insert(
                id,
                Observation {
                    is_event: label == 1,
                    score,
                },
            );
            stored += 1;
        }
    }

    pub fn insert(&mut self, id: u64, observation: Observation) {
        self.observations.insert(id, observation);
    }

    pub fn get(&self, id: u64) -> Option<&Observation> {
        self.observations.get(&id)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Observations in ascending id order.
    pub fn iter(&self) -> btree_map::Iter<'_, u64, Observation> {
        self.observations.iter()
    }

    /// Observations whose ids lie in the inclusive window
    /// `[center - flex_width, center + flex_width]`.
    ///
    /// Bounds saturate at the edges of the id domain; a window around a
    /// small id simply starts at 0 rather than wrapping.
    pub fn window(&self, center: u64, flex_width: u64) -> btree_map::Range<'_, u64, Observation> {
        let lo = center.saturating_sub(flex_width);
        let hi = center.saturating_add(flex_width);
        self.observations.range(lo..=hi)
    }

    /// Count of true events (label 1).
    pub fn event_count(&self) -> usize {
        self.observations.values().filter(|o| o.is_event).count()
    }

    pub fn summary(&self) -> TableSummary {
        let scores: Vec<f64> = self.observations.values().map(|o| o.score).collect();
        TableSummary {
            observations: self.len(),
            events: self.event_count(),
            score_mean: scores.iter().mean(),
            score_std_dev: scores.iter().std_dev(),
            score_min: Statistics::min(scores.iter()),
            score_max: Statistics::max(scores.iter()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn obs(is_event: bool, score: f64) -> Observation {
        Observation { is_event, score }
    }

    #[test]
    fn test_single_triple() {
        let mut table = EventTable::new();
        assert_eq!(table.ingest_line("7 1 0.25"), 1);
        assert_eq!(table.get(7), Some(&obs(true, 0.25)));
    }

    #[test]
    fn test_multiple_triples_per_line() {
        let mut table = EventTable::new();
        assert_eq!(table.ingest_line("1 1 0.9 2 0 0.1 3 1 0.8"), 3);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(2), Some(&obs(false, 0.1)));
    }

    #[test]
    fn test_stops_at_malformed_triple() {
        let mut table = EventTable::new();
        // Second triple has a bad id; it and everything after are dropped.
        assert_eq!(table.ingest_line("1 1 0.9 oops 0 0.5 2 0 0.3"), 1);
        assert_eq!(table.len(), 1);
        assert!(table.get(2).is_none());
    }

    #[test]
    fn test_stops_at_incomplete_triple() {
        let mut table = EventTable::new();
        assert_eq!(table.ingest_line("1 1 0.9 2 0"), 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_bad_label_and_score() {
        let mut table = EventTable::new();
        assert_eq!(table.ingest_line("1 x 0.9"), 0);
        assert_eq!(table.ingest_line("1 1 what"), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_negative_id_rejected() {
        let mut table = EventTable::new();
        assert_eq!(table.ingest_line("-1 1 0.5"), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_garbage_line_ignored() {
        let mut table = EventTable::new();
        assert_eq!(table.ingest_line("# comment line"), 0);
        assert_eq!(table.ingest_line(""), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_score_notation() {
        let mut table = EventTable::new();
        assert_eq!(table.ingest_line("1 1 1e-3 2 0 .5"), 2);
        assert_eq!(table.get(1), Some(&obs(true, 0.001)));
        assert_eq!(table.get(2), Some(&obs(false, 0.5)));
    }

    #[test]
    fn test_last_write_wins() {
        let mut table = EventTable::new();
        table.ingest_line("5 1 0.9");
        table.ingest_line("5 0 0.1");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(5), Some(&obs(false, 0.1)));
    }

    #[test]
    fn test_non_one_label_is_background() {
        let mut table = EventTable::new();
        table.ingest_line("1 3 0.5");
        assert_eq!(table.get(1), Some(&obs(false, 0.5)));
    }

    #[test]
    fn test_from_reader() {
        let input = "1 1 0.9\n2 0 0.1\n\n3 1 0.8\n";
        let table = EventTable::from_reader(Cursor::new(input)).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.event_count(), 2);
    }

    #[test]
    fn test_empty_input() {
        let table = EventTable::from_reader(Cursor::new("")).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.event_count(), 0);
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = EventTable::from_path(Path::new("/nonexistent/events.dat"));
        assert!(err.is_err());
    }

    #[test]
    fn test_window_bounds() {
        let mut table = EventTable::new();
        table.ingest_line("3 0 0.1 4 1 0.2 5 0 0.3 6 0 0.4 9 1 0.5");
        let ids: Vec<u64> = table.window(5, 1).map(|(&id, _)| id).collect();
        assert_eq!(ids, vec![4, 5, 6]);
        let ids: Vec<u64> = table.window(5, 0).map(|(&id, _)| id).collect();
        assert_eq!(ids, vec![5]);
    }

    #[test]
    fn test_window_saturates_at_zero() {
        let mut table = EventTable::new();
        table.ingest_line("0 1 0.9 1 0 0.1 2 0 0.2");
        // A window of 5 around id 1 starts at 0, not at a wrapped huge id.
        let ids: Vec<u64> = table.window(1, 5).map(|(&id, _)| id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_summary() {
        let mut table = EventTable::new();
        table.ingest_line("1 1 0.1 2 0 0.9 3 0 0.5");
        let summary = table.summary();
        assert_eq!(summary.observations, 3);
        assert_eq!(summary.events, 1);
        assert!((summary.score_mean - 0.5).abs() < 1e-12);
        assert!((summary.score_min - 0.1).abs() < 1e-12);
        assert!((summary.score_max - 0.9).abs() < 1e-12);
        assert!((summary.score_std_dev - 0.4).abs() < 1e-12);
    }
}
