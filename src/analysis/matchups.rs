//! Matchup aggregation.
//!
//! Folds frame records into per-matchup accumulators, resolves each
//! player's character by majority vote, and emits filtered summaries sorted
//! by occurrence count.
//!
//! Every ordering decision is explicit so the output does not depend on hash
//! iteration order:
//! - character vote ties go to the label that was voted for first
//! - occurrence ties keep the order in which matchups were first seen

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

use super::config::AnalysisConfig;
use crate::extraction::record::{Character, FrameRecord};

/// Ordered (player 1, player 2) pair. `(A, B)` and `(B, A)` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchupKey {
    pub p1_name: String,
    pub p2_name: String,
}

/// Vote counts per character label, kept in first-vote order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterVotes {
    counts: Vec<(String, u32)>,
}

impl CharacterVotes {
    /// Adds `n` votes for `label`.
    pub fn add(&mut self, label: &str, n: u32) {
        match self.counts.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += n,
            None => self.counts.push((label.to_string(), n)),
        }
    }

    /// Counts one vote; `Unknown` is ignored.
    pub fn vote(&mut self, character: &Character) {
        if let Character::Known(label) = character {
            self.add(label, 1);
        }
    }

    #[cfg(test)]
    pub fn count(&self, label: &str) -> u32 {
        self.counts
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0, |(_, c)| *c)
    }

    #[cfg(test)]
    pub fn total(&self) -> u32 {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    /// Most-voted label; the earliest voted label wins a tie.
    pub fn winner(&self) -> Character {
        let mut best: Option<&(String, u32)> = None;
        for entry in &self.counts {
            match best {
                Some((_, best_count)) if entry.1 <= *best_count => {}
                _ => best = Some(entry),
            }
        }
        best.map_or(Character::Unknown, |(label, _)| Character::Known(label.clone()))
    }

    /// Folds `other` in after `self`; labels new to `self` are appended in `other`'s order.
    pub fn merge(&mut self, other: &CharacterVotes) {
        for (label, count) in &other.counts {
            self.add(label, *count);
        }
    }
}

/// Running totals for one matchup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchupAccumulator {
    pub p1_votes: CharacterVotes,
    pub p2_votes: CharacterVotes,
    /// Frames observed, whether or not they carried a character vote
    pub occurrences: u32,
}

/// Final row for one matchup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchupSummary {
    #[serde(rename = "player_1_name")]
    pub p1_name: String,
    #[serde(rename = "player_1_character")]
    pub p1_character: String,
    #[serde(rename = "player_2_name")]
    pub p2_name: String,
    #[serde(rename = "player_2_character")]
    pub p2_character: String,
    #[serde(rename = "occurrence")]
    pub occurrence_count: u32,
}

/// Aggregation state, scoped to one run.
#[derive(Debug, Clone)]
pub struct MatchupTable {
    min_name_length: usize,
    index: HashMap<MatchupKey, usize>,
    /// Keys and accumulators in first-seen order
    entries: Vec<(MatchupKey, MatchupAccumulator)>,
    counted: usize,
    discarded: usize,
}

impl MatchupTable {
    pub fn new(min_name_length: usize) -> Self {
        Self {
            min_name_length,
            index: HashMap::new(),
            entries: Vec::new(),
            counted: 0,
            discarded: 0,
        }
    }

    /// Builds a table by folding `records` in order.
    pub fn from_records(records: &[FrameRecord], min_name_length: usize) -> Self {
        let mut table = Self::new(min_name_length);
        for record in records {
            table.observe(record);
        }
        table
    }

    /// Builds a table on the rayon pool.
    ///
    /// Each contiguous chunk is folded into its own table; the partial tables
    /// are then merged in chunk order.
    pub fn from_records_parallel(records: &[FrameRecord], min_name_length: usize, chunk_size: usize) -> Self {
        let partials: Vec<MatchupTable> = records
            .par_chunks(chunk_size.max(1))
            .map(|chunk| Self::from_records(chunk, min_name_length))
            .collect();

        let mut table = Self::new(min_name_length);
        for partial in partials {
            table.merge(partial);
        }
        table
    }

    /// Folds one record in. Returns false when the record was discarded
    /// because a name is too short to be real.
    pub fn observe(&mut self, record: &FrameRecord) -> bool {
        if !self.is_real_name(&record.p1_name) || !self.is_real_name(&record.p2_name) {
            self.discarded += 1;
            return false;
        }

        let key = MatchupKey {
            p1_name: record.p1_name.clone(),
            p2_name: record.p2_name.clone(),
        };
        let acc = self.accumulator_mut(key);
        acc.occurrences += 1;
        acc.p1_votes.vote(&record.p1_character);
        acc.p2_votes.vote(&record.p2_character);

        self.counted += 1;
        true
    }

    /// Folds a later partial table into this one.
    ///
    /// Merging tables built from consecutive slices, in slice order, gives
    /// exactly the table a single sequential fold would.
    pub fn merge(&mut self, other: MatchupTable) {
        self.counted += other.counted;
        self.discarded += other.discarded;
        for (key, theirs) in other.entries {
            let acc = self.accumulator_mut(key);
            acc.occurrences += theirs.occurrences;
            acc.p1_votes.merge(&theirs.p1_votes);
            acc.p2_votes.merge(&theirs.p2_votes);
        }
    }

    fn accumulator_mut(&mut self, key: MatchupKey) -> &mut MatchupAccumulator {
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.index.insert(key.clone(), idx);
                self.entries.push((key, MatchupAccumulator::default()));
                idx
            }
        };
        &mut self.entries[idx].1
    }

    fn is_real_name(&self, name: &str) -> bool {
        name.chars().count() >= self.min_name_length
    }

    #[cfg(test)]
    pub fn get(&self, key: &MatchupKey) -> Option<&MatchupAccumulator> {
        self.index.get(key).map(|&idx| &self.entries[idx].1)
    }

    /// Number of distinct matchups.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Records that contributed to a matchup.
    pub fn counted(&self) -> usize {
        self.counted
    }

    /// Records dropped by the name filter.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Resolves characters, filters, and sorts by occurrence (descending, stable).
    pub fn finalize(&self, min_occurrences: u32) -> Vec<MatchupSummary> {
        let mut summaries: Vec<MatchupSummary> = self
            .entries
            .iter()
            .filter(|(_, acc)| acc.occurrences >= min_occurrences)
            .filter_map(|(key, acc)| {
                let p1 = acc.p1_votes.winner();
                let p2 = acc.p2_votes.winner();
                match (p1, p2) {
                    (Character::Known(p1_character), Character::Known(p2_character)) => {
                        Some(MatchupSummary {
                            p1_name: key.p1_name.clone(),
                            p1_character,
                            p2_name: key.p2_name.clone(),
                            p2_character,
                            occurrence_count: acc.occurrences,
                        })
                    }
                    _ => None,
                }
            })
            .collect();

        // sort_by is stable: equal counts keep first-seen order
        summaries.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));
        summaries
    }
}

/// Aggregation state plus the summaries resolved from it.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub table: MatchupTable,
    pub summaries: Vec<MatchupSummary>,
}

/// Aggregates records into sorted, filtered matchup summaries.
///
/// With `config.parallel` the records are folded in chunks on the rayon pool;
/// the output is identical to the sequential fold.
pub fn aggregate(records: &[FrameRecord], config: &AnalysisConfig) -> Aggregation {
    let table = if config.parallel {
        MatchupTable::from_records_parallel(records, config.min_name_length, config.chunk_size)
    } else {
        MatchupTable::from_records(records, config.min_name_length)
    };
    let summaries = table.finalize(config.min_occurrences);
    Aggregation { table, summaries }
}
