/*!
Aggregation of electoral vote tallies by office, city and neighborhood.

The input is a stream of rows, one per (section, candidate) pair, each carrying
a vote count. Rows are grouped by office, then by city, then by neighborhood
(found through a [NeighborhoodTable]), and the candidates of every city and
every neighborhood are ranked by their number of votes.

```
use vote_aggregation::*;

let table = NeighborhoodTable::from_rows(vec![GeoRow {
    zone: Some("1".to_string()),
    polling_place: Some("10".to_string()),
    section: Some("100".to_string()),
    neighborhood: Some("Centro".to_string()),
}]);
let row = RawVoteRow {
    zone: Some("1".to_string()),
    section: Some("100".to_string()),
    polling_place: Some("10".to_string()),
    office: Some("Governador".to_string()),
    city: Some("Niterói".to_string()),
    candidate_name: Some("Alice".to_string()),
    ballot_number: Some("10".to_string()),
    votes: Some("42".to_string()),
    sequence_id: None,
};
let summary = aggregate_votes(vec![row], &table, &CandidateRegistry::empty());
let city = &summary.offices["GOVERNADOR"].cities["NITERÓI"];
assert_eq!(city.neighborhoods["CENTRO"].total_votes, 42);
```
*/

mod config;
use log::{debug, info};

use std::{
    collections::{BTreeMap, HashMap},
    ops::{Add, AddAssign},
};

pub mod builder;
pub mod lookup;
pub mod manual;

pub use crate::builder::Builder;
pub use crate::config::*;
pub use crate::lookup::{CandidateRegistry, NeighborhoodTable};

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash, Default)]
struct VoteCount(u64);

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

impl Add for VoteCount {
    type Output = VoteCount;
    fn add(self: VoteCount, rhs: VoteCount) -> VoteCount {
        VoteCount(self.0 + rhs.0)
    }
}

impl VoteCount {
    fn checked_add(self, rhs: VoteCount) -> Option<VoteCount> {
        self.0.checked_add(rhs.0).map(VoteCount)
    }
}

// A candidate while the votes are still coming in. The rank does not exist yet.
#[derive(Eq, PartialEq, Debug, Clone)]
struct RunningTally {
    name: String,
    ballot_number: String,
    sequence_id: Option<String>,
    votes: VoteCount,
}

// Candidates are kept in first-seen order. The index maps a name to its position.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
struct ScopeState {
    total: VoteCount,
    candidates: Vec<RunningTally>,
    index: HashMap<String, usize>,
}

impl ScopeState {
    fn add(&mut self, record: &VoteRecord, sequence_id: Option<&str>) {
        let count = VoteCount(record.votes);
        self.total += count;
        if let Some(&idx) = self.index.get(&record.candidate_name) {
            // First seen wins for the ballot number and the sequence id.
            self.candidates[idx].votes += count;
        } else {
            self.index.insert(record.candidate_name.clone(), self.candidates.len());
            self.candidates.push(RunningTally {
                name: record.candidate_name.clone(),
                ballot_number: record.ballot_number.clone(),
                sequence_id: sequence_id.map(|s| s.to_string()),
                votes: count,
            });
        }
    }

    fn finalize(self) -> ScopeAggregate {
        ScopeAggregate {
            total_votes: self.total.0,
            candidates: rank_candidates(self.candidates),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
struct CityState {
    scope: ScopeState,
    neighborhoods: BTreeMap<String, ScopeState>,
}

impl CityState {
    fn neighborhood_mut(&mut self, name: &str) -> &mut ScopeState {
        self.neighborhoods.entry(name.to_string()).or_default()
    }

    fn finalize(self) -> CityAggregate {
        CityAggregate {
            scope: self.scope.finalize(),
            neighborhoods: self
                .neighborhoods
                .into_iter()
                .map(|(name, hood)| (name, hood.finalize()))
                .collect(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
struct OfficeState {
    total: VoteCount,
    cities: BTreeMap<String, CityState>,
}

impl OfficeState {
    fn city_mut(&mut self, name: &str) -> &mut CityState {
        self.cities.entry(name.to_string()).or_default()
    }

    fn finalize(self) -> OfficeAggregate {
        OfficeAggregate {
            statewide_votes: self.total.0,
            cities: self
                .cities
                .into_iter()
                .map(|(name, city)| (name, city.finalize()))
                .collect(),
        }
    }
}

/// Sorts by decreasing number of votes and assigns the ranks.
///
/// The sort is stable: candidates with the same number of votes keep the
/// order in which they were first seen.
fn rank_candidates(mut candidates: Vec<RunningTally>) -> Vec<CandidateTally> {
    candidates.sort_by(|a, b| b.votes.cmp(&a.votes));
    candidates
        .into_iter()
        .enumerate()
        .map(|(idx, rt)| CandidateTally {
            name: rt.name,
            ballot_number: rt.ballot_number,
            votes: rt.votes.0,
            sequence_id: rt.sequence_id,
            rank: (idx + 1) as u32,
        })
        .collect()
}

/// Trims and uppercases a piece of text.
pub fn normalize(s: &str) -> String {
    s.trim().to_uppercase()
}

pub(crate) fn parse_int(value: Option<&str>, field: &'static str) -> Result<u32, RecordError> {
    let s = value.ok_or(RecordError::MissingField(field))?.trim();
    s.parse::<u32>().map_err(|_| RecordError::NotANumber {
        field,
        value: s.to_string(),
    })
}

fn parse_count(value: Option<&str>, field: &'static str) -> Result<u64, RecordError> {
    let s = value.ok_or(RecordError::MissingField(field))?.trim();
    s.parse::<u64>().map_err(|_| RecordError::NotANumber {
        field,
        value: s.to_string(),
    })
}

// Empty text is a valid key.
fn text_field(value: Option<&str>, field: &'static str) -> Result<String, RecordError> {
    value.map(normalize).ok_or(RecordError::MissingField(field))
}

impl RawVoteRow {
    /// Checks and normalizes a row.
    ///
    /// The office, the city and the candidate name are uppercased, and may be
    /// empty. An empty inline sequence id counts as absent.
    pub fn validate(&self) -> Result<VoteRecord, RecordError> {
        let geo = GeoKey {
            zone: parse_int(self.zone.as_deref(), "zone")?,
            polling_place: parse_int(self.polling_place.as_deref(), "polling_place")?,
            section: parse_int(self.section.as_deref(), "section")?,
        };
        let votes = parse_count(self.votes.as_deref(), "votes")?;
        let office = text_field(self.office.as_deref(), "office")?;
        let city = text_field(self.city.as_deref(), "city")?;
        let candidate_name = text_field(self.candidate_name.as_deref(), "candidate_name")?;
        let ballot_number = self
            .ballot_number
            .as_deref()
            .ok_or(RecordError::MissingField("ballot_number"))?
            .trim()
            .to_string();
        let sequence_id = self
            .sequence_id
            .as_deref()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        Ok(VoteRecord {
            geo,
            office,
            city,
            candidate_name,
            ballot_number,
            votes,
            sequence_id,
        })
    }
}

/// Aggregates all the rows of one reporting year.
///
/// Arguments:
/// * `rows` the vote rows, in the order of the source. Malformed rows are
/// skipped and counted in [Summary::stats].
/// * `neighborhoods` the location to neighborhood mapping
/// * `registry` the candidate sequence ids, used when a row does not carry one
pub fn aggregate_votes<I>(
    rows: I,
    neighborhoods: &NeighborhoodTable,
    registry: &CandidateRegistry,
) -> Summary
where
    I: IntoIterator<Item = RawVoteRow>,
{
    let mut builder = Builder::new(neighborhoods, registry);
    for row in rows {
        if let Err(e) = builder.add_raw(&row) {
            debug!("aggregate_votes: skipping row {:?}: {}", row, e);
        }
    }
    let summary = builder.finish();
    let num_cities: usize = summary.offices.values().map(|o| o.cities.len()).sum();
    info!(
        "aggregate_votes: {} records accepted, {} skipped ({} missing field, {} not a number, {} count overflow), {} without neighborhood",
        summary.stats.accepted,
        summary.stats.skipped(),
        summary.stats.skipped_missing_field,
        summary.stats.skipped_not_a_number,
        summary.stats.skipped_overflow,
        summary.stats.without_neighborhood
    );
    info!(
        "aggregate_votes: {} offices, {} (office, city) pairs",
        summary.offices.len(),
        num_cities
    );
    summary
}
