// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// The location where a vote was cast: (zone, polling place, section).
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct GeoKey {
    pub zone: u32,
    pub polling_place: u32,
    pub section: u32,
}

/// Key into the candidate registry.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct CandidateKey {
    pub office: String,
    pub ballot_number: String,
}

/// A row of vote data, as produced by the readers.
///
/// All the fields are kept as raw text. A field is `None` when the column
/// does not exist in the source. Validation into a [VoteRecord] happens in
/// the aggregation engine, one row at a time.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawVoteRow {
    pub zone: Option<String>,
    pub section: Option<String>,
    pub polling_place: Option<String>,
    pub office: Option<String>,
    pub city: Option<String>,
    pub candidate_name: Option<String>,
    pub ballot_number: Option<String>,
    pub votes: Option<String>,
    pub sequence_id: Option<String>,
}

/// A validated vote row. Text fields are normalized.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRecord {
    pub geo: GeoKey,
    pub office: String,
    pub city: String,
    pub candidate_name: String,
    pub ballot_number: String,
    pub votes: u64,
    /// Inline candidate sequence id, when the source carries one.
    pub sequence_id: Option<String>,
}

/// A row of the geographic reference table.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct GeoRow {
    pub zone: Option<String>,
    pub polling_place: Option<String>,
    pub section: Option<String>,
    pub neighborhood: Option<String>,
}

/// A row of the candidate roster of one year.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RosterRow {
    pub office: Option<String>,
    pub ballot_number: Option<String>,
    pub sequence_id: Option<String>,
}

// ******** Output data structures *********

/// The final tally of a candidate within one scope (city or neighborhood).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateTally {
    pub name: String,
    /// The ballot number of the first row seen for this name.
    pub ballot_number: String,
    pub votes: u64,
    pub sequence_id: Option<String>,
    /// 1-based position within the scope.
    pub rank: u32,
}

/// Totals and ranked candidates of a city or of a neighborhood.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ScopeAggregate {
    pub total_votes: u64,
    /// Sorted by rank.
    pub candidates: Vec<CandidateTally>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CityAggregate {
    pub scope: ScopeAggregate,
    pub neighborhoods: BTreeMap<String, ScopeAggregate>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct OfficeAggregate {
    pub statewide_votes: u64,
    pub cities: BTreeMap<String, CityAggregate>,
}

/// Counters collected while ingesting a batch of rows.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct IngestStats {
    pub accepted: u64,
    pub skipped_missing_field: u64,
    pub skipped_not_a_number: u64,
    /// Rows whose count would push the total of their office past `u64::MAX`.
    pub skipped_overflow: u64,
    /// Accepted records whose location has no neighborhood.
    pub without_neighborhood: u64,
    /// Accepted records whose sequence id came from the registry.
    pub registry_hits: u64,
}

impl IngestStats {
    pub fn skipped(&self) -> u64 {
        self.skipped_missing_field + self.skipped_not_a_number + self.skipped_overflow
    }
}

/// The finalized summary of one reporting year.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Summary {
    pub offices: BTreeMap<String, OfficeAggregate>,
    pub stats: IngestStats,
}

// ********* Errors **********

/// The reason a single row was rejected.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RecordError {
    MissingField(&'static str),
    NotANumber { field: &'static str, value: String },
    /// The count does not fit in the running total of the office.
    CountOverflow { office: String, votes: u64 },
}

impl Error for RecordError {}

impl Display for RecordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordError::MissingField(field) => write!(f, "missing field {}", field),
            RecordError::NotANumber { field, value } => {
                write!(f, "field {} is not a number: {:?}", field, value)
            }
            RecordError::CountOverflow { office, votes } => {
                write!(f, "{} votes overflow the total of office {:?}", votes, office)
            }
        }
    }
}
