use log::{debug, info};
use std::collections::HashMap;

use crate::config::*;
use crate::{normalize, parse_int};

/// Mapping from a voting location to the neighborhood it belongs to.
///
/// Built once from the geographic reference table and then only read.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct NeighborhoodTable {
    entries: HashMap<GeoKey, String>,
    skipped: u64,
}

impl NeighborhoodTable {
    /// Builds the table from the rows of the reference dataset.
    ///
    /// Rows with a non-numeric key component or an empty label are dropped.
    /// When the same location appears several times, the last row wins.
    pub fn from_rows<I>(rows: I) -> NeighborhoodTable
    where
        I: IntoIterator<Item = GeoRow>,
    {
        let mut table = NeighborhoodTable::default();
        for row in rows {
            match parse_geo_row(&row) {
                Some((key, name)) => {
                    table.entries.insert(key, name);
                }
                None => {
                    debug!("NeighborhoodTable: skipping row {:?}", row);
                    table.skipped += 1;
                }
            }
        }
        info!(
            "NeighborhoodTable: {} sections with a neighborhood ({} rows skipped)",
            table.entries.len(),
            table.skipped
        );
        table
    }

    pub fn get(&self, key: &GeoKey) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of input rows that could not be used.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

fn parse_geo_row(row: &GeoRow) -> Option<(GeoKey, String)> {
    let zone = parse_int(row.zone.as_deref(), "zone").ok()?;
    let polling_place = parse_int(row.polling_place.as_deref(), "polling_place").ok()?;
    let section = parse_int(row.section.as_deref(), "section").ok()?;
    let name = normalize(row.neighborhood.as_deref()?);
    if name.is_empty() {
        return None;
    }
    let key = GeoKey {
        zone,
        polling_place,
        section,
    };
    Some((key, name))
}

/// Mapping from (office, ballot number) to the candidate sequence id.
///
/// Only needed for the years in which the vote data does not carry the
/// sequence id. An empty registry is valid and resolves nothing.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CandidateRegistry {
    entries: HashMap<CandidateKey, String>,
}

impl CandidateRegistry {
    pub fn empty() -> CandidateRegistry {
        CandidateRegistry::default()
    }

    pub fn from_rows<I>(rows: I) -> CandidateRegistry
    where
        I: IntoIterator<Item = RosterRow>,
    {
        let mut entries: HashMap<CandidateKey, String> = HashMap::new();
        let mut skipped: u64 = 0;
        for row in rows {
            let fields = (
                non_empty(row.office.as_deref()),
                non_empty(row.ballot_number.as_deref()),
                non_empty(row.sequence_id.as_deref()),
            );
            if let (Some(office), Some(ballot_number), Some(sequence_id)) = fields {
                let key = CandidateKey {
                    office: normalize(office),
                    ballot_number: ballot_number.to_string(),
                };
                entries.insert(key, sequence_id.to_string());
            } else {
                debug!("CandidateRegistry: skipping row {:?}", row);
                skipped += 1;
            }
        }
        info!(
            "CandidateRegistry: {} candidates loaded ({} rows skipped)",
            entries.len(),
            skipped
        );
        CandidateRegistry { entries }
    }

    /// The office is expected to be normalized already.
    pub fn lookup(&self, office: &str, ballot_number: &str) -> Option<&str> {
        let key = CandidateKey {
            office: office.to_string(),
            ballot_number: ballot_number.to_string(),
        };
        self.entries.get(&key).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(|x| x.trim()).filter(|x| !x.is_empty())
}
