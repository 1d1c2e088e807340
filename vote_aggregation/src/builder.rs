use std::collections::BTreeMap;

use crate::config::*;
use crate::lookup::{CandidateRegistry, NeighborhoodTable};
use crate::{OfficeState, VoteCount};

/// A builder for adding votes one row at a time.
///
/// The ranks only exist once all the rows have been added: [Builder::finish]
/// consumes the builder, so no row can be added after the candidates have
/// been ranked.
///
/// ```
/// use vote_aggregation::*;
///
/// let table = NeighborhoodTable::default();
/// let registry = CandidateRegistry::empty();
/// let mut builder = Builder::new(&table, &registry);
///
/// let record = VoteRecord {
///     geo: GeoKey { zone: 1, polling_place: 2, section: 3 },
///     office: "SENADOR".to_string(),
///     city: "RIO DE JANEIRO".to_string(),
///     candidate_name: "ANA".to_string(),
///     ballot_number: "123".to_string(),
///     votes: 12,
///     sequence_id: None,
/// };
/// builder.add_record(&record).expect("no overflow");
///
/// let summary = builder.finish();
/// assert_eq!(summary.offices["SENADOR"].statewide_votes, 12);
/// ```
pub struct Builder<'a> {
    pub(crate) _neighborhoods: &'a NeighborhoodTable,
    pub(crate) _registry: &'a CandidateRegistry,
    pub(crate) _offices: BTreeMap<String, OfficeState>,
    pub(crate) _stats: IngestStats,
}

impl<'a> Builder<'a> {
    pub fn new(
        neighborhoods: &'a NeighborhoodTable,
        registry: &'a CandidateRegistry,
    ) -> Builder<'a> {
        Builder {
            _neighborhoods: neighborhoods,
            _registry: registry,
            _offices: BTreeMap::new(),
            _stats: IngestStats::default(),
        }
    }

    /// Validates and adds a raw row.
    ///
    /// A rejected row is counted in the statistics and leaves every total untouched.
    pub fn add_raw(&mut self, row: &RawVoteRow) -> Result<(), RecordError> {
        match row.validate() {
            Ok(record) => self.add_record(&record),
            Err(e) => {
                self.count_rejected(&e);
                Err(e)
            }
        }
    }

    fn count_rejected(&mut self, e: &RecordError) {
        match e {
            RecordError::MissingField(_) => self._stats.skipped_missing_field += 1,
            RecordError::NotANumber { .. } => self._stats.skipped_not_a_number += 1,
            RecordError::CountOverflow { .. } => self._stats.skipped_overflow += 1,
        }
    }

    /// Adds a record that is already validated.
    ///
    /// Fails without touching any total if the count would overflow the
    /// total of the office.
    pub fn add_record(&mut self, record: &VoteRecord) -> Result<(), RecordError> {
        let neighborhoods: &'a NeighborhoodTable = self._neighborhoods;
        let registry: &'a CandidateRegistry = self._registry;

        // Every other total of the record is bounded by the office total.
        let office_total = self
            ._offices
            .get(&record.office)
            .map(|o| o.total)
            .unwrap_or_default();
        if office_total.checked_add(VoteCount(record.votes)).is_none() {
            let e = RecordError::CountOverflow {
                office: record.office.clone(),
                votes: record.votes,
            };
            self.count_rejected(&e);
            return Err(e);
        }
        self._stats.accepted += 1;

        let neighborhood = neighborhoods.get(&record.geo);
        if neighborhood.is_none() {
            self._stats.without_neighborhood += 1;
        }

        let sequence_id: Option<&str> = match record.sequence_id.as_deref() {
            Some(sq) => Some(sq),
            None => {
                let found = registry.lookup(&record.office, &record.ballot_number);
                if found.is_some() {
                    self._stats.registry_hits += 1;
                }
                found
            }
        };

        let office = self._offices.entry(record.office.clone()).or_default();
        office.total += VoteCount(record.votes);

        let city = office.city_mut(&record.city);
        city.scope.add(record, sequence_id);

        if let Some(name) = neighborhood {
            city.neighborhood_mut(name).add(record, sequence_id);
        }
        Ok(())
    }

    /// Ranks the candidates of every scope and returns the summary.
    pub fn finish(self) -> Summary {
        Summary {
            offices: self
                ._offices
                .into_iter()
                .map(|(name, office)| (name, office.finalize()))
                .collect(),
            stats: self._stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(office: &str, city: &str, name: &str, votes: u64) -> VoteRecord {
        VoteRecord {
            geo: GeoKey {
                zone: 1,
                polling_place: 1,
                section: 1,
            },
            office: office.to_string(),
            city: city.to_string(),
            candidate_name: name.to_string(),
            ballot_number: "1".to_string(),
            votes,
            sequence_id: None,
        }
    }

    #[test]
    fn unranked_until_finished() {
        let table = NeighborhoodTable::default();
        let registry = CandidateRegistry::empty();
        let mut builder = Builder::new(&table, &registry);
        builder.add_record(&record("SENADOR", "RIO", "ANA", 1)).expect("add");
        builder.add_record(&record("SENADOR", "RIO", "BETO", 2)).expect("add");
        let office = &builder._offices["SENADOR"];
        let city = &office.cities["RIO"];
        assert_eq!(city.scope.candidates.len(), 2);
        assert_eq!(city.scope.candidates[0].name, "ANA");

        let summary = builder.finish();
        let ranked = &summary.offices["SENADOR"].cities["RIO"].scope.candidates;
        assert_eq!(ranked[0].name, "BETO");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn offices_are_created_lazily() {
        let table = NeighborhoodTable::default();
        let registry = CandidateRegistry::empty();
        let mut builder = Builder::new(&table, &registry);
        let err = builder.add_raw(&RawVoteRow::default());
        assert_eq!(err, Err(RecordError::MissingField("zone")));
        let summary = builder.finish();
        assert!(summary.offices.is_empty());
        assert_eq!(summary.stats.skipped(), 1);
    }

    #[test]
    fn zero_votes_still_register_the_candidate() {
        let table = NeighborhoodTable::default();
        let registry = CandidateRegistry::empty();
        let mut builder = Builder::new(&table, &registry);
        builder.add_record(&record("SENADOR", "RIO", "ANA", 0)).expect("add");
        let summary = builder.finish();
        let city = &summary.offices["SENADOR"].cities["RIO"];
        assert_eq!(city.scope.total_votes, 0);
        assert_eq!(city.scope.candidates.len(), 1);
        assert_eq!(city.scope.candidates[0].rank, 1);
    }

    #[test]
    fn overflowing_record_leaves_totals_untouched() {
        let table = NeighborhoodTable::default();
        let registry = CandidateRegistry::empty();
        let mut builder = Builder::new(&table, &registry);
        builder.add_record(&record("SENADOR", "RIO", "ANA", u64::MAX - 1)).expect("add");
        let err = builder.add_record(&record("SENADOR", "NITERÓI", "BETO", 2));
        assert_eq!(
            err,
            Err(RecordError::CountOverflow {
                office: "SENADOR".to_string(),
                votes: 2,
            })
        );
        builder.add_record(&record("SENADOR", "RIO", "ANA", 1)).expect("add");
        let summary = builder.finish();
        let office = &summary.offices["SENADOR"];
        assert_eq!(office.statewide_votes, u64::MAX);
        assert!(!office.cities.contains_key("NITERÓI"));
        assert_eq!(office.cities["RIO"].scope.candidates[0].votes, u64::MAX);
        assert_eq!(summary.stats.accepted, 2);
        assert_eq!(summary.stats.skipped_overflow, 1);
        assert_eq!(summary.stats.skipped(), 1);
    }
}
