// Primitives for reading CSV files.

use std::collections::HashMap;
use std::fs::File;

use csv::ByteRecord;

use crate::summary::{
    io_common::{decode_field, header_index},
    *,
};

/// A delimited text file with a header row, read one record at a time.
pub struct CsvTable {
    path: String,
    reader: csv::Reader<File>,
    columns: HashMap<String, usize>,
    encoding: Encoding,
}

/// A record of a [CsvTable], with its fields accessible by column name.
pub struct TableRow<'a> {
    record: &'a ByteRecord,
    columns: &'a HashMap<String, usize>,
    encoding: Encoding,
}

impl TableRow<'_> {
    /// `None` if the column does not exist or if the record is too short.
    pub fn get(&self, name: &str) -> Option<String> {
        let idx = self.columns.get(name)?;
        self.record
            .get(*idx)
            .map(|bytes| decode_field(bytes, self.encoding))
    }
}

impl CsvTable {
    pub fn open(path: &Path, config: &RunConfig) -> SummaryResult<CsvTable> {
        let path_s = path.display().to_string();
        info!("Attempting to read {:?}", path_s);
        let file = File::open(path).context(OpeningFileSnafu {
            path: path_s.clone(),
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(config.delimiter_byte()?)
            .flexible(true)
            .from_reader(file);
        let header = reader
            .byte_headers()
            .context(ReadingCsvSnafu {
                path: path_s.clone(),
            })?
            .clone();
        let names: Vec<String> = header
            .iter()
            .map(|field| decode_field(field, config.encoding))
            .collect();
        let columns = header_index(names.iter().map(|s| s.as_str()));
        debug!("CsvTable::open: {:?} columns: {:?}", path_s, names);
        Ok(CsvTable {
            path: path_s,
            reader,
            columns,
            encoding: config.encoding,
        })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn require_columns(&self, names: &[&str]) -> SummaryResult<()> {
        for name in names {
            ensure!(
                self.has_column(name),
                MissingColumnSnafu {
                    path: self.path.clone(),
                    column: *name,
                }
            );
        }
        Ok(())
    }

    /// Converts every record with `f`. Stops being useful at the first read error,
    /// which callers are expected to treat as fatal.
    pub fn rows<T, F>(self, f: F) -> impl Iterator<Item = Result<T, csv::Error>>
    where
        F: Fn(&TableRow) -> T,
    {
        let CsvTable {
            reader,
            columns,
            encoding,
            ..
        } = self;
        reader.into_byte_records().map(move |r| {
            r.map(|record| {
                f(&TableRow {
                    record: &record,
                    columns: &columns,
                    encoding,
                })
            })
        })
    }

    fn collect_rows<T, F>(self, f: F) -> SummaryResult<Vec<T>>
    where
        F: Fn(&TableRow) -> T,
    {
        let path = self.path.clone();
        self.rows(f)
            .collect::<Result<Vec<T>, csv::Error>>()
            .context(ReadingCsvSnafu { path })
    }
}

pub fn vote_row(row: &TableRow, columns: &ColumnNames) -> RawVoteRow {
    RawVoteRow {
        zone: row.get(&columns.zone),
        section: row.get(&columns.section),
        polling_place: row.get(&columns.polling_place),
        office: row.get(&columns.office),
        city: row.get(&columns.city),
        candidate_name: row.get(&columns.candidate_name),
        ballot_number: row.get(&columns.ballot_number),
        votes: row.get(&columns.votes),
        sequence_id: row.get(&columns.sequence_id),
    }
}

pub fn read_geo_rows(path: &Path, config: &RunConfig) -> SummaryResult<Vec<GeoRow>> {
    let table = CsvTable::open(path, config)?;
    table.require_columns(&config.columns.required_geo_columns())?;
    let columns = &config.columns;
    table.collect_rows(|row| GeoRow {
        zone: row.get(&columns.geo_zone),
        polling_place: row.get(&columns.geo_polling_place),
        section: row.get(&columns.geo_section),
        neighborhood: row.get(&columns.geo_neighborhood),
    })
}

pub fn read_roster_rows(path: &Path, config: &RunConfig) -> SummaryResult<Vec<RosterRow>> {
    let table = CsvTable::open(path, config)?;
    let columns = &config.columns;
    for name in [
        &columns.roster_office,
        &columns.roster_ballot_number,
        &columns.roster_sequence_id,
    ] {
        if !table.has_column(name) {
            warn!(
                "Candidate roster {} has no column {:?}: no candidate will be loaded",
                path.display(),
                name
            );
        }
    }
    table.collect_rows(|row| RosterRow {
        office: row.get(&columns.roster_office),
        ballot_number: row.get(&columns.roster_ballot_number),
        sequence_id: row.get(&columns.roster_sequence_id),
    })
}
