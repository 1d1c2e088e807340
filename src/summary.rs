use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use vote_aggregation::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::summary::config_reader::*;

pub mod config_reader;
mod emit;
mod io_common;
mod io_csv;
mod io_excel;
mod split;

#[derive(Debug, Snafu)]
pub enum SummaryError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading CSV file {path}"))]
    ReadingCsv { source: csv::Error, path: String },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Excel file {path} has no worksheet {worksheet}"))]
    MissingWorksheet { path: String, worksheet: String },
    #[snafu(display("Excel file {path} has no data"))]
    EmptyExcel { path: String },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("File {path} has no column {column:?}"))]
    MissingColumn { path: String, column: String },
    #[snafu(display("Summary {path} does not have the expected structure"))]
    MalformedSummary { path: String },
    #[snafu(display("Invalid configuration: {message}"))]
    InvalidConfig { message: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SummaryResult<T> = Result<T, SummaryError>;

/// Options of a run that are not part of the configuration file.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RunOptions {
    /// A reference summary to compare the output with.
    pub reference: Option<String>,
    /// Only re-partition the existing summaries by city.
    pub split_only: bool,
}

pub fn run_with_args(args: &Args) -> SummaryResult<()> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => RunConfig::default(),
    };
    if !args.year.is_empty() {
        config.years = args.year.clone();
    }
    if let Some(out) = &args.out {
        config.output_directory = out.clone();
    }
    let options = RunOptions {
        reference: args.reference.clone(),
        split_only: args.split_only,
    };
    run(&config, &options)
}

/// Processes all the configured years, one after the other.
pub fn run(config: &RunConfig, options: &RunOptions) -> SummaryResult<()> {
    debug!("run: config: {:?}", config);
    if options.reference.is_some() && config.years.len() != 1 {
        return InvalidConfigSnafu {
            message: format!(
                "a reference summary needs exactly one year, got {:?}",
                config.years
            ),
        }
        .fail();
    }

    if options.split_only {
        for year in config.years.iter() {
            split_year(config, year)?;
        }
        return Ok(());
    }

    info!("Loading neighborhoods from {}", config.geo_reference);
    let neighborhoods = load_neighborhoods(config)?;

    for year in config.years.iter() {
        let pretty_js = process_year(config, year, &neighborhoods)?;
        if let Some(reference_path) = &options.reference {
            check_reference(reference_path, &pretty_js)?;
        }
    }
    info!("All years processed");
    Ok(())
}

fn load_neighborhoods(config: &RunConfig) -> SummaryResult<NeighborhoodTable> {
    let path = Path::new(config.geo_reference.as_str());
    let is_excel = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);
    let rows = if is_excel {
        io_excel::read_geo_rows(path, config)?
    } else {
        io_csv::read_geo_rows(path, config)?
    };
    let table = NeighborhoodTable::from_rows(rows);
    if table.is_empty() {
        warn!(
            "No neighborhood found in {}: the summaries will only have city totals",
            config.geo_reference
        );
    }
    Ok(table)
}

fn load_registry(config: &RunConfig, year: &str) -> SummaryResult<CandidateRegistry> {
    if !config.uses_roster(year) {
        return Ok(CandidateRegistry::empty());
    }
    let path = config.roster_path(year);
    if !path.exists() {
        warn!(
            "No candidate roster for {} at {}: sequence ids will be left empty",
            year,
            path.display()
        );
        return Ok(CandidateRegistry::empty());
    }
    let rows = io_csv::read_roster_rows(&path, config)?;
    Ok(CandidateRegistry::from_rows(rows))
}

/// Aggregates and writes the summaries of one year.
///
/// Returns the summary as written, for comparison purposes.
/// Nothing is written if the vote file cannot be read completely.
fn process_year(
    config: &RunConfig,
    year: &str,
    neighborhoods: &NeighborhoodTable,
) -> SummaryResult<String> {
    info!("Processing {}", year);
    let registry = load_registry(config, year)?;

    let votes_path = config.votes_path(year);
    let table = io_csv::CsvTable::open(&votes_path, config)?;
    table.require_columns(&config.columns.required_vote_columns())?;
    let columns = config.columns.clone();

    let mut read_error: Option<csv::Error> = None;
    let rows = table
        .rows(move |row| io_csv::vote_row(row, &columns))
        .map_while(|r| match r {
            Ok(row) => Some(row),
            Err(e) => {
                read_error = Some(e);
                None
            }
        });
    let summary = aggregate_votes(rows, neighborhoods, &registry);
    if let Some(e) = read_error {
        return Err(e).context(ReadingCsvSnafu {
            path: votes_path.display().to_string(),
        });
    }
    if summary.stats.skipped() > 0 {
        warn!(
            "{}: {} rows skipped ({} accepted)",
            year,
            summary.stats.skipped(),
            summary.stats.accepted
        );
    }

    let summary_js = emit::summary_to_json(&summary, &config.state_total_key);
    let pretty_js = serde_json::to_string_pretty(&summary_js).context(SerializingJsonSnafu {})?;

    write_text(&config.summary_path(year), &pretty_js)?;
    write_text(&config.legacy_summary_path(year), &pretty_js)?;

    if config.split_by_city {
        let n = split::write_city_files(&config.cities_dir(year), &summary_js, config)?;
        info!("{}: {} city files written", year, n);
    }
    info!("{} done", year);
    Ok(pretty_js)
}

/// Re-partitions an already written summary by city.
fn split_year(config: &RunConfig, year: &str) -> SummaryResult<()> {
    let path = config.summary_path(year);
    let summary_js = read_json(&path)?;
    let n = split::write_city_files(&config.cities_dir(year), &summary_js, config)?;
    info!("{}: {} city files written from {}", year, n, path.display());
    Ok(())
}

pub(crate) fn read_json(path: &Path) -> SummaryResult<JSValue> {
    let path_s = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningFileSnafu {
        path: path_s.clone(),
    })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path: path_s })
}

pub(crate) fn write_text(path: &Path, contents: &str) -> SummaryResult<()> {
    let path_s = path.display().to_string();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(WritingFileSnafu {
            path: parent.display().to_string(),
        })?;
    }
    debug!("Writing {}", path_s);
    fs::write(path, contents).context(WritingFileSnafu { path: path_s })
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> SummaryResult<()> {
    let summary_ref = read_json(&PathBuf::from(reference_path))?;
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary {}", reference_path);
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("Summary matches the reference {}", reference_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VOTES_HEADER: &str = "NR_ZONA;NR_SECAO;NR_LOCAL_VOTACAO;DS_CARGO;NM_MUNICIPIO;NM_VOTAVEL;NR_VOTAVEL;QT_VOTOS";

    fn setup(votes: &[&str]) -> (TempDir, RunConfig) {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("votacao")).expect("create votacao");
        let mut body = String::from(VOTES_HEADER);
        for line in votes {
            body.push('\n');
            body.push_str(line);
        }
        fs::write(root.join("votacao").join("2022.csv"), body).expect("write votes");
        fs::write(
            root.join("bairros.csv"),
            "Zona Eleitoral;Número do Local;Seção;Bairro\n1;10;100;Centro\n1;10;101;Lapa\n",
        )
        .expect("write bairros");

        let config = RunConfig {
            years: vec!["2022".to_string()],
            votes_directory: root.join("votacao").display().to_string(),
            candidates_directory: root.join("candidatos").display().to_string(),
            geo_reference: root.join("bairros.csv").display().to_string(),
            output_directory: root.join("out").display().to_string(),
            encoding: Encoding::Utf8,
            ..RunConfig::default()
        };
        (temp, config)
    }

    #[test]
    fn year_is_processed_end_to_end() {
        let (_temp, config) = setup(&[
            "1;100;10;Governador;Niterói;Ana;10;100",
            "1;101;10;Governador;Niterói;Beto;20;150",
            "1;100;10;Governador;Niterói;Ana;10;50",
            "9;999;99;Governador;Niterói;Ana;10;5",
            "1;100;10;Governador;Niterói;Caio;30;x",
        ]);
        run(&config, &RunOptions::default()).expect("run");

        let js = read_json(&config.summary_path("2022")).expect("summary");
        let office = &js["GOVERNADOR"];
        assert_eq!(office["TOTAL_RJ"], 305);
        let city = &office["CIDADES"]["NITERÓI"];
        assert_eq!(city["total_validos"], 305);
        assert_eq!(city["candidatos"][0]["nome"], "ANA");
        assert_eq!(city["candidatos"][0]["votos"], 155);
        assert_eq!(city["candidatos"][0]["posicao"], 1);
        assert_eq!(city["candidatos"][0]["sq_candidato"], JSValue::Null);
        assert_eq!(city["candidatos"][1]["nome"], "BETO");
        assert_eq!(city["BAIRROS"]["CENTRO"]["total_validos"], 150);
        assert_eq!(city["BAIRROS"]["LAPA"]["candidatos"][0]["nome"], "BETO");

        let legacy = fs::read_to_string(config.legacy_summary_path("2022")).expect("legacy");
        let main = fs::read_to_string(config.summary_path("2022")).expect("main");
        assert_eq!(legacy, main);

        let city_js = read_json(&config.cities_dir("2022").join("NITERÓI.json")).expect("city");
        assert_eq!(city_js["GOVERNADOR"]["TOTAL_RJ"], 305);
        assert_eq!(city_js["GOVERNADOR"]["CIDADES"]["NITERÓI"], *city);
    }

    #[test]
    fn reruns_are_byte_identical() {
        let (_temp, config) = setup(&[
            "1;100;10;Senador;Rio de Janeiro;Ana;10;3",
            "1;101;10;Senador;Rio de Janeiro;Beto;20;3",
            "1;101;10;Deputado;Maricá;Caio;30;1",
        ]);
        run(&config, &RunOptions::default()).expect("first run");
        let first = fs::read(config.summary_path("2022")).expect("first");
        run(&config, &RunOptions::default()).expect("second run");
        let second = fs::read(config.summary_path("2022")).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn matching_reference_passes() {
        let (temp, config) = setup(&["1;100;10;Senador;Rio;Ana;10;3"]);
        run(&config, &RunOptions::default()).expect("run");
        let reference = temp.path().join("reference.json");
        fs::copy(config.summary_path("2022"), &reference).expect("copy");
        let options = RunOptions {
            reference: Some(reference.display().to_string()),
            split_only: false,
        };
        run(&config, &options).expect("reference run");
    }

    #[test]
    fn different_reference_fails() {
        let (temp, config) = setup(&["1;100;10;Senador;Rio;Ana;10;3"]);
        let reference = temp.path().join("reference.json");
        fs::write(&reference, "{}").expect("write reference");
        let options = RunOptions {
            reference: Some(reference.display().to_string()),
            split_only: false,
        };
        assert!(run(&config, &options).is_err());
    }

    #[test]
    fn missing_vote_file_is_fatal() {
        let (_temp, mut config) = setup(&[]);
        config.years = vec!["2018".to_string()];
        let res = run(&config, &RunOptions::default());
        assert!(matches!(res, Err(SummaryError::OpeningFile { .. })));
        assert!(!config.summary_path("2018").exists());
    }

    #[test]
    fn missing_geo_reference_is_fatal() {
        let (_temp, mut config) = setup(&["1;100;10;Senador;Rio;Ana;10;3"]);
        config.geo_reference = "does/not/exist.csv".to_string();
        let res = run(&config, &RunOptions::default());
        assert!(matches!(res, Err(SummaryError::OpeningFile { .. })));
    }

    #[test]
    fn missing_roster_leaves_sequence_ids_empty() {
        let (_temp, mut config) = setup(&["1;100;10;Senador;Rio;Ana;10;3"]);
        config.roster_years = vec!["2022".to_string()];
        run(&config, &RunOptions::default()).expect("run");
        let js = read_json(&config.summary_path("2022")).expect("summary");
        assert_eq!(
            js["SENADOR"]["CIDADES"]["RIO"]["candidatos"][0]["sq_candidato"],
            JSValue::Null
        );
    }

    #[test]
    fn roster_fills_sequence_ids() {
        let (temp, mut config) = setup(&["1;100;10;Senador;Rio;Ana;10;3"]);
        config.roster_years = vec!["2022".to_string()];
        let roster_dir = temp.path().join("candidatos");
        fs::create_dir_all(&roster_dir).expect("create candidatos");
        fs::write(
            roster_dir.join("consulta_cand_2022_RJ.csv"),
            "DS_CARGO;NR_CANDIDATO;SQ_CANDIDATO\nSenador;10;190001\n",
        )
        .expect("write roster");
        run(&config, &RunOptions::default()).expect("run");
        let js = read_json(&config.summary_path("2022")).expect("summary");
        assert_eq!(
            js["SENADOR"]["CIDADES"]["RIO"]["candidatos"][0]["sq_candidato"],
            "190001"
        );
    }

    #[test]
    fn reference_requires_a_single_year() {
        let (_temp, mut config) = setup(&[]);
        config.years = vec!["2018".to_string(), "2022".to_string()];
        let options = RunOptions {
            reference: Some("ref.json".to_string()),
            split_only: false,
        };
        let res = run(&config, &options);
        assert!(matches!(res, Err(SummaryError::InvalidConfig { .. })));
    }

    #[test]
    fn split_only_reads_the_existing_summary() {
        let (_temp, config) = setup(&[]);
        let summary = r#"{"SENADOR": {"TOTAL_RJ": 7, "CIDADES": {"SÃO GONÇALO": {"total_validos": 7, "candidatos": [], "BAIRROS": {}}}}}"#;
        write_text(&config.summary_path("2022"), summary).expect("write summary");
        let options = RunOptions {
            reference: None,
            split_only: true,
        };
        run(&config, &options).expect("split");
        let city_js =
            read_json(&config.cities_dir("2022").join("SÃO_GONÇALO.json")).expect("city file");
        assert_eq!(city_js["SENADOR"]["TOTAL_RJ"], 7);
    }
}
