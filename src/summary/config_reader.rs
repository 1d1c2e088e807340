use crate::summary::*;

use serde::{Deserialize, Serialize};

/// Text encoding of the CSV inputs.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "latin1")]
    Latin1,
    #[serde(rename = "utf8")]
    Utf8,
}

/// Names of the columns in the input tables.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    #[serde(rename = "zone")]
    pub zone: String,
    #[serde(rename = "section")]
    pub section: String,
    #[serde(rename = "pollingPlace")]
    pub polling_place: String,
    #[serde(rename = "office")]
    pub office: String,
    #[serde(rename = "city")]
    pub city: String,
    #[serde(rename = "candidateName")]
    pub candidate_name: String,
    #[serde(rename = "ballotNumber")]
    pub ballot_number: String,
    #[serde(rename = "votes")]
    pub votes: String,
    #[serde(rename = "sequenceId")]
    pub sequence_id: String,

    #[serde(rename = "geoZone")]
    pub geo_zone: String,
    #[serde(rename = "geoPollingPlace")]
    pub geo_polling_place: String,
    #[serde(rename = "geoSection")]
    pub geo_section: String,
    #[serde(rename = "geoNeighborhood")]
    pub geo_neighborhood: String,

    #[serde(rename = "rosterOffice")]
    pub roster_office: String,
    #[serde(rename = "rosterBallotNumber")]
    pub roster_ballot_number: String,
    #[serde(rename = "rosterSequenceId")]
    pub roster_sequence_id: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        ColumnNames {
            zone: "NR_ZONA".to_string(),
            section: "NR_SECAO".to_string(),
            polling_place: "NR_LOCAL_VOTACAO".to_string(),
            office: "DS_CARGO".to_string(),
            city: "NM_MUNICIPIO".to_string(),
            candidate_name: "NM_VOTAVEL".to_string(),
            ballot_number: "NR_VOTAVEL".to_string(),
            votes: "QT_VOTOS".to_string(),
            sequence_id: "SQ_CANDIDATO".to_string(),
            geo_zone: "Zona Eleitoral".to_string(),
            geo_polling_place: "Número do Local".to_string(),
            geo_section: "Seção".to_string(),
            geo_neighborhood: "Bairro".to_string(),
            roster_office: "DS_CARGO".to_string(),
            roster_ballot_number: "NR_CANDIDATO".to_string(),
            roster_sequence_id: "SQ_CANDIDATO".to_string(),
        }
    }
}

impl ColumnNames {
    /// The columns of the vote table without which no row can be accepted.
    /// The sequence id is optional.
    pub fn required_vote_columns(&self) -> Vec<&str> {
        vec![
            self.zone.as_str(),
            self.section.as_str(),
            self.polling_place.as_str(),
            self.office.as_str(),
            self.city.as_str(),
            self.candidate_name.as_str(),
            self.ballot_number.as_str(),
            self.votes.as_str(),
        ]
    }

    pub fn required_geo_columns(&self) -> Vec<&str> {
        vec![
            self.geo_zone.as_str(),
            self.geo_polling_place.as_str(),
            self.geo_section.as_str(),
            self.geo_neighborhood.as_str(),
        ]
    }
}

/// The configuration of a run.
///
/// File patterns use `{year}` as a placeholder. Relative paths in a
/// configuration file are relative to the directory of that file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    #[serde(rename = "years")]
    pub years: Vec<String>,
    #[serde(rename = "votesDirectory")]
    pub votes_directory: String,
    #[serde(rename = "votesFilePattern")]
    pub votes_file_pattern: String,
    #[serde(rename = "candidatesDirectory")]
    pub candidates_directory: String,
    #[serde(rename = "candidatesFilePattern")]
    pub candidates_file_pattern: String,
    /// The years for which the vote table has no sequence id and the
    /// candidate roster must be read.
    #[serde(rename = "rosterYears")]
    pub roster_years: Vec<String>,
    #[serde(rename = "geoReference")]
    pub geo_reference: String,
    #[serde(rename = "geoWorksheetName")]
    pub geo_worksheet_name: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: String,
    #[serde(rename = "encoding")]
    pub encoding: Encoding,
    #[serde(rename = "delimiter")]
    pub delimiter: String,
    #[serde(rename = "stateTotalKey")]
    pub state_total_key: String,
    #[serde(rename = "splitByCity")]
    pub split_by_city: bool,
    #[serde(rename = "columns")]
    pub columns: ColumnNames,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            years: vec![
                "2010".to_string(),
                "2014".to_string(),
                "2018".to_string(),
                "2022".to_string(),
            ],
            votes_directory: "dados_brutos/votacao".to_string(),
            votes_file_pattern: "{year}.csv".to_string(),
            candidates_directory: "dados_brutos/candidatos".to_string(),
            candidates_file_pattern: "consulta_cand_{year}_RJ.csv".to_string(),
            roster_years: vec!["2010".to_string(), "2014".to_string()],
            geo_reference: "bairros.csv".to_string(),
            geo_worksheet_name: None,
            output_directory: "dados_processados".to_string(),
            encoding: Encoding::Latin1,
            delimiter: ";".to_string(),
            state_total_key: "TOTAL_RJ".to_string(),
            split_by_city: true,
            columns: ColumnNames::default(),
        }
    }
}

impl RunConfig {
    pub fn uses_roster(&self, year: &str) -> bool {
        self.roster_years.iter().any(|y| y == year)
    }

    pub fn votes_path(&self, year: &str) -> PathBuf {
        Path::new(&self.votes_directory).join(self.votes_file_pattern.replace("{year}", year))
    }

    pub fn roster_path(&self, year: &str) -> PathBuf {
        Path::new(&self.candidates_directory)
            .join(self.candidates_file_pattern.replace("{year}", year))
    }

    pub fn summary_path(&self, year: &str) -> PathBuf {
        Path::new(&self.output_directory)
            .join(year)
            .join("resumo.json")
    }

    /// The flat location of the summary, kept for the existing consumers.
    pub fn legacy_summary_path(&self, year: &str) -> PathBuf {
        Path::new(&self.output_directory).join(format!("resumo_bairro_{}.json", year))
    }

    pub fn cities_dir(&self, year: &str) -> PathBuf {
        Path::new(&self.output_directory).join(year).join("cidades")
    }

    pub fn delimiter_byte(&self) -> SummaryResult<u8> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => InvalidConfigSnafu {
                message: format!(
                    "the delimiter must be a single ASCII character, got {:?}",
                    self.delimiter
                ),
            }
            .fail(),
        }
    }

    fn resolve_paths(mut self, root: &Path) -> RunConfig {
        let resolve = |p: &String| root.join(p).display().to_string();
        self.votes_directory = resolve(&self.votes_directory);
        self.candidates_directory = resolve(&self.candidates_directory);
        self.geo_reference = resolve(&self.geo_reference);
        self.output_directory = resolve(&self.output_directory);
        self
    }
}

pub fn read_config(path: &str) -> SummaryResult<RunConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: RunConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    info!("config: {:?}", config);
    if config.years.is_empty() {
        return InvalidConfigSnafu {
            message: format!("no year to process in {}", path),
        }
        .fail();
    }
    let root = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
    Ok(config.resolve_paths(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_filled_in() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{"years": ["2022"], "encoding": "utf8", "columns": {"votes": "VOTOS"}}"#,
        )
        .expect("write config");
        let config = read_config(path.to_str().expect("utf8 path")).expect("config");
        assert_eq!(config.years, vec!["2022".to_string()]);
        assert_eq!(config.encoding, Encoding::Utf8);
        assert_eq!(config.columns.votes, "VOTOS");
        assert_eq!(config.columns.zone, "NR_ZONA");
        assert_eq!(config.state_total_key, "TOTAL_RJ");
        assert!(config.split_by_city);
        assert_eq!(
            PathBuf::from(&config.geo_reference),
            temp.path().join("bairros.csv")
        );
    }

    #[test]
    fn paths_follow_the_patterns() {
        let config = RunConfig::default();
        assert_eq!(
            config.votes_path("2014"),
            PathBuf::from("dados_brutos/votacao/2014.csv")
        );
        assert_eq!(
            config.roster_path("2010"),
            PathBuf::from("dados_brutos/candidatos/consulta_cand_2010_RJ.csv")
        );
        assert_eq!(
            config.summary_path("2022"),
            PathBuf::from("dados_processados/2022/resumo.json")
        );
        assert_eq!(
            config.legacy_summary_path("2022"),
            PathBuf::from("dados_processados/resumo_bairro_2022.json")
        );
        assert!(config.uses_roster("2010"));
        assert!(!config.uses_roster("2022"));
    }

    #[test]
    fn empty_year_list_is_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.json");
        fs::write(&path, r#"{"years": []}"#).expect("write config");
        let res = read_config(path.to_str().expect("utf8 path"));
        assert!(matches!(res, Err(SummaryError::InvalidConfig { .. })));
    }

    #[test]
    fn delimiter_must_be_one_byte() {
        let mut config = RunConfig::default();
        assert_eq!(config.delimiter_byte().expect("default"), b';');
        config.delimiter = "::".to_string();
        assert!(config.delimiter_byte().is_err());
    }
}
