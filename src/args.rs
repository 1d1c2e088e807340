use clap::Parser;

/// Summaries of electoral results by office, city and neighborhood.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON configuration file. Relative paths inside it are resolved
    /// against its directory. Without it, the default layout relative to the current directory is used.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (repeatable) The years to process. Overrides the years of the configuration.
    #[clap(short, long, value_parser)]
    pub year: Vec<String>,

    /// (directory path) The directory where the summaries are written. Overrides the
    /// output directory of the configuration.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, the summary computed for the
    /// (single) year is compared with it and any difference is reported as an error.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// Only split the existing summaries by city, without reading the vote data.
    #[clap(long, takes_value = false)]
    pub split_only: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
