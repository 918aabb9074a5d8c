use clap::{Args, Parser, Subcommand, ValueEnum};
use dart_spider::opendart::statement::ReportCode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    ///
    /// Without a trace level, progress bars and plain status lines are shown instead.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download the OpenDart company-code registry (corpCode_YYYYMMDD.zip).
    CorpCode(CorpCodeArgs),

    /// Convert an unzipped CORPCODE.xml to JSON.
    Convert {
        /// Path to the registry XML.
        xml: PathBuf,

        /// Directory the JSON export is written to.
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Search a JSON registry export by company name, stock code or company code.
    Find {
        /// Part of the Korean or English company name; a 6-digit stock code or an 8-digit
        /// company code is looked up exactly.
        query: String,

        /// JSON registry export, as written by `corp-code --json` or `convert`.
        #[arg(short, long)]
        registry: PathBuf,

        /// Maximum number of matches shown.
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Fetch the key financial accounts of one company.
    Statement(StatementArgs),
}

#[derive(Args, Debug)]
pub struct CorpCodeArgs {
    /// OpenDart API key; falls back to the API_KEY environment variable, then a prompt.
    #[arg(short, long)]
    pub key: Option<String>,

    /// Directory the archive is saved to.
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Also unzip the archive and convert the registry to JSON.
    #[arg(long)]
    pub json: bool,

    /// Keep the archive after a JSON conversion.
    #[arg(long, requires = "json")]
    pub keep_zip: bool,
}

#[derive(Args, Debug)]
pub struct StatementArgs {
    /// 8-digit OpenDart company code.
    #[arg(short, long)]
    pub corp_code: String,

    /// Business year (2015 onwards).
    #[arg(short, long)]
    pub year: i32,

    /// Periodic report the accounts are taken from: q1, half, q3, annual, or a report code
    /// such as 11011.
    #[arg(short, long, default_value = "annual")]
    pub report: ReportCode,

    /// OpenDart API key; falls back to the API_KEY environment variable, then a prompt.
    #[arg(short, long)]
    pub key: Option<String>,

    /// Directory the JSON export is written to.
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}

//////////////////////////////////////////////////////////////
// -- TESTS --
//////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn corp_code_defaults() {
        let cli = Cli::try_parse_from(["dart", "corp-code"]).unwrap();
        assert_eq!(cli.trace, None);
        match cli.command {
            Commands::CorpCode(args) => {
                assert_eq!(args.key, None);
                assert_eq!(args.out_dir, PathBuf::from("."));
                assert!(!args.json);
                assert!(!args.keep_zip);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn keep_zip_needs_json() {
        assert!(Cli::try_parse_from(["dart", "corp-code", "--keep-zip"]).is_err());
        assert!(Cli::try_parse_from(["dart", "corp-code", "--json", "--keep-zip"]).is_ok());
    }

    #[test]
    fn statement_report_code_and_default() {
        let cli = Cli::try_parse_from([
            "dart", "statement", "-c", "00126380", "-y", "2023", "-r", "11013",
        ])
        .unwrap();
        match cli.command {
            Commands::Statement(args) => assert_eq!(args.report, ReportCode::Q1),
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["dart", "statement", "-c", "00126380", "-y", "2023"])
            .unwrap();
        match cli.command {
            Commands::Statement(args) => assert_eq!(args.report, ReportCode::Annual),
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Cli::try_parse_from([
            "dart", "statement", "-c", "00126380", "-y", "2023", "-r", "yearly",
        ])
        .is_err());
    }

    #[test]
    fn global_trace_level() {
        let cli = Cli::try_parse_from(["dart", "corp-code", "--trace", "DEBUG"]).unwrap();
        assert_eq!(cli.trace, Some(TraceLevel::DEBUG));
    }

    #[test]
    fn statement_report() {
        let cli = Cli::try_parse_from([
            "dart",
            "statement",
            "--corp-code",
            "00126380",
            "--year",
            "2023",
            "--report",
            "half",
        ])
        .unwrap();
        match cli.command {
            Commands::Statement(args) => {
                assert_eq!(args.corp_code, "00126380");
                assert_eq!(args.year, 2023);
                assert_eq!(args.report, ReportCode::HalfYear);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
