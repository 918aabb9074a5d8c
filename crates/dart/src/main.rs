mod cli;
mod spider;

// remote imports
use clap::Parser;
use cli::{Cli, Commands, TraceLevel};
use tracing::{subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

////////////////////////////////////////////////////////////////////////////

// install the subscriber for the requested trace level
fn preprocess(trace_level: Level) -> anyhow::Result<()> {
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber)?;
    Ok(())
}

////////////////////////////////////////////////////////////////////////////

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // set the trace level
    if let Some(trace_level) = cli.trace {
        preprocess(match trace_level {
            TraceLevel::DEBUG => Level::DEBUG,
            TraceLevel::ERROR => Level::ERROR,
            TraceLevel::INFO => Level::INFO,
            TraceLevel::TRACE => Level::TRACE,
            TraceLevel::WARN => Level::WARN,
        })?;
    }
    trace!("command line input recorded: {cli:?}");

    // if no trace level provided, use tui
    let tui = cli.trace.is_none();

    // read cli inputs
    match cli.command {
        // `dart corp-code [--json]`: download (and convert) the registry
        Commands::CorpCode(args) => spider::corp_code(args, tui).await?,

        // `dart convert <XML>`: registry XML to JSON
        Commands::Convert { xml, out_dir } => spider::convert(&xml, &out_dir, tui).await?,

        // `dart find <QUERY> --registry <JSON>`
        Commands::Find {
            query,
            registry,
            limit,
        } => spider::find(&query, &registry, limit).await?,

        // `dart statement --corp-code <CODE> --year <YEAR>`
        Commands::Statement(args) => spider::statement(args, tui).await?,
    }

    Ok(())
}
