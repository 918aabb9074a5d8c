use crate::cli::{CorpCodeArgs, StatementArgs};
use chrono::Local;
use colored::Colorize;
use dart_spider::fs::{read_json, write_json};
use dart_spider::opendart::corp_code::{convert_download, export_registry, Conversion};
use dart_spider::opendart::registry::Registry;
use dart_spider::opendart::statement::{available_years, statement_filename, Statements};
use dart_spider::opendart::{ApiKey, DartClient, BASE_URL, KEY_LENGTH};
use dart_spider::{std_client_build, DartError, Status};
use dotenv::var;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Download the company-code registry; optionally convert it to JSON.
pub(crate) async fn corp_code(args: CorpCodeArgs, tui: bool) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    let client = build_client(args.key)?;

    if tui {
        banner("corpCode.zip");
        println!("API URL: {}/corpCode.xml", client.base_url());
        println!("API key: {}", client.key());
    }

    let download = client
        .download_corp_code(&args.out_dir, Local::now().date_naive(), tui)
        .await
        .inspect_err(|err| report_error(err, tui))?;

    if tui {
        println!("{}", "download complete".green());
        println!("file: {}", download.path.display());
        println!("size: {:.2} KB", download.size as f64 / 1024.0);
        println!("time: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    }

    if args.json {
        if tui {
            println!("\nunzipping {} ...", download.path.display());
        }
        let conversion = convert_download(
            &download,
            &args.out_dir,
            args.keep_zip,
            Local::now().naive_local(),
            tui,
        )
        .await?;
        print_conversion(&conversion, tui);

        if tui && !args.keep_zip {
            println!("{} deleted", download.path.display());
        }
    }

    info!(
        "company-code registry collected, time elapsed: {:?}",
        time.elapsed()
    );

    Ok(())
}

/// Convert an existing registry XML to JSON.
pub(crate) async fn convert(xml: &Path, out_dir: &Path, tui: bool) -> anyhow::Result<()> {
    if tui {
        banner("CORPCODE.xml");
        println!("parsing {} ...", xml.display());
    }

    let bytes = tokio::fs::read(xml).await.map_err(|err| {
        error!("failed to read {}, error({err})", xml.display());
        err
    })?;
    let registry = Registry::from_xml(&bytes)?;
    if registry.is_empty() {
        warn!("no <list> entries found in {}", xml.display());
    }
    let conversion = export_registry(registry, out_dir, Local::now().naive_local()).await?;
    print_conversion(&conversion, tui);

    Ok(())
}

/// Search a JSON registry export and print the matches.
pub(crate) async fn find(query: &str, path: &Path, limit: usize) -> anyhow::Result<()> {
    let registry: Registry = read_json(path).await.map_err(|err| {
        error!("failed to read registry {}, error({err})", path.display());
        err
    })?;

    let found = registry.lookup(query, limit);
    if found.is_empty() {
        println!("no company matches \"{query}\"");
        return Ok(());
    }

    for company in found {
        println!(
            "{corp_code}  {stock_code:<6}  {name}{eng}",
            corp_code = company.corp_code,
            stock_code = company.stock_code.as_deref().unwrap_or("-"),
            name = company.corp_name.bold(),
            eng = company
                .corp_eng_name
                .as_deref()
                .map(|eng| format!(" ({eng})"))
                .unwrap_or_default(),
        );
    }

    Ok(())
}

/// Fetch, classify and save the key accounts of one company.
pub(crate) async fn statement(args: StatementArgs, tui: bool) -> anyhow::Result<()> {
    let report = args.report;
    let client = build_client(args.key)?;

    if tui {
        banner("fnlttSinglAcnt");
        println!("company: {}", args.corp_code);
        println!("year:    {}", args.year);
        println!("report:  {report}");
    }
    let years = available_years(Local::now().date_naive());
    if !years.contains(&args.year) {
        warn!(
            "key accounts are published for {}..={} only, not {}",
            years.first().copied().unwrap_or_default(),
            years.last().copied().unwrap_or_default(),
            args.year
        );
    }

    let response = client
        .fetch_statement(&args.corp_code, args.year, report)
        .await
        .inspect_err(|err| report_error(err, tui))?;
    let statements = Statements::from(&response);

    let path = args
        .out_dir
        .join(statement_filename(&args.corp_code, args.year, report));
    write_json(&statements, &path).await?;

    if tui {
        let summary = &statements.summary;
        println!("{}", "statement saved".green());
        println!("file:              {}", path.display());
        println!("total assets:      {:.0}", summary.total_assets);
        println!("total liabilities: {:.0}", summary.total_liabilities);
        println!("total equity:      {:.0}", summary.total_equity);
        println!("revenue:           {:.0}", summary.revenue);
        println!("net income:        {:.0}", summary.net_income);
    }
    info!("statement saved to {}", path.display());

    Ok(())
}

// helpers
// ----------------------------------------------------------------------------

// flag > API_KEY > prompt
fn resolve_key(flag: Option<String>) -> anyhow::Result<ApiKey> {
    if let Some(key) = flag {
        return Ok(ApiKey::new(key));
    }
    if let Ok(key) = var("API_KEY") {
        if !key.trim().is_empty() {
            debug!("API key read from API_KEY");
            return Ok(ApiKey::new(key));
        }
    }

    let key: String = dialoguer::Password::new()
        .with_prompt(format!("OpenDart API key ({KEY_LENGTH} characters)"))
        .interact()?;
    Ok(ApiKey::new(key))
}

fn build_client(key: Option<String>) -> anyhow::Result<DartClient> {
    let key = resolve_key(key)?;
    if !key.has_expected_length() {
        eprintln!(
            "{} the API key is expected to be {KEY_LENGTH} characters long",
            "warning:".yellow()
        );
    }

    let user_agent = var("USER_AGENT").ok();
    let http_client = std_client_build(user_agent.as_deref())?;
    let base_url = var("DART_BASE_URL").unwrap_or_else(|_| BASE_URL.to_string());

    Ok(DartClient::with_client(http_client, key).with_base_url(base_url))
}

fn print_conversion(conversion: &Conversion, tui: bool) {
    if !tui {
        return;
    }

    let summary = &conversion.summary;
    println!("{}", "JSON conversion complete".green());
    println!("file:     {}", conversion.json_path.display());
    println!("total:    {}", summary.total);
    println!("listed:   {}", summary.listed);
    println!("unlisted: {}", summary.unlisted);

    let sample: Vec<_> = conversion.registry.listed().take(5).collect();
    if !sample.is_empty() {
        println!("\nlisted sample:");
        for (i, company) in sample.into_iter().enumerate() {
            println!(
                "   {}. {} ({})",
                i + 1,
                company.corp_name,
                company.stock_code.as_deref().unwrap_or_default()
            );
        }
    }
}

fn banner(name: &str) {
    println!("{bar}\n{name:^40}\n{bar}", bar = "=".repeat(40));
}

// the status description, in red, when the API refused the request
fn report_error(err: &DartError, tui: bool) {
    if !tui {
        return;
    }
    match err {
        DartError::Api { status, message } => {
            eprintln!("{} {status}", "error code:".red());
            eprintln!("{} {message}", "error message:".red());
            match Status::from_code(status) {
                Some(status) => eprintln!("{} {}", "details:".red(), status.description()),
                None => eprintln!("{} unknown status code {status}", "details:".red()),
            }
        }
        other => eprintln!("{} {other}", "request failed:".red()),
    }
}
