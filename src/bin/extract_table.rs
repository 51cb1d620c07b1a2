use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use fbref_matches::config::{self, CrawlConfig};
use fbref_matches::dataset;
use fbref_matches::fetcher::{PageFetcher, fetcher_from_config};
use fbref_matches::logging;
use fbref_matches::service;
use fbref_matches::table;

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let positional = args
        .iter()
        .filter(|a| !a.starts_with("--"))
        .cloned()
        .collect::<Vec<_>>();
    let Some(url) = positional.first() else {
        return Err(anyhow!(
            "usage: extract_table <https://fbref.com/...> (<table caption> [--xlsx=path] | --list)"
        ));
    };

    let config = CrawlConfig::from_env();
    let fetcher = fetcher_from_config(&config);

    if args.iter().any(|a| a == "--list") {
        let url = service::validate_source_url(url)?;
        let markup = fetcher.fetch(url.as_str(), config.fetch_timeout)?;
        for caption in table::table_captions(&markup) {
            println!("{caption}");
        }
        return Ok(());
    }

    let Some(identifier) = positional.get(1) else {
        return Err(anyhow!("missing table caption; use --list to see the page's tables"));
    };

    let rows = service::extract_table(&config, fetcher.as_ref(), url, identifier)?;
    println!(
        "Extracted {} rows x {} columns into {}",
        rows.len(),
        rows.columns().len(),
        config.custom_output_path.display()
    );

    if let Some(path) = args
        .iter()
        .find_map(|a| a.strip_prefix("--xlsx="))
        .map(PathBuf::from)
    {
        dataset::export_xlsx(&path, "Table", &rows)
            .with_context(|| format!("export {}", path.display()))?;
        println!("Workbook written to {}", path.display());
    }
    Ok(())
}
