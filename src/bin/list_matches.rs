use anyhow::{Context, Result, anyhow};

use fbref_matches::config::{self, CrawlConfig};
use fbref_matches::dataset::DatasetView;
use fbref_matches::logging;
use fbref_matches::service;

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init();

    let config = CrawlConfig::from_env();
    let view = service::list_records(&config).context("read dataset")?;
    match view {
        DatasetView::Records(records) => {
            let json = serde_json::to_string_pretty(&records).context("serialize records")?;
            println!("{json}");
            Ok(())
        }
        DatasetView::Empty => Err(anyhow!(
            "{} is empty. Run a crawl to get data.",
            config.output_path.display()
        )),
        DatasetView::NotFound => Err(anyhow!(
            "{} not found. Run a crawl first.",
            config.output_path.display()
        )),
        DatasetView::Aborted { reason, at } => {
            Err(anyhow!("last crawl aborted at {at}: {reason}"))
        }
    }
}
