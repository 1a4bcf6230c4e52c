use std::path::PathBuf;

use anyhow::{Context, Result};

use grad_explorer::config::ExplorerConfig;
use grad_explorer::data::cache::DatasetCache;
use grad_explorer::data::loader::FileSource;
use grad_explorer::state::DashboardSession;

/// Load the survey table, open a session with the dashboard defaults and
/// print every view as JSON.
///
/// Usage: `grad-explorer [DATA_FILE] [YEAR]`
fn main() -> Result<()> {
    env_logger::init();

    let mut config = ExplorerConfig::load()?;
    let mut args = std::env::args().skip(1);
    if let Some(path) = args.next() {
        config.data_path = PathBuf::from(path);
    }
    let year = args
        .next()
        .map(|y| y.parse::<i32>().with_context(|| format!("'{y}' is not a year")))
        .transpose()?;

    let source = FileSource::new(&config.data_path);
    let dataset = DatasetCache::global().get_or_load(&source)?;

    let mut session = DashboardSession::new(dataset, &config)?;
    if let Some(year) = year {
        session.set_year(year)?;
    }
    log::info!(
        "Session opened on {} with {} majors selected",
        session.year(),
        session.criteria.selected_majors.len()
    );

    let views = session.views()?;
    println!("{}", serde_json::to_string_pretty(&views)?);
    Ok(())
}
