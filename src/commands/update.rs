//! Update command implementation.

use anyhow::Result;

use crate::cache::Cache;
use crate::output::Output;
use crate::registry::Registry;
use crate::settings::Settings;

/// Fetch every registry source and rewrite the cache.
///
/// The existing cache is only replaced when every source was fetched and
/// the fetched fragments unify.
pub fn run(settings: &Settings) -> Result<()> {
    let registry = Registry::load(&settings.registry_path())?;
    if registry.repos.is_empty() {
        Output::info("No registry sources; clearing cache");
    }

    let spinner = Output::spinner(format!("Fetching {} source(s)...", registry.repos.len()));
    let cache = match Cache::refresh(&registry) {
        Ok(cache) => cache,
        Err(e) => {
            spinner.finish_error("Update failed");
            return Err(e);
        }
    };
    cache.save(&settings.cache_path())?;
    spinner.finish_success(format!("Cached {} fragment(s)", cache.fragments.len()));
    Ok(())
}
