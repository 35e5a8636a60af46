use std::path::PathBuf;
use std::process::ExitCode;

use folio::Settings;
use folio::error::Result;

mod site;

mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Builds the pages of a folio site into static HTML and JSON.
        cmd press {
            /// The site root: holds `folio.toml` and the content directory.
            required site: PathBuf
            /// Write the site here instead of the configured output directory.
            optional -o, --output output: PathBuf
            /// Print the slugs of each collection and exit.
            optional --list
            /// Log debug messages.
            optional -v, --verbose
        }
    }
}

fn run(flags: flags::Press) -> Result<()> {
    let settings = Settings::discover(&flags.site)?;
    if flags.list {
        for collection in settings.collections(&flags.site) {
            for slug in collection.slugs() {
                println!("{}/{slug}", collection.name());
            }
        }

        return Ok(());
    }

    let output: PathBuf = flags.output.unwrap_or_else(|| flags.site.join(&settings.output));
    let start = std::time::Instant::now();
    let summary = site::build(&settings, &flags.site, &output)?;
    log::info!("wrote {} pages to {} in {}ms",
        summary.pages, output.display(), start.elapsed().as_millis());

    for (collection, skipped) in &summary.skipped {
        log::warn!("{collection}: skipped {skipped} unreadable entries");
    }

    Ok(())
}

pub fn main() -> ExitCode {
    let flags = flags::Press::from_env_or_exit();

    env_logger::Builder::new()
        .filter_level(if flags.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    match run(flags) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprint!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
