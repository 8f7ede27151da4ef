//! Result rendering for the `eidas` commands.
//!
//! Every command writes through an [`OutputFormatter`], so `--json` also
//! covers failures.

mod formatter;
mod human;
mod json;

pub use formatter::OutputFormatter;

/// Picks the JSON or the terminal formatter from the global flags.
pub fn create_formatter(json: bool, verbose: bool, quiet: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(json::JsonFormatter)
    } else {
        Box::new(human::HumanFormatter::new(verbose, quiet))
    }
}
