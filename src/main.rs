#![deny(missing_docs)]
#![deny(warnings)]

//! Headless entry point: run one dashboard refresh and print the snapshot.

use talentdeck::config;
use talentdeck::controller::DashboardController;
use talentdeck::diagnostics::FileLogStorage;
use talentdeck::logging;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    let config = config::load_or_default()?;
    let storage = FileLogStorage::in_app_root()?;
    let controller = DashboardController::new(&config, Box::new(storage))?;

    controller.refresh_blocking();

    if let Some(error) = controller.last_error() {
        eprintln!("{error}");
    }
    match controller.snapshot() {
        Some(snapshot) => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        None => Err("No dashboard data available".into()),
    }
}
