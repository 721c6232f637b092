#[macro_use]
extern crate tracing;

mod app;
mod logging;
pub mod report;

pub use app::App;
use color_eyre::Result;
pub use content_pipeline_config::{
    Args,
    Config,
};
pub use logging::init_logging;

pub fn init_errors() -> Result<()> {
    color_eyre::install()
}
