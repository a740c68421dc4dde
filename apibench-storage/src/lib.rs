mod config;
mod error;
mod report;
mod settings;

pub use config::*;
pub use error::*;
pub use report::*;
pub use settings::*;
