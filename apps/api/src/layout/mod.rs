// Layout: page geometry and the Fit Engine that scales content onto one page.

pub mod fit;
pub mod handlers;
pub mod page;

pub use fit::{FitConfig, FitConfigError};
