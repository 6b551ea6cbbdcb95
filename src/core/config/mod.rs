pub mod data;
pub mod defaults;
pub mod io;
pub mod store;

pub use data::{Config, TimingsConfig};
pub use io::ConfigError;
pub use store::ConfigStore;
