pub mod io;
pub mod types;

pub use types::Config;
