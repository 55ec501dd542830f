// Library root: everything the CLI does with a loaded season table.

pub mod analytics;
pub mod export;
pub mod filter;
pub mod render;
