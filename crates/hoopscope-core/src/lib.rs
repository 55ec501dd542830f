// Library root: the season statistics pipeline (fetch, extract, normalize,
// cache) and the configuration it runs under.

pub mod cache;
pub mod clock;
pub mod config;
pub mod html;
pub mod loader;
pub mod normalize;
pub mod season;
pub mod source;
pub mod table;

pub use loader::{DataUnavailable, StatsLoader, UnavailableReason};
pub use season::{SeasonKey, SeasonRange};
pub use table::{Cell, PlayerStatsTable, RawTable};
