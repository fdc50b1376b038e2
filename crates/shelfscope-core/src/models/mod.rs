pub mod book;
pub mod series;

pub use book::{Book, VolumeKey, today_label};
pub use series::{SeriesMaxRegistry, SeriesSummary, SeriesView, VolumeSlot};
