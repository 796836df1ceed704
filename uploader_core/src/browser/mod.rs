//! File browser: storage walk, per-file URLs and the browse page.

pub mod entries;
pub mod view;
pub mod walker;

pub use entries::{browse_entries, truncate_display_name, BrowseEntry};
pub use view::{BrowsePage, SearchForm};
pub use walker::{FileLister, ImageFiles};
