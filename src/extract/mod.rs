//! Dimension extraction
//!
//! Projects and relabels source columns into the dimension tables.
//!
//! # Overview
//!
//! - [`project`]: ordered list of [`ColumnMapping`]s, each a source column, a
//!   target name and an optional [`Transform`]
//! - [`filter_eq`]: the only row filter, applied by callers upstream
//! - [`keep_last`]: explicit one-row-per-key deduplication
//! - [`songs_table`], [`artists_table`], [`users_table`], [`time_table`]: the
//!   star schema dimensions

mod dedup;
mod dimensions;
mod mapping;

pub use dedup::keep_last;
pub use dimensions::{
    artists_columns, artists_table, songs_columns, songs_table, time_columns, time_table,
    users_columns, users_table, NEXT_SONG,
};
pub use mapping::{filter_eq, project, ColumnMapping, Transform};
