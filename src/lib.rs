//! Placekey enrichment for Detroit open-data tables.
//!
//! Reads the blight violation and property sale CSV files, resolves a
//! Placekey for every row through the hosted Placekey API, and writes the
//! raw results plus the input tables left-joined with those results.
//!
//! # Modules
//!
//! - `config`: Configuration loaded from the environment.
//! - `datasets`: File names, join keys and column maps of each dataset.
//! - `errors`: Error handling types.
//! - `mapper`: Projection of input rows onto the lookup API schema.
//! - `merge`: Result tables and the left join back onto the input.
//! - `models`: Lookup API request and response types.
//! - `pipeline`: The per-dataset load, lookup, join, write sequence.
//! - `placekey`: Placekey API client and the lookup trait.
//! - `table`: In-memory CSV tables.

pub mod config;
pub mod datasets;
pub mod errors;
pub mod mapper;
pub mod merge;
pub mod models;
pub mod pipeline;
pub mod placekey;
pub mod table;
