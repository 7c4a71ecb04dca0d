//! 4th-down decision states from play-by-play records.
//!
//! The same [`derive::derive`] backs both the historical batch build
//! ([`pipeline::build`]) and single live requests ([`live::derive_live`]).

pub mod config;
pub mod derive;
pub mod export;
pub mod filter;
pub mod ingest;
pub mod live;
pub mod pipeline;
pub mod receiver;
pub mod record;
pub mod schema;
pub mod scoring;
pub mod table;
