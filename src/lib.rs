//! Xiaohongshu media fetcher library.
//!
//! Turns pasted share text into a deduplicated list of downloadable images
//! and videos, and fetches them to local storage.

#![allow(clippy::needless_raw_string_hashes)]

pub mod config;
pub mod constants;
pub mod download;
pub mod fetch;
pub mod links;
pub mod media;
pub mod pipeline;
pub mod state;
