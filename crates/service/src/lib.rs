//! Service layer: the storage contract, its two engines and the services built on it.
//! - `storage` holds the `Storage` trait, the file and database engines, and the engine selector.
//! - Domain services take a `&dyn Storage` and never know which engine serves them.

pub mod errors;
pub mod place_amenity_service;
pub mod stats_service;
pub mod storage;
#[cfg(test)]
pub mod test_support;
