//! Entity model, identity/serialisation codec and relational table
//! definitions for the storage engines.

pub mod errors;
pub mod kind;
pub mod entity;
pub mod password;
pub mod codec;
pub mod db;
pub mod state;
pub mod city;
pub mod user;
pub mod amenity;
pub mod place;
pub mod place_amenity;
pub mod review;

pub use entity::{Amenity, BaseModel, City, DomainEntity, Object, Place, Review, State, User};
pub use kind::{EntityKind, StorageKey};

#[cfg(test)]
mod tests;
