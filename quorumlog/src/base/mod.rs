//! Basic types and utilities shared by all modules.

pub mod display_ext;

/// A trait that combines serde's serialization and deserialization bounds.
///
/// Every type that crosses a persistence or network boundary must implement
/// it. It is automatically implemented for every type that satisfies the
/// serde bounds.
pub trait Serde: serde::Serialize + for<'a> serde::Deserialize<'a> {}

impl<T> Serde for T where T: serde::Serialize + for<'a> serde::Deserialize<'a> {}
