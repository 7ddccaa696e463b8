//! Code generators for Atlas models.

mod derive;

pub use derive::derive_model_impl;
