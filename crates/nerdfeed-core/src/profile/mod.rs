//! Profile domain model and repository trait.

mod model;
mod repository;

pub use model::{NewProfile, Profile};
pub use repository::ProfileRepository;
