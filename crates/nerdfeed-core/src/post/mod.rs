//! Post domain models and repository trait.

mod model;
mod repository;

pub use model::{NewPost, Post, PostAuthor, UNKNOWN_AUTHOR};
pub use repository::PostRepository;
