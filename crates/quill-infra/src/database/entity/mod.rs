//! SeaORM entities and their conversions to/from the domain types.

pub mod category;
pub mod comment;
pub mod post;
pub mod post_like;
pub mod user;
