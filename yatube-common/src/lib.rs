//! Entity types of the yatube content model: users, groups, posts, comments
//! and follows, with validated field types and display labels.

pub mod model;
pub mod snowflake;
pub mod util;
