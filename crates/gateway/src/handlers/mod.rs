//! API handlers module

pub mod bookmarks;
pub mod graphs;
pub mod health;
pub mod papers;
