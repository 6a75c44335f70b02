// src/services/mod.rs

//! Remote collaborator clients.

mod feed;

pub use feed::{FeedClient, FeedPage};
