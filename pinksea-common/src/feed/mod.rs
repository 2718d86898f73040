//! Assembling feeds of oekaki posts.
//!
//! A [`builder::FeedBuilder`] collects filters into a [`query::FeedQuery`], reads the matching
//! posts from an [`store::OekakiStore`] and resolves the authors' handles through a
//! [`resolver::HandleResolver`].

pub mod builder;
pub mod memory;
pub mod query;
pub mod resolver;
pub mod store;
