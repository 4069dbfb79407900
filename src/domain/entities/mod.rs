//! Core domain entities.
//!
//! # Entity Types
//!
//! - [`Post`] - Authored content (link share, tweet-style note or original article)
//! - [`Link`] - A link submitted by a reader, pending approval
//!
//! Creation inputs live next to their entity (`NewPost`, `NewLink`), as does
//! the editor input [`PostAttributes`] and its validated form [`PostChanges`].

pub mod link;
pub mod post;

pub use link::{Link, LinkStatus, NewLink};
pub use post::{NewPost, Post, PostAttributes, PostChanges, PostKind, SearchDocument};

#[cfg(test)]
pub(crate) use link::sample_link;
#[cfg(test)]
pub(crate) use post::sample_post;
