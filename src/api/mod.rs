//! HTTP surface of the blog.
//!
//! Two audiences share one router: readers get rendered posts, listings and
//! feeds from [`handlers::public`] and [`handlers::feeds`], served through
//! the page cache; the editor drives authoring, publishing and link
//! moderation under `/api` (see [`routes`]) with an admin token. JSON shapes
//! live in [`dto`], cross-cutting layers in [`middleware`].

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
