#![deny(clippy::all, clippy::pedantic)]

pub mod admin;
pub mod auth;
pub mod buyer;
pub mod products;
pub mod seller;

use bazaar::client::Page;

#[must_use]
pub(crate) fn page(page: u32, limit: u32) -> Option<Page> {
    Some(Page::new(page.max(1), limit.max(1)))
}
