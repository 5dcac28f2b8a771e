//! OpenRouter chat-completion client that looks up a brand's official
//! website.
//!
//! [`BrandFinder::find_brand`] never fails: every transport, API, and parse
//! problem is folded into a [`BrandResult`](brandfind_core::BrandResult) with
//! `success = false` and a classified error type.

pub mod client;
pub mod error;
pub mod extract;
pub mod prompt;
pub mod types;

pub use client::{BrandFinder, ClientOptions};
pub use error::ClientError;
