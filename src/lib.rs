//! Turn websites without feeds into RSS by declaring CSS selectors.
//!
//! A site configuration is resolved into a [`domain::FeedExtractionPlan`],
//! the page is loaded through a [`sources::DocumentProvider`], items are
//! extracted into a [`domain::FeedDocument`] and rendered as RSS 2.0.

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod services;
pub mod sources;
pub mod storage;
