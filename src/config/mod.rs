//! Crawl configuration
//!
//! `ScrapeConfig` carries every tunable for a crawl session: required storage
//! root and feed URL, selectors, batch thresholds, retry budgets, worker
//! count and timeouts. Construction goes through the typestate builder so a
//! config can never exist without its two required fields.

pub mod builder;
pub mod types;

pub use builder::ScrapeConfigBuilder;
pub use types::ScrapeConfig;
