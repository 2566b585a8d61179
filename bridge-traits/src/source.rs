//! Metadata Source Abstraction
//!
//! The core never talks to a media provider directly. Hosts hand it a
//! [`MetadataSource`] that turns a source locator (a page URL, a download id,
//! a path to an `.info.json` file) into the provider's raw metadata object.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Provider metadata lookup.
///
/// The returned value is passed untouched to the normalizer, so
/// implementations should not reshape it. A `Value::Null` result is treated by
/// the core as "no metadata available".
///
/// # Example
///
/// ```ignore
/// use bridge_traits::source::MetadataSource;
///
/// async fn title_of(source: &dyn MetadataSource, url: &str) -> Option<String> {
///     let raw = source.fetch_metadata(url).await.ok()?;
///     raw.get("title")?.as_str().map(str::to_string)
/// }
/// ```
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch the raw metadata object for `locator`.
    ///
    /// # Errors
    ///
    /// Returns an error when the provider cannot be reached or the locator is
    /// unknown. The core surfaces this as a source-unavailable failure.
    async fn fetch_metadata(&self, locator: &str) -> Result<Value>;
}
