/*!
 * Bag data model
 */

pub mod bag;
pub mod encoding;
pub mod fetch;
pub mod manifest;
pub mod metadata;
pub mod version;

pub use bag::Bag;
pub use encoding::TagFileEncoding;
pub use fetch::FetchItem;
pub use manifest::{checksums_match, Manifest};
pub use metadata::{Metadata, BAGGING_DATE, PAYLOAD_OXUM};
pub use version::{parse_version, Version};
