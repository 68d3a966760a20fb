//! Menu location and hierarchical category discovery.

pub mod discover;
pub mod locator;
