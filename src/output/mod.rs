//! Output module: the read-only observe path
//!
//! Lists pages already stored by previous crawl runs, filtered by
//! scheme/hostname/port. The crawl engine never goes through this path.

mod observer;

pub use observer::Observer;
