//! Bounded, cursor-paginated inbox cache.
//!
//! [`InboxCache`] is the pure state: an ordered message list, a
//! continuation cursor and a has-more flag, all under one hard capacity
//! bound. [`InboxController`] drives it: refresh resets then fetches page
//! one, load-more follows the cursor, and a single in-flight slot drops
//! (never queues) concurrent triggers.

mod cache;
mod controller;

pub use cache::InboxCache;
pub use controller::{InboxController, Load, MailApi, SkipReason};
