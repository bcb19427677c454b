#![allow(clippy::shadow_unrelated, reason = "Shadowing in async blocks is idiomatic")]
#![allow(clippy::single_call_fn, reason = "HTTP handlers are called once from router")]

pub mod photos;
pub mod share;
pub mod sheet;
