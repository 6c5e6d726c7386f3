//! Command handlers.

pub(crate) mod hash;
pub(crate) mod resolve;
