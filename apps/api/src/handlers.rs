pub mod comments;
pub mod health;
pub mod purge;

/// Path of the full comment listing, the target of every interactive redirect.
pub const LISTING_PATH: &str = "/getAllComments";
