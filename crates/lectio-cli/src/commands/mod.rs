//! Command handlers

pub mod backup;
pub mod export;
pub mod favorite;
pub mod reading;
pub mod search;
pub mod stats;
pub mod status;
pub mod sync;
pub mod validate;
