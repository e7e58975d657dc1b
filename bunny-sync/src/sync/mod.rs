pub mod engine;
pub mod inventory;
pub mod paths;
pub mod prune;
pub mod transfer;
