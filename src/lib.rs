pub mod archive;
pub mod call;
pub mod config;
pub mod display;
pub mod engine;
pub mod errors;
pub mod harness;
pub mod memref;
pub mod order;
pub mod stats;
pub mod types;
