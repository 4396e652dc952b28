pub mod agent;
pub mod constants;
pub mod engine;
pub mod error;
pub mod rng;
pub mod runtime;
pub mod types;
pub mod world;
