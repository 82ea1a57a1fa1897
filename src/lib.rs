//! Eco-evolutionary consumer-resource simulation.
//!
//! A community of consumer types competes for a shared pool of resources.
//! The engine integrates the coupled consumer-resource equations forward in
//! time, stochastically generates new types through mutation, and streams one
//! snapshot per sampling interval to an external observer, either through a
//! synchronous callback ([`engine::Engine::run`]) or across a worker-thread
//! boundary ([`progress::SimulationHandle`]).

pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod progress;
pub mod stats;
