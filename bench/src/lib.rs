//! Benchmark utilities for the Prism entity/component core.
//!
//! Provides the shared component fixtures used by the Criterion
//! microbenchmarks: entity create/destroy, composition changes (archetype
//! migration), and component lookup.
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p prism_bench
//!
//! # Run a specific benchmark group
//! cargo bench -p prism_bench -- migration
//! ```
//!
//! Results are written to `target/criterion/` with HTML reports for
//! visualization.

pub mod components;
