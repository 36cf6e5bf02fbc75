//! Text-driven decision-support pipeline: keyword routing over a declarative
//! intent table, isolated report generators (structure, multi-criteria
//! decision analysis, expected-loss risk), cross-cutting evaluators, and
//! per-project JSONL memory.

pub mod config;
pub mod evaluators;
pub mod memory;
pub mod modules;
pub mod pipeline;
pub mod telemetry;
