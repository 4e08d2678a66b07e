//! Generation pipeline entry points.

pub mod run;

pub use run::{
    run_content_engine, run_content_engine_at, run_resolved, EngineError, RunOutput,
    RunOverrides,
};
