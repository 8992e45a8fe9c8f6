// Per-record processing stages, in pipeline order

pub mod normalize;
pub mod validate;
pub mod dedupe;
pub mod quality_gate;
pub mod flags;
