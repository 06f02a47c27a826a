mod engine;

pub use engine::ReasoningEngine;
