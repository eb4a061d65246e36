//! Design extraction, matching, aggregation and styled outline synthesis
//! over an inference backend and an exemplar store.

pub mod active_set;
pub mod config;
pub mod engine;
pub mod extraction;
pub mod failover;
pub mod keywords;
pub mod matcher;
pub mod outline;
pub mod values;

pub use config::EngineConfig;
pub use engine::DesignEngine;
pub use extraction::{parse_extracted_design, DesignExtractor};
pub use keywords::KeywordExtractor;
pub use matcher::DesignMatcher;
pub use outline::{parse_outline, OutlineOptions, OutlineSynthesizer, Refinement};
