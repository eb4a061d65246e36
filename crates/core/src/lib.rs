//! Core design types, keyword normalization, exemplar ranking and style
//! aggregation for AI-generated slide decks.

pub mod aggregate;
pub mod defaults;
pub mod error;
pub mod json;
pub mod matching;
pub mod normalize;
pub mod presets;
pub mod types;

pub use aggregate::aggregate;
pub use error::{Error, Result};
pub use matching::rank_exemplars;
pub use presets::ManualDesignSet;
pub use types::{
    ActiveDesignSet, AggregatedDesignSpec, CustomColors, DesignExemplar, DesignSpec,
    ExemplarScope, ExtractedDesign, MatchedDesign, NewExemplar, SlideOutline, SlideSpec, Spacing,
    Typography,
};
