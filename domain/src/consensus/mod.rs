//! Panel opinions and consensus merging

pub mod builder;
pub mod opinion;

pub use builder::{ConsensusBuilder, ConsensusResult, ConsensusUnavailable};
pub use opinion::{AgentOpinion, AgentRole, NEUTRAL_CONFIDENCE, extract_confidence};
