//! Port definitions (interfaces to the infrastructure layer)

pub mod audit_sink;
pub mod corpus_provider;
pub mod model_gateway;
pub mod reviewer;
