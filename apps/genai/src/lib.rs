pub mod config;
pub mod errors;
pub mod llm_client;
pub mod services;

pub use config::Config;
pub use errors::{GenerationError, GenerationResult};
pub use llm_client::{
    ClientSettings, Generated, GenerationRequest, GenerativeClient, OutputShape,
};
