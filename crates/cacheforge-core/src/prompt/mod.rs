//! Prompt composition and response parsing around the shared output contract.

pub mod composer;
pub mod parser;
pub mod skeleton;

pub use composer::{PromptComposer, Retrieval};
pub use parser::{FieldOutcome, ParsedResponse, ResponseParser};
