//! Identifier generation for new file records
//!
//! Identifiers are UUID v7 strings: random enough that a collision is treated
//! as an error rather than retried, and lexically sortable by creation time.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("identifier generation failed: {0}")]
pub struct IdGenerationError(pub String);

/// Source of unique identifiers for new files
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Result<String, IdGenerationError>;
}

/// Time-ordered UUID v7 generator
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn generate(&self) -> Result<String, IdGenerationError> {
        let id = Uuid::now_v7();

        // now_v7 never yields nil, a nil here means a broken clock or RNG
        if id.is_nil() {
            return Err(IdGenerationError("generator produced a nil uuid".to_string()));
        }

        Ok(id.to_string())
    }
}
