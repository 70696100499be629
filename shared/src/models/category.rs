//! Product category model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A product category. Created lazily the first time a product references
/// its name (get-or-create semantics).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}
