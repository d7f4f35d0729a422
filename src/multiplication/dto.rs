use serde::{Deserialize, Serialize};

/// Inclusive range an operand is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operand {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operands {
    pub first: Operand,
    pub second: Operand,
}

impl Default for Operands {
    fn default() -> Self {
        Self {
            first: Operand { min: 2, max: 12 },
            second: Operand { min: 1, max: 12 },
        }
    }
}
