use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic role an optional column can play in a price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    MarketCap,
    Supply,
    Ratio,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 3] = [ColumnRole::MarketCap, ColumnRole::Supply, ColumnRole::Ratio];
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnRole::MarketCap => "market cap",
            ColumnRole::Supply => "supply",
            ColumnRole::Ratio => "ratio",
        };
        f.write_str(name)
    }
}

/// Which side of the EMA a regime run sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunDirection {
    Above,
    Below,
}

impl RunDirection {
    /// Returns the opposite side of the EMA
    pub fn opposite(&self) -> Self {
        match self {
            RunDirection::Above => RunDirection::Below,
            RunDirection::Below => RunDirection::Above,
        }
    }
}
