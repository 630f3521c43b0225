use crate::enums::ColumnRole;
use serde::{Deserialize, Serialize};

/// Which source column, if any, feeds each optional role.
///
/// Resolved once at ingestion. An absent role means the feature is unavailable,
/// never that the data is broken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub market_cap: Option<String>,
    pub supply: Option<String>,
    pub ratio: Option<String>,
}

impl ColumnMapping {
    pub fn get(&self, role: ColumnRole) -> Option<&str> {
        match role {
            ColumnRole::MarketCap => self.market_cap.as_deref(),
            ColumnRole::Supply => self.supply.as_deref(),
            ColumnRole::Ratio => self.ratio.as_deref(),
        }
    }

    pub fn set(&mut self, role: ColumnRole, column: Option<String>) {
        match role {
            ColumnRole::MarketCap => self.market_cap = column,
            ColumnRole::Supply => self.supply = column,
            ColumnRole::Ratio => self.ratio = column,
        }
    }

    pub fn is_available(&self, role: ColumnRole) -> bool {
        self.get(role).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_set_are_symmetric() {
        let mut mapping = ColumnMapping::default();
        assert!(!mapping.is_available(ColumnRole::Supply));

        mapping.set(ColumnRole::Supply, Some("circulating_supply".to_string()));
        assert_eq!(mapping.get(ColumnRole::Supply), Some("circulating_supply"));
        assert!(!mapping.is_available(ColumnRole::MarketCap));
    }
}
