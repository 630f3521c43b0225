use crate::error::IngestError;
use configuration::ColumnOverrides;
use core_types::{ColumnMapping, ColumnRole};

/// Whether a lowercased column name fits `role`.
fn matches_role(lowercased: &str, role: ColumnRole) -> bool {
    match role {
        ColumnRole::MarketCap => lowercased.contains("market_cap"),
        ColumnRole::Supply => lowercased.contains("supply") || lowercased.contains("circulating"),
        ColumnRole::Ratio => lowercased.contains("price") && lowercased.contains('/'),
    }
}

/// Assigns optional roles to columns by case-insensitive name matching.
///
/// When several columns fit a role the first one in column order wins. Roles with
/// no match stay `None`.
pub fn classify<S: AsRef<str>>(field_names: &[S]) -> ColumnMapping {
    let lowered: Vec<(String, &str)> = field_names
        .iter()
        .map(|name| (name.as_ref().to_lowercase(), name.as_ref()))
        .collect();

    let mut mapping = ColumnMapping::default();
    for role in ColumnRole::ALL {
        let found = lowered
            .iter()
            .find(|(lower, _)| matches_role(lower, role))
            .map(|(_, original)| original.to_string());
        mapping.set(role, found);
    }
    mapping
}

/// Resolves the final `ColumnMapping` for a table.
///
/// Explicit overrides take precedence and must name an existing header; the
/// remaining roles fall back to [`classify`].
pub fn resolve_mapping(
    headers: &[String],
    overrides: &ColumnOverrides,
) -> Result<ColumnMapping, IngestError> {
    let mut mapping = classify(headers);

    let pinned = [
        (ColumnRole::MarketCap, &overrides.market_cap),
        (ColumnRole::Supply, &overrides.supply),
        (ColumnRole::Ratio, &overrides.ratio),
    ];
    for (role, column) in pinned {
        if let Some(column) = column {
            if !headers.iter().any(|h| h.trim() == column.trim()) {
                return Err(IngestError::UnknownColumn(column.clone()));
            }
            mapping.set(role, Some(column.trim().to_string()));
        }
    }

    for role in ColumnRole::ALL {
        match mapping.get(role) {
            Some(column) => tracing::debug!(%role, column, "Column role resolved"),
            None => tracing::debug!(%role, "No column for role; dependent panels are unavailable"),
        }
    }

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_substring_case_insensitively() {
        let mapping = classify(&["data", "price", "Market_Cap_USD", "Circulating", "Price/BTC"]);
        assert_eq!(mapping.market_cap.as_deref(), Some("Market_Cap_USD"));
        assert_eq!(mapping.supply.as_deref(), Some("Circulating"));
        assert_eq!(mapping.ratio.as_deref(), Some("Price/BTC"));
    }

    #[test]
    fn first_match_in_column_order_wins() {
        let mapping = classify(&["total_supply", "circulating_supply", "market_cap", "market_cap_2"]);
        assert_eq!(mapping.supply.as_deref(), Some("total_supply"));
        assert_eq!(mapping.market_cap.as_deref(), Some("market_cap"));
    }

    #[test]
    fn ratio_needs_both_price_and_slash() {
        let mapping = classify(&["price", "btc/eth", "price_ratio"]);
        assert_eq!(mapping.ratio, None);
    }

    #[test]
    fn absent_roles_are_none() {
        let mapping = classify(&["data", "price"]);
        assert_eq!(mapping, ColumnMapping::default());
    }

    #[test]
    fn overrides_win_and_must_exist() {
        let headers: Vec<String> = ["data", "price", "market_cap", "cap"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let overrides = ColumnOverrides {
            market_cap: Some("cap".to_string()),
            ..ColumnOverrides::default()
        };
        let mapping = resolve_mapping(&headers, &overrides).unwrap();
        assert_eq!(mapping.market_cap.as_deref(), Some("cap"));

        let overrides = ColumnOverrides {
            supply: Some("nope".to_string()),
            ..ColumnOverrides::default()
        };
        assert!(matches!(
            resolve_mapping(&headers, &overrides),
            Err(IngestError::UnknownColumn(c)) if c == "nope"
        ));
    }
}
