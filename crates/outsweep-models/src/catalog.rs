use serde::{Deserialize, Serialize};

/// Per-side whitelist flags for an item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Eligibility {
    /// May appear on the side this account gives away.
    pub offerable: bool,
    /// May appear on the side this account receives.
    pub requestable: bool,
}

impl Default for Eligibility {
    fn default() -> Self {
        Self {
            offerable: true,
            requestable: true,
        }
    }
}

/// Static attributes of an item type, as known to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub item_id: u64,
    pub name: Option<String>,
    /// Nominal value.
    pub value: i64,
    /// Recent average price.
    pub rap: i64,
    /// Value used instead of `value` when this item is offered.
    #[serde(default)]
    pub offer_value: Option<i64>,
    /// Value used instead of `value` when this item is requested.
    #[serde(default)]
    pub request_value: Option<i64>,
    #[serde(default)]
    pub eligibility: Eligibility,
}

impl CatalogEntry {
    pub fn offering_value(&self) -> i64 {
        self.offer_value.unwrap_or(self.value)
    }

    pub fn requesting_value(&self) -> i64 {
        self.request_value.unwrap_or(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> CatalogEntry {
        CatalogEntry {
            item_id: 1028606,
            name: Some("Red Baseball Cap".to_string()),
            value: 1200,
            rap: 950,
            offer_value: None,
            request_value: None,
            eligibility: Eligibility::default(),
        }
    }

    #[test]
    fn overrides_fall_back_to_value() {
        let e = entry();
        assert_eq!(e.offering_value(), 1200);
        assert_eq!(e.requesting_value(), 1200);
    }

    #[test]
    fn overrides_apply_per_side() {
        let e = CatalogEntry {
            offer_value: Some(1100),
            request_value: Some(1300),
            ..entry()
        };
        assert_eq!(e.offering_value(), 1100);
        assert_eq!(e.requesting_value(), 1300);
    }

    #[test]
    fn zero_override_is_respected() {
        let e = CatalogEntry {
            offer_value: Some(0),
            ..entry()
        };
        assert_eq!(e.offering_value(), 0);
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{"item_id": 1, "name": null, "value": 10, "rap": 8}"#;
        let e: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(e.offer_value, None);
        assert!(e.eligibility.offerable);
        assert!(e.eligibility.requestable);
    }
}
