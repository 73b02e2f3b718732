use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashSet;
use uuid::Uuid;

/// How an option collects its value from the dealer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionKind {
    /// A fixed list of values, each carrying a SKU suffix and price delta.
    Enumerated,
    /// A free numeric value (e.g. scale length in mm). Passed through to
    /// the resolved SKU but priced at zero pending product confirmation.
    Numeric,
}

/// One selectable value of an enumerated option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionValue {
    pub value_id: String,
    pub label: String,
    /// Appended verbatim to the item SKU; carries its own leading `-`.
    pub sku_suffix: String,
    /// Signed price delta in minor units of the item's price currency.
    pub price_adjustment_minor: i64,
    pub images: Vec<String>,
}

/// A configurable option on a catalog item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionDef {
    pub option_id: String,
    pub label: String,
    pub kind: OptionKind,
    pub required: bool,
    /// Ordered values; empty for numeric options.
    pub values: Vec<OptionValue>,
}

impl OptionDef {
    pub fn value(&self, value_id: &str) -> Option<&OptionValue> {
        self.values.iter().find(|v| v.value_id == value_id)
    }
}

/// A sellable guitar model.
///
/// Immutable once referenced by an order: historical orders must stay able
/// to reconstruct their SKU and price from the version they were placed
/// against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub series: String,
    /// Base specs, e.g. "body" -> "Alder", "frets" -> "22".
    pub base_specs: BTreeMap<String, String>,
    /// Ordered option definitions; ordering determines SKU composition.
    pub options: Vec<OptionDef>,
}

impl CatalogItem {
    /// Check the structural invariants: option ids unique on the item,
    /// value ids unique within each option, numeric options without values.
    pub fn validate(&self) -> Result<(), ItemError> {
        let mut option_ids = HashSet::new();
        for option in &self.options {
            if !option_ids.insert(option.option_id.as_str()) {
                return Err(ItemError::DuplicateOption {
                    option_id: option.option_id.clone(),
                });
            }
            if option.kind == OptionKind::Numeric && !option.values.is_empty() {
                return Err(ItemError::NumericOptionWithValues {
                    option_id: option.option_id.clone(),
                });
            }
            let mut value_ids = HashSet::new();
            for value in &option.values {
                if !value_ids.insert(value.value_id.as_str()) {
                    return Err(ItemError::DuplicateValue {
                        option_id: option.option_id.clone(),
                        value_id: value.value_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    #[error("duplicate option id {option_id}")]
    DuplicateOption { option_id: String },

    #[error("duplicate value id {value_id} in option {option_id}")]
    DuplicateValue { option_id: String, value_id: String },

    #[error("numeric option {option_id} must not carry a value list")]
    NumericOptionWithValues { option_id: String },
}
