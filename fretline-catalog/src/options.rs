use crate::item::{CatalogItem, OptionKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A dealer's choice for one option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    /// Numeric value for a numeric-kind option.
    Numeric(i64),
    /// value_id of an enumerated option value.
    Choice(String),
}

/// Result of composing a configuration: the full resolved SKU and the
/// cumulative signed price delta in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    pub sku: String,
    pub price_delta_minor: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum OptionError {
    #[error("option {option_id} is required")]
    MissingRequiredOption { option_id: String },

    #[error("unknown value {value_id} for option {option_id}")]
    UnknownOptionValue { option_id: String, value_id: String },
}

/// Compose the selected options of `item` into a SKU and price delta.
///
/// Options are walked in item-definition order; that order fixes both the
/// SKU suffix sequence and is what makes the merge deterministic.
/// Enumerated suffixes are appended verbatim (they carry their own
/// delimiter); numeric values are appended as `-{value}` and contribute
/// zero to the price delta. Selections naming an option the item does not
/// define are rejected rather than dropped.
pub fn compose(
    item: &CatalogItem,
    selections: &HashMap<String, Selection>,
) -> Result<Composition, OptionError> {
    let mut sku = item.sku.clone();
    let mut price_delta_minor = 0i64;
    let mut matched = 0usize;

    for option in &item.options {
        let selection = match selections.get(&option.option_id) {
            Some(selection) => selection,
            None if option.required => {
                return Err(OptionError::MissingRequiredOption {
                    option_id: option.option_id.clone(),
                });
            }
            None => continue,
        };
        matched += 1;

        match (option.kind, selection) {
            (OptionKind::Enumerated, Selection::Choice(value_id)) => {
                let value = option.value(value_id).ok_or_else(|| {
                    OptionError::UnknownOptionValue {
                        option_id: option.option_id.clone(),
                        value_id: value_id.clone(),
                    }
                })?;
                sku.push_str(&value.sku_suffix);
                price_delta_minor += value.price_adjustment_minor;
            }
            (OptionKind::Numeric, Selection::Numeric(value)) => {
                sku.push_str(&format!("-{value}"));
            }
            // Kind-mismatched selections cannot name a real value.
            (_, selection) => {
                return Err(OptionError::UnknownOptionValue {
                    option_id: option.option_id.clone(),
                    value_id: describe(selection),
                });
            }
        }
    }

    if matched != selections.len() {
        let (option_id, selection) = selections
            .iter()
            .find(|(id, _)| !item.options.iter().any(|o| o.option_id == **id))
            .map(|(id, sel)| (id.clone(), describe(sel)))
            .unwrap_or_default();
        return Err(OptionError::UnknownOptionValue {
            option_id,
            value_id: selection,
        });
    }

    Ok(Composition {
        sku,
        price_delta_minor,
    })
}

fn describe(selection: &Selection) -> String {
    match selection {
        Selection::Choice(value_id) => value_id.clone(),
        Selection::Numeric(value) => value.to_string(),
    }
}
