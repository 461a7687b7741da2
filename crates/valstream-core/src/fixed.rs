use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Material quantities (inventory counts, ledger flows) are exact fixed-point
/// values so repeated add/remove never drifts.
pub type Quantity = Fixed64;

/// Convert an f64 to a Quantity. Use for initialization and data loading.
#[inline]
pub fn qty(v: f64) -> Quantity {
    Quantity::from_num(v)
}

/// Convert an f64 to a Quantity, or `None` when it is NaN or outside the
/// Q32.32 range.
#[inline]
pub fn try_qty(v: f64) -> Option<Quantity> {
    Quantity::checked_from_num(v)
}

/// Convert a Quantity to f64. Use only for valuation, ratios and display.
#[inline]
pub fn qty_to_f64(v: Quantity) -> f64 {
    v.to_num::<f64>()
}

/// Serde adapter writing quantities as plain numbers rather than raw
/// fixed-point bits, so data files and JSON dumps stay human readable.
pub mod serde_qty {
    use serde::{Deserialize, Deserializer, Serializer};

    use serde::de::Error;

    use super::{Quantity, qty_to_f64, try_qty};

    pub fn serialize<S>(value: &Quantity, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(qty_to_f64(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Quantity, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = f64::deserialize(deserializer)?;
        try_qty(v).ok_or_else(|| D::Error::custom(format!("quantity {v} out of range")))
    }

    /// The same adapter for ticker-keyed maps.
    pub mod map {
        use std::collections::BTreeMap;

        use serde::de::Error;
        use serde::ser::SerializeMap;
        use serde::{Deserialize, Deserializer, Serializer};

        use super::super::{Quantity, qty_to_f64, try_qty};

        pub fn serialize<S>(
            value: &BTreeMap<String, Quantity>,
            serializer: S,
        ) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut map = serializer.serialize_map(Some(value.len()))?;
            for (ticker, count) in value {
                map.serialize_entry(ticker, &qty_to_f64(*count))?;
            }
            map.end()
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<String, Quantity>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let raw = BTreeMap::<String, f64>::deserialize(deserializer)?;
            raw.into_iter()
                .map(|(t, v)| {
                    try_qty(v)
                        .map(|q| (t, q))
                        .ok_or_else(|| D::Error::custom(format!("quantity {v} out of range")))
                })
                .collect()
        }
    }
}
