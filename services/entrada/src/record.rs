//! Product records as served by the lookup API and as shown on the board

use serde::{Deserialize, Deserializer, Serialize};

/// Text shown for any field the API leaves empty
pub const NOT_AVAILABLE: &str = "N/A";

/// Product record as returned by `GET /api/socket/{epc}`
///
/// Every field is display-only. Values may arrive as strings or numbers;
/// missing, `null`, empty, zero and `false` values all collapse to `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductRecord {
    #[serde(rename = "fecha", default, deserialize_with = "display_field")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "display_field")]
    pub area: Option<String>,
    #[serde(rename = "claveProducto", default, deserialize_with = "display_field")]
    pub product_code: Option<String>,
    #[serde(rename = "nombreProducto", default, deserialize_with = "display_field")]
    pub product_name: Option<String>,
    #[serde(rename = "pesoBruto", default, deserialize_with = "display_field")]
    pub gross_weight: Option<String>,
    #[serde(rename = "pesoNeto", default, deserialize_with = "display_field")]
    pub net_weight: Option<String>,
    #[serde(rename = "pesoTarima", default, deserialize_with = "display_field")]
    pub pallet_weight: Option<String>,
    #[serde(rename = "piezas", default, deserialize_with = "display_field")]
    pub pieces: Option<String>,
    #[serde(default, deserialize_with = "display_field")]
    pub uom: Option<String>,
    #[serde(rename = "fechaEntrada", default, deserialize_with = "display_field")]
    pub entry_date: Option<String>,
    #[serde(rename = "productPrintCard", default, deserialize_with = "display_field")]
    pub print_card: Option<String>,
}

fn display_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(display_text))
}

fn display_text(value: serde_json::Value) -> Option<String> {
    use serde_json::Value;

    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => None,
            // 498.0 shows as 498
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(format!("{}", f as i64))
            }
            _ => Some(n.to_string()),
        },
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// One row on the board: a product record joined with its image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEntry {
    /// `<img src>` value: a URL or a data URI
    pub image: String,
    pub date: String,
    pub area: String,
    pub product_code: String,
    pub product_name: String,
    pub gross_weight: String,
    pub net_weight: String,
    pub pallet_weight: String,
    pub pieces: String,
    pub uom: String,
    pub entry_date: String,
    pub print_card: String,
    pub epc: String,
    pub received_epoch_ms: u64,
}

impl ProductEntry {
    pub fn new(record: ProductRecord, image: String, epc: &str, received_epoch_ms: u64) -> Self {
        let or_na = |field: Option<String>| field.unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Self {
            image,
            date: or_na(record.date),
            area: or_na(record.area),
            product_code: or_na(record.product_code),
            product_name: or_na(record.product_name),
            gross_weight: or_na(record.gross_weight),
            net_weight: or_na(record.net_weight),
            pallet_weight: or_na(record.pallet_weight),
            pieces: or_na(record.pieces),
            uom: or_na(record.uom),
            entry_date: or_na(record.entry_date),
            print_card: or_na(record.print_card),
            epc: epc.to_string(),
            received_epoch_ms,
        }
    }
}
