//! Decoding SQLite values and rows into JSON

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{SqliteRow, SqliteValueRef};
use sqlx::{Column, Row, TypeInfo, Value, ValueRef};
use time::PrimitiveDateTime;

use crate::error::{Error, Result};

/// Decode one result row into a column-ordered map of JSON values.
///
/// Suitable as the mapper for
/// [`raw_query`](crate::VersionedDatabase::raw_query) when the caller has
/// no typed representation of the row.
pub fn row_to_json(row: &SqliteRow) -> Result<IndexMap<String, JsonValue>> {
   let mut decoded = IndexMap::with_capacity(row.len());
   for (index, column) in row.columns().iter().enumerate() {
      let raw = row.try_get_raw(index)?;
      decoded.insert(column.name().to_string(), value_to_json(raw)?);
   }
   Ok(decoded)
}

/// Convert a raw SQLite value into JSON.
///
/// BLOBs become base64 strings since JSON has no binary type. Booleans are
/// INTEGER-backed in SQLite. DATETIME decodes through [`time`] with a
/// plain-text fallback; DATE and TIME are stored as ISO 8601 text already.
pub fn value_to_json(value: SqliteValueRef) -> Result<JsonValue> {
   if value.is_null() {
      return Ok(JsonValue::Null);
   }

   let type_info = value.type_info();
   let owned = value.to_owned();

   let decoded = match type_info.name() {
      "TEXT" | "DATE" | "TIME" => owned
         .try_decode::<String>()
         .map(JsonValue::String)
         .unwrap_or(JsonValue::Null),

      "REAL" => owned
         .try_decode::<f64>()
         .map(JsonValue::from)
         .unwrap_or(JsonValue::Null),

      "INTEGER" | "NUMERIC" => owned
         .try_decode::<i64>()
         .map(|v| JsonValue::Number(v.into()))
         .unwrap_or(JsonValue::Null),

      "BOOLEAN" => owned
         .try_decode::<bool>()
         .map(JsonValue::Bool)
         .unwrap_or(JsonValue::Null),

      "DATETIME" => {
         if let Ok(stamp) = owned.try_decode::<PrimitiveDateTime>() {
            JsonValue::String(stamp.to_string())
         } else {
            owned
               .try_decode::<String>()
               .map(JsonValue::String)
               .unwrap_or(JsonValue::Null)
         }
      }

      "BLOB" => owned
         .try_decode::<Vec<u8>>()
         .map(|blob| JsonValue::String(encode_base64(&blob)))
         .unwrap_or(JsonValue::Null),

      "NULL" => JsonValue::Null,

      other => {
         // Unknown affinity: take it as text if it decodes, otherwise
         // refuse loudly
         match owned.try_decode::<String>() {
            Ok(text) => JsonValue::String(text),
            Err(_) => return Err(Error::UnsupportedDatatype(other.to_string())),
         }
      }
   };

   Ok(decoded)
}

fn encode_base64(data: &[u8]) -> String {
   use base64::Engine;
   base64::engine::general_purpose::STANDARD.encode(data)
}
