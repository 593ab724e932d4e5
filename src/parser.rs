//! JSON parser for the SEPTA TrainView feed.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::snapshot::VehicleRecord;

/// A decoded feed: the trains that parsed cleanly plus the untouched document.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainFeed {
    pub trains: Vec<VehicleRecord>,
    /// Entries dropped because a required field was missing or unreadable.
    pub skipped: usize,
    pub raw: Value,
}

impl TrainFeed {
    pub fn empty() -> Self {
        TrainFeed {
            trains: Vec::new(),
            skipped: 0,
            raw: Value::Array(Vec::new()),
        }
    }
}

#[derive(Deserialize)]
struct RawTrain {
    #[serde(deserialize_with = "text_or_number")]
    trainno: String,
    #[serde(rename = "SOURCE")]
    source: String,
    dest: String,
    #[serde(deserialize_with = "minutes")]
    late: i64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Number(n) => n.to_string(),
    })
}

fn minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| de::Error::custom(format!("late {s:?}: {e}"))),
        TextOrNumber::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .ok_or_else(|| de::Error::custom(format!("late {n} is not a whole number"))),
    }
}

/// Decodes a TrainView response body.
///
/// The body is either a JSON array of trains or an object wrapping that array
/// under `"trains"`. Individual entries that cannot be read are skipped and
/// counted rather than failing the whole feed.
///
/// # Errors
///
/// Returns an error if the bytes are not JSON or the document holds no train list.
pub fn parse_feed(bytes: &[u8]) -> Result<TrainFeed, serde_json::Error> {
    let raw: Value = serde_json::from_slice(bytes)?;

    let entries = match &raw {
        Value::Array(entries) => entries,
        Value::Object(map) => match map.get("trains") {
            Some(Value::Array(entries)) => entries,
            _ => return Err(de::Error::custom("expected a \"trains\" array")),
        },
        _ => return Err(de::Error::custom("expected a JSON array of trains")),
    };

    let mut trains = Vec::with_capacity(entries.len());
    let mut skipped = 0;

    for (index, entry) in entries.iter().enumerate() {
        match RawTrain::deserialize(entry) {
            Ok(t) => trains.push(VehicleRecord {
                id: t.trainno,
                origin: t.source,
                destination: t.dest,
                late_minutes: t.late,
            }),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed train record");
                skipped += 1;
            }
        }
    }

    Ok(TrainFeed {
        trains,
        skipped,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_array() {
        let feed = parse_feed(b"[]").unwrap();
        assert!(feed.trains.is_empty());
        assert_eq!(feed.skipped, 0);
        assert_eq!(feed, TrainFeed::empty());
    }

    #[test]
    fn test_parse_invalid_bytes() {
        let invalid_bytes = vec![0xFF, 0xFE, 0x00, 0x01];
        assert!(parse_feed(&invalid_bytes).is_err());
    }

    #[test]
    fn test_parse_rejects_non_list_document() {
        assert!(parse_feed(b"42").is_err());
        assert!(parse_feed(br#"{"error": "no trains"}"#).is_err());
    }

    #[test]
    fn test_parse_trainview_record() {
        let body = br#"[
            {"lat":"40.0","lon":"-75.1","trainno":"101","service":"LOCAL",
             "dest":"Glenside","nextstop":"Jenkintown","line":"Lansdale/Doylestown",
             "late":15,"SOURCE":"Center City"}
        ]"#;
        let feed = parse_feed(body).unwrap();

        assert_eq!(
            feed.trains,
            vec![VehicleRecord {
                id: "101".to_string(),
                origin: "Center City".to_string(),
                destination: "Glenside".to_string(),
                late_minutes: 15,
            }]
        );
        assert_eq!(feed.raw[0]["line"], "Lansdale/Doylestown");
    }

    #[test]
    fn test_parse_accepts_numbers_as_text_and_text_as_numbers() {
        let body = br#"[{"trainno":202,"SOURCE":"C","dest":"D","late":"45"}]"#;
        let feed = parse_feed(body).unwrap();

        assert_eq!(feed.trains[0].id, "202");
        assert_eq!(feed.trains[0].late_minutes, 45);
    }

    #[test]
    fn test_parse_rejects_fractional_lateness() {
        let body = br#"[
            {"trainno":"1","SOURCE":"A","dest":"B","late":29.6},
            {"trainno":"2","SOURCE":"A","dest":"B","late":"29.6"},
            {"trainno":"3","SOURCE":"A","dest":"B","late":31.0}
        ]"#;
        let feed = parse_feed(body).unwrap();

        assert_eq!(feed.skipped, 2);
        assert_eq!(feed.trains.len(), 1);
        assert_eq!(feed.trains[0].id, "3");
        assert_eq!(feed.trains[0].late_minutes, 31);
    }

    #[test]
    fn test_parse_wrapped_object() {
        let body = br#"{"trains":[{"trainno":"1","SOURCE":"A","dest":"B","late":0}]}"#;
        let feed = parse_feed(body).unwrap();
        assert_eq!(feed.trains.len(), 1);
    }

    #[test]
    fn test_parse_skips_malformed_records() {
        let body = br#"[
            {"trainno":"1","SOURCE":"A","dest":"B","late":12},
            {"trainno":"2","SOURCE":"A","late":40},
            {"trainno":"3","SOURCE":"A","dest":"B","late":"soon"},
            "not a train",
            {"trainno":"4","SOURCE":"A","dest":"B","late":-2}
        ]"#;
        let feed = parse_feed(body).unwrap();

        let ids: Vec<_> = feed.trains.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert_eq!(feed.skipped, 3);
        assert_eq!(feed.trains[1].late_minutes, -2);
    }
}
