//! Historische Interaktionen, aus denen trainiert wird.
//!
//! Eine [`Interaction`] entspricht einer Zeile aus dem Data-Warehouse: wem
//! wurde welches Item wann auf welchem Gerät gezeigt und wurde geklickt.
//! Die Herkunft der Zeilen spielt keine Rolle; jede Quelle, die diese Form
//! liefert, erfüllt den Vertrag.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Iso8601;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Eine gelabelte Impression.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    pub user_id: String,
    pub item_id: String,
    /// Zivile Uhrzeit der Impression, so wie sie erfasst wurde; darf fehlen
    /// oder `null` sein.
    #[serde(default, with = "civil_time")]
    pub impression_time: Option<PrimitiveDateTime>,
    pub was_clicked: bool,
    pub device: String,
}

/// Liest einen Impression-Zeitstempel als zivile Uhrzeit.
///
/// Akzeptiert Warehouse-DATETIMEs ohne Zone (`2023-10-27T10:00:00`,
/// `2023-10-27 10:00:00`, jeweils optional mit Sekundenbruchteil) sowie
/// ISO-8601 mit Offset. Ein Offset wird verworfen, nicht umgerechnet:
/// Stunde und Datum bleiben so, wie sie geschrieben stehen.
pub fn parse_impression_time(raw: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Iso8601::DEFAULT) {
        return Ok(PrimitiveDateTime::new(ts.date(), ts.time()));
    }
    PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT).or_else(|_| {
        PrimitiveDateTime::parse(
            raw,
            format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
            ),
        )
    })
}

mod civil_time {
    use serde::{de, ser, Deserialize, Deserializer, Serializer};
    use time::macros::format_description;
    use time::PrimitiveDateTime;

    pub fn serialize<S: Serializer>(
        value: &Option<PrimitiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => {
                let text = ts
                    .format(format_description!(
                        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"
                    ))
                    .map_err(ser::Error::custom)?;
                serializer.serialize_some(&text)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<PrimitiveDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| {
                super::parse_impression_time(&raw)
                    .map_err(|e| de::Error::custom(format!("invalid impression_time {raw:?}: {e}")))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn interaction_from_json_row() {
        let row = json!({
            "user_id": "u42",
            "item_id": "ItemA",
            "impression_time": "2023-10-27T10:00:00Z",
            "was_clicked": true,
            "device": "mobile"
        });

        let record: Interaction = serde_json::from_value(row).expect("Deserialization failed");
        assert_eq!(record.item_id, "ItemA");
        assert!(record.was_clicked);
        let ts = record.impression_time.expect("timestamp present");
        assert_eq!(ts.hour(), 10);
    }

    #[test]
    fn warehouse_datetime_without_zone_is_accepted() {
        for raw in [
            "2023-10-27T10:00:00",
            "2023-10-27T10:00:00.123456",
            "2023-10-27 10:00:00",
            "2023-10-27 10:00:00.5",
        ] {
            let row = json!({
                "user_id": "u",
                "item_id": "i",
                "impression_time": raw,
                "was_clicked": false,
                "device": "d"
            });
            let record: Interaction = serde_json::from_value(row)
                .unwrap_or_else(|e| panic!("{raw} wurde abgelehnt: {e}"));
            let ts = record.impression_time.expect("timestamp present");
            assert_eq!(ts.hour(), 10, "{raw}");
            assert_eq!(ts.day(), 27, "{raw}");
        }
    }

    #[test]
    fn offset_is_dropped_not_converted() {
        let ts = parse_impression_time("2023-10-27T23:30:00+02:00").unwrap();
        assert_eq!(ts.hour(), 23);
        assert_eq!(ts.day(), 27);
    }

    #[test]
    fn interaction_serializes_back_to_civil_time() {
        let record = Interaction {
            user_id: "u".into(),
            item_id: "i".into(),
            impression_time: Some(parse_impression_time("2023-10-27 10:00:00.25").unwrap()),
            was_clicked: true,
            device: "d".into(),
        };
        let text = serde_json::to_string(&record).expect("Serialization failed");
        assert!(!text.contains('Z'));
        let back: Interaction = serde_json::from_str(&text).expect("Deserialization failed");
        assert_eq!(back, record);
    }

    #[test]
    fn impression_time_may_be_null_or_absent() {
        let null_ts: Interaction = serde_json::from_str(
            r#"{"user_id":"u","item_id":"i","impression_time":null,"was_clicked":false,"device":"d"}"#,
        )
        .expect("null timestamp");
        assert!(null_ts.impression_time.is_none());

        let absent_ts: Interaction = serde_json::from_str(
            r#"{"user_id":"u","item_id":"i","was_clicked":false,"device":"d"}"#,
        )
        .expect("absent timestamp");
        assert!(absent_ts.impression_time.is_none());
    }

    #[test]
    fn garbage_timestamp_and_missing_click_flag_are_rejected() {
        let res = serde_json::from_str::<Interaction>(
            r#"{"user_id":"u","item_id":"i","impression_time":"yesterday","was_clicked":true,"device":"d"}"#,
        );
        assert!(res.is_err());
        let res = serde_json::from_str::<Interaction>(r#"{"user_id":"u","item_id":"i","device":"d"}"#);
        assert!(res.is_err());
    }
}
