//! Diskreter Entscheidungskontext und die Einteilung von Zeitstempeln in
//! Tageszeit- und Wochentags-Buckets.
//!
//! Ein [`Context`] ist ein reiner Werttyp: zwei Kontexte sind genau dann
//! gleich, wenn alle vier Felder übereinstimmen. Es gibt bewusst keine
//! Ähnlichkeitssuche; jede Kombination bildet einen eigenen Bucket.

use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Date, PrimitiveDateTime, Weekday};

use crate::interaction::Interaction;

/// Label für einen unbekannten Tageszeit- bzw. Wochentags-Bucket.
pub const UNKNOWN_LABEL: &str = "";

/// Situation, in der eine Empfehlung getroffen wird.
///
/// Die abgeleitete Ordnung (Feld für Feld) wird für die deterministische
/// Reihenfolge im persistierten Zustand genutzt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Context {
    pub user_id: String,
    /// `morning`, `afternoon`, `evening`, `night` oder `""`.
    pub time_of_day: String,
    /// `monday` .. `sunday` oder `""`.
    pub weekday: String,
    pub device: String,
}

impl Context {
    /// Baut einen Kontext aus bereits gebucketten Rohwerten, z. B. von der CLI.
    pub fn new(
        user_id: impl Into<String>,
        time_of_day: impl Into<String>,
        weekday: impl Into<String>,
        device: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            time_of_day: time_of_day.into(),
            weekday: weekday.into(),
            device: device.into(),
        }
    }

    /// Leitet Tageszeit und Wochentag aus einem optionalen Zeitstempel ab.
    ///
    /// Fehlt der Zeitstempel, landen beide Labels im unbekannten Bucket `""`.
    /// Stunde und Datum werden so gelesen, wie sie erfasst wurden.
    pub fn at(
        user_id: impl Into<String>,
        timestamp: Option<PrimitiveDateTime>,
        device: impl Into<String>,
    ) -> Self {
        let (time_of_day, weekday) = match timestamp {
            Some(ts) => (time_of_day_label(ts.hour()), weekday_label(ts.date())),
            None => (UNKNOWN_LABEL, UNKNOWN_LABEL),
        };
        Self::new(user_id, time_of_day, weekday, device)
    }

    /// Kontext einer einzelnen Trainings-Interaktion.
    pub fn from_interaction(record: &Interaction) -> Self {
        Self::at(
            record.user_id.clone(),
            record.impression_time,
            record.device.clone(),
        )
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "user={} time={} weekday={} device={}",
            self.user_id, self.time_of_day, self.weekday, self.device
        )
    }
}

/// Ordnet eine Stunde (0-23) einem Tageszeit-Bucket zu.
///
/// Die Nacht umfasst sowohl 22-23 Uhr als auch 0-3 Uhr.
#[must_use]
pub fn time_of_day_label(hour: u8) -> &'static str {
    match hour {
        0..=3 => "night",
        4..=11 => "morning",
        12..=17 => "afternoon",
        18..=21 => "evening",
        _ => "night",
    }
}

/// Kleingeschriebener englischer Wochentag des Datums.
#[must_use]
pub fn weekday_label(date: Date) -> &'static str {
    match date.weekday() {
        Weekday::Monday => "monday",
        Weekday::Tuesday => "tuesday",
        Weekday::Wednesday => "wednesday",
        Weekday::Thursday => "thursday",
        Weekday::Friday => "friday",
        Weekday::Saturday => "saturday",
        Weekday::Sunday => "sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use crate::interaction::parse_impression_time;
    use time::Month;

    #[test]
    fn hour_buckets_cover_the_day() {
        assert_eq!(time_of_day_label(0), "night");
        assert_eq!(time_of_day_label(3), "night");
        assert_eq!(time_of_day_label(4), "morning");
        assert_eq!(time_of_day_label(11), "morning");
        assert_eq!(time_of_day_label(12), "afternoon");
        assert_eq!(time_of_day_label(17), "afternoon");
        assert_eq!(time_of_day_label(18), "evening");
        assert_eq!(time_of_day_label(21), "evening");
        assert_eq!(time_of_day_label(22), "night");
        assert_eq!(time_of_day_label(23), "night");
    }

    #[test]
    fn weekday_is_lowercase_english() {
        let date = Date::from_calendar_date(2023, Month::October, 27).unwrap();
        assert_eq!(weekday_label(date), "friday");
        let date = Date::from_calendar_date(2024, Month::January, 7).unwrap();
        assert_eq!(weekday_label(date), "sunday");
    }

    #[test]
    fn missing_timestamp_maps_to_unknown_bucket() {
        let ctx = Context::at("u1", None, "mobile");
        assert_eq!(ctx.time_of_day, "");
        assert_eq!(ctx.weekday, "");
        assert_eq!(ctx.device, "mobile");
    }

    #[test]
    fn timestamp_is_read_as_recorded() {
        // 23:30 in +02:00 ist in UTC noch 21:30, zählt aber als Nacht.
        let ts = parse_impression_time("2023-10-27T23:30:00+02:00").unwrap();
        let ctx = Context::at("u1", Some(ts), "desktop");
        assert_eq!(ctx.time_of_day, "night");
        assert_eq!(ctx.weekday, "friday");

        let civil = parse_impression_time("2023-10-28 03:59:59").unwrap();
        let ctx = Context::at("u1", Some(civil), "desktop");
        assert_eq!(ctx.time_of_day, "night");
        assert_eq!(ctx.weekday, "saturday");
    }

    #[test]
    fn equal_fields_collapse_into_one_key() {
        let a = Context::new("u1", "morning", "monday", "mobile");
        let b = Context::new("u1".to_string(), "morning", "monday", "mobile");
        let c = Context::new("u1", "morning", "monday", "desktop");

        let keys: HashSet<_> = [a.clone(), b, c].into_iter().collect();
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&a));
    }
}
