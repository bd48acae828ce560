//! Lenient decoders for form-shaped JSON.
//!
//! Browser forms submit untouched date inputs as `""`; those decode to `None`.

use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer};

pub(crate) fn blank_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| de::Error::custom(format!("expected YYYY-MM-DD date: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::blank_date")]
        d: Option<chrono::NaiveDate>,
    }

    #[test]
    fn blank_and_missing_dates_are_none() {
        let p: Probe = serde_json::from_str(r#"{"d": ""}"#).unwrap();
        assert!(p.d.is_none());
        let p: Probe = serde_json::from_str(r#"{"d": null}"#).unwrap();
        assert!(p.d.is_none());
        let p: Probe = serde_json::from_str(r#"{}"#).unwrap();
        assert!(p.d.is_none());
    }

    #[test]
    fn iso_dates_parse_and_garbage_fails() {
        let p: Probe = serde_json::from_str(r#"{"d": "2026-03-14"}"#).unwrap();
        assert_eq!(p.d.unwrap().to_string(), "2026-03-14");
        assert!(serde_json::from_str::<Probe>(r#"{"d": "14/03/2026"}"#).is_err());
    }
}
