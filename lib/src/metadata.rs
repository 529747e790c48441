use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};

use crate::error::{Chainable, Result};

/// The time zone front matter dates are written in.
pub const TIME_ZONE: Tz = chrono_tz::Europe::Brussels;

/// The format front matter dates are written in.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A document's decoded front matter.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub title: String,
    pub template: String,
    pub date: Option<DateTime<Tz>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetadata {
    title: Option<String>,
    #[serde(alias = "templateName")]
    template: Option<String>,
    #[serde(deserialize_with = "deserialize_date")]
    date: Option<DateTime<Tz>>,
}

impl Metadata {
    /// Metadata for a document without front matter.
    pub fn with_template<T: Into<String>>(default_template: T) -> Self {
        Metadata { title: String::new(), template: default_template.into(), date: None }
    }

    /// Decodes a front matter block. An empty block yields the defaults; a
    /// missing or empty `template` resolves to `default_template`.
    pub fn decode(block: &[u8], default_template: &str) -> Result<Self> {
        let block = std::str::from_utf8(block)
            .map_err(|e| error!("front matter is not valid UTF-8", e))?;

        if block.trim().is_empty() {
            return Ok(Metadata::with_template(default_template));
        }

        let raw: Option<RawMetadata> = serde_yaml::from_str(block)
            .chain(error!("failed to decode front matter"))?;

        let raw = raw.unwrap_or_default();
        Ok(Metadata {
            title: raw.title.unwrap_or_default(),
            template: raw.template
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| default_template.to_string()),
            date: raw.date,
        })
    }
}

/// Parses a `YYYY-MM-DD HH:MM:SS` timestamp as local time in [`TIME_ZONE`].
///
/// A time repeated by a daylight-saving fold resolves to its earlier instant;
/// a time skipped by a daylight-saving gap is invalid.
pub fn parse_date(string: &str) -> Result<DateTime<Tz>> {
    let naive = NaiveDateTime::parse_from_str(string.trim(), DATE_FORMAT)
        .map_err(|e| error!("bad timestamp", "value" => string, "expected format" => DATE_FORMAT, e))?;

    match TIME_ZONE.from_local_datetime(&naive).earliest() {
        Some(date) => Ok(date),
        None => err! {
            "bad timestamp",
            "value" => string,
            "reason" => format!("local time does not exist in {}", TIME_ZONE.name()),
        },
    }
}

fn deserialize_date<'de, D>(de: D) -> Result<Option<DateTime<Tz>>, D::Error>
    where D: Deserializer<'de>
{
    use serde::de::Error;

    match Option::<String>::deserialize(de)? {
        Some(string) => parse_date(&string)
            .map(Some)
            .map_err(|e| D::Error::custom(format!("bad timestamp `{string}`: {}", e.message()))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn empty_block_yields_defaults() {
        let meta = Metadata::decode(b"", "page").unwrap();
        assert_eq!(meta, Metadata::with_template("page"));

        let meta = Metadata::decode(b"  \n", "post").unwrap();
        assert_eq!(meta.template, "post");
        assert_eq!(meta.title, "");
        assert!(meta.date.is_none());
    }

    #[test]
    fn decodes_known_fields() {
        let block = b"title: Testing a new page generator!\ntemplate: post\ndate: 2014-07-01 12:30:00";
        let meta = Metadata::decode(block, "page").unwrap();
        assert_eq!(meta.title, "Testing a new page generator!");
        assert_eq!(meta.template, "post");

        let date = meta.date.unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2014, 7, 1));
        assert_eq!((date.hour(), date.minute()), (12, 30));
        assert_eq!(date.to_rfc3339(), "2014-07-01T12:30:00+02:00");
    }

    #[test]
    fn winter_dates_use_standard_time() {
        let date = parse_date("2015-01-10 08:00:00").unwrap();
        assert_eq!(date.to_rfc3339(), "2015-01-10T08:00:00+01:00");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let meta = Metadata::decode(b"title: Hi\ntags: [a, b]\nauthor: someone", "page").unwrap();
        assert_eq!(meta.title, "Hi");
        assert_eq!(meta.template, "page");
    }

    #[test]
    fn template_name_alias() {
        let meta = Metadata::decode(b"templateName: landing", "page").unwrap();
        assert_eq!(meta.template, "landing");
    }

    #[test]
    fn missing_date_is_not_an_error() {
        let meta = Metadata::decode(b"title: No date", "page").unwrap();
        assert!(meta.date.is_none());
    }

    #[test]
    fn bad_date_is_an_error() {
        let error = Metadata::decode(b"title: x\ndate: yesterday", "page").unwrap_err();
        assert!(error.to_string().contains("bad timestamp"));

        assert!(Metadata::decode(b"date: 2014-07-01", "page").is_err());
        assert!(parse_date("2014-13-01 00:00:00").is_err());
    }

    #[test]
    fn dates_in_dst_gap_are_rejected() {
        assert!(parse_date("2015-03-29 02:30:00").is_err());
        assert!(parse_date("2015-10-25 02:30:00").is_ok());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(Metadata::decode(b"title: [unclosed", "page").is_err());
    }
}
