//! Timezone offsets
//!
//! Timezones are not part of the conversion graph: converting between them
//! adds the offset difference instead of multiplying. Ambiguous abbreviations
//! carry a qualifier in their key (`china_cst`, `central_cst`), typed by the
//! user as `China CST`.

use serde::Serialize;
use crate::error::ConversionError;
use crate::suggest;

/// A fixed-offset timezone
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Timezone {
    pub key: &'static str,
    pub name: &'static str,
    /// Hours east of UTC
    pub offset: f64,
}

macro_rules! tz {
    ($key:literal, $name:literal, $offset:expr) => {
        Timezone { key: $key, name: $name, offset: $offset as f64 }
    };
}

pub static TIMEZONES: &[Timezone] = &[
    // North America
    tz!("pst", "Pacific Standard Time", -8),
    tz!("pdt", "Pacific Daylight Time", -7),
    tz!("mst", "Mountain Standard Time", -7),
    tz!("mdt", "Mountain Daylight Time", -6),
    tz!("cdt", "Central Daylight Time", -5),
    tz!("est", "Eastern Standard Time", -5),
    tz!("edt", "Eastern Daylight Time", -4),
    tz!("akst", "Alaska Standard Time", -9),
    tz!("akdt", "Alaska Daylight Time", -8),
    tz!("hst", "Hawaii Standard Time", -10),

    // CST
    tz!("central_cst", "Central Standard Time", -6),
    tz!("china_cst", "China Standard Time", 8),
    tz!("cuba_cst", "Cuba Standard Time", -5),

    // Europe
    tz!("gmt", "Greenwich Mean Time", 0),
    tz!("utc", "Coordinated Universal Time", 0),
    tz!("wet", "Western European Time", 0),
    tz!("west", "Western European Summer Time", 1),
    tz!("cet", "Central European Time", 1),
    tz!("cest", "Central European Summer Time", 2),
    tz!("eet", "Eastern European Time", 2),
    tz!("eest", "Eastern European Summer Time", 3),
    tz!("msk", "Moscow Time", 3),

    // BST
    tz!("british_bst", "British Summer Time", 1),
    tz!("bangladesh_bst", "Bangladesh Standard Time", 6),

    // IST
    tz!("indian_ist", "Indian Standard Time", 5.5),
    tz!("irish_ist", "Irish Standard Time", 1),
    tz!("israel_ist", "Israel Standard Time", 2),

    // Asia/Pacific
    tz!("jst", "Japan Standard Time", 9),
    tz!("kst", "Korea Standard Time", 9),
    tz!("hkt", "Hong Kong Time", 8),
    tz!("sgt", "Singapore Time", 8),
    tz!("pht", "Philippine Time", 8),
    tz!("wib", "Western Indonesian Time", 7),
    tz!("wita", "Central Indonesian Time", 8),
    tz!("wit", "Eastern Indonesian Time", 9),
    tz!("ict", "Indochina Time", 7),
    tz!("npt", "Nepal Time", 5.75),
    tz!("pkt", "Pakistan Standard Time", 5),

    // Australia/NZ
    tz!("aest", "Australian Eastern Standard Time", 10),
    tz!("aedt", "Australian Eastern Daylight Time", 11),
    tz!("acst", "Australian Central Standard Time", 9.5),
    tz!("acdt", "Australian Central Daylight Time", 10.5),
    tz!("awst", "Australian Western Standard Time", 8),
    tz!("nzst", "New Zealand Standard Time", 12),
    tz!("nzdt", "New Zealand Daylight Time", 13),

    // Other
    tz!("ast", "Atlantic Standard Time", -4),
    tz!("adt", "Atlantic Daylight Time", -3),
    tz!("nst", "Newfoundland Standard Time", -3.5),
    tz!("ndt", "Newfoundland Daylight Time", -2.5),
    tz!("art", "Argentina Time", -3),
    tz!("brt", "Brasilia Time", -3),
    tz!("cat", "Central Africa Time", 2),
    tz!("eat", "East Africa Time", 3),
    tz!("wat", "West Africa Time", 1),
    tz!("sast", "South African Standard Time", 2),
    tz!("gulf_gst", "Gulf Standard Time", 4),
    tz!("aft", "Afghanistan Time", 4.5),
    tz!("irst", "Iran Standard Time", 3.5),
    tz!("irdt", "Iran Daylight Time", 4.5),
    tz!("akt", "Arabia Standard Time", 3),
    tz!("uzt", "Uzbekistan Time", 5),
    tz!("get", "Georgia Standard Time", 4),
    tz!("amt", "Armenia Time", 4),
    tz!("azt", "Azerbaijan Time", 4),
    tz!("fjt", "Fiji Time", 12),
    tz!("tot", "Tonga Time", 13),
    tz!("sst", "Samoa Standard Time", -11),
    tz!("chst", "Chamorro Standard Time", 10),
    tz!("wst", "Western Standard Time", 8),
];

/// Listed when no search term is given (common world-clock cities)
pub const TOP_TIMEZONES: [&str; 9] = ["est", "pst", "gmt", "cet", "gulf_gst", "indian_ist", "hkt", "jst", "aest"];

/// `China CST` -> `china_cst`
pub fn normalize_key(input: &str) -> String {
    input.trim().to_lowercase().replace([' ', '-'], "_")
}

pub fn lookup(input: &str) -> Option<&'static Timezone> {
    let key = normalize_key(input);
    TIMEZONES.iter().find(|tz| tz.key == key)
}

pub fn is_timezone(input: &str) -> bool {
    lookup(input).is_some()
}

impl Timezone {
    /// Abbreviation only: `china_cst` -> `CST`
    pub fn display_abbrev(&self) -> String {
        self.key.rsplit('_').next().unwrap_or(self.key).to_uppercase()
    }

    /// What the user types: `china_cst` -> `China CST`
    pub fn input_format(&self) -> String {
        match self.key.rsplit_once('_') {
            Some((qualifier, abbrev)) => {
                let qualifier: Vec<String> = qualifier.split('_').map(title_case).collect();
                format!("{} {}", qualifier.join(" "), abbrev.to_uppercase())
            }
            None => self.key.to_uppercase(),
        }
    }

    /// `Indian Standard Time (UTC+05:30)`
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, format_utc_offset(self.offset))
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// `UTC+05:30` when there are minutes, `UTC-8` otherwise
pub fn format_utc_offset(offset: f64) -> String {
    let sign = if offset >= 0.0 { '+' } else { '-' };
    let abs = offset.abs();
    let hours = abs.trunc() as u32;
    let minutes = ((abs - abs.trunc()) * 60.0) as u32;
    if minutes > 0 {
        format!("UTC{}{:02}:{:02}", sign, hours, minutes)
    } else {
        format!("UTC{}{}", sign, hours)
    }
}

/// Close matches for a token that is not a timezone, in input form
pub fn suggestions(input: &str) -> Vec<String> {
    let candidates: Vec<(String, String)> = TIMEZONES.iter().map(|tz| (tz.input_format(), tz.label())).collect();
    suggest::rank(input, candidates.iter().map(|(a, b)| (a.as_str(), b.as_str())))
        .into_iter()
        .map(|s| s.name)
        .collect()
}

/// Shift a clock value between timezones: `value + (to - from)`.
///
/// Both sides must be timezones; the first one that is not gets reported
/// with suggestions.
pub fn convert_timezone(from: &str, to: &str, value: f64) -> Result<f64, ConversionError> {
    let unknown = |zone: &str| ConversionError::UnknownTimezone {
        zone: zone.to_string(),
        suggestions: suggestions(zone),
    };

    let from_tz = lookup(from).ok_or_else(|| unknown(from))?;
    let to_tz = lookup(to).ok_or_else(|| unknown(to))?;

    Ok(value + (to_tz.offset - from_tz.offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("China CST"), "china_cst");
        assert_eq!(normalize_key("gulf-GST"), "gulf_gst");
        assert_eq!(normalize_key(" PST "), "pst");
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("China CST").unwrap().offset, 8.0);
        assert_eq!(lookup("NPT").unwrap().offset, 5.75);
        assert!(lookup("cst").is_none());
        assert!(is_timezone("utc"));
        assert!(!is_timezone("km"));
    }

    #[test]
    fn test_keys_unique() {
        for (i, a) in TIMEZONES.iter().enumerate() {
            assert!(TIMEZONES[i + 1..].iter().all(|b| b.key != a.key), "duplicate {}", a.key);
        }
        for key in TOP_TIMEZONES {
            assert!(lookup(key).is_some(), "top timezone {} missing", key);
        }
    }

    #[test]
    fn test_convert() {
        assert_eq!(convert_timezone("PST", "China CST", 9.0).unwrap(), 25.0);
        assert_eq!(convert_timezone("utc", "Indian IST", 0.0).unwrap(), 5.5);
        assert_eq!(convert_timezone("est", "est", 3.0).unwrap(), 3.0);
    }

    #[test]
    fn test_convert_unknown_side() {
        let err = convert_timezone("pst", "CST", 1.0).unwrap_err();
        match err {
            ConversionError::UnknownTimezone { zone, suggestions } => {
                assert_eq!(zone, "CST");
                assert!(suggestions.iter().any(|s| s == "China CST"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_format_utc_offset() {
        assert_eq!(format_utc_offset(-8.0), "UTC-8");
        assert_eq!(format_utc_offset(0.0), "UTC+0");
        assert_eq!(format_utc_offset(5.5), "UTC+05:30");
        assert_eq!(format_utc_offset(5.75), "UTC+05:45");
        assert_eq!(format_utc_offset(-3.5), "UTC-03:30");
    }

    #[test]
    fn test_display_forms() {
        let tz = lookup("china_cst").unwrap();
        assert_eq!(tz.display_abbrev(), "CST");
        assert_eq!(tz.input_format(), "China CST");
        assert_eq!(tz.label(), "China Standard Time (UTC+8)");

        let tz = lookup("jst").unwrap();
        assert_eq!(tz.display_abbrev(), "JST");
        assert_eq!(tz.input_format(), "JST");
    }
}
