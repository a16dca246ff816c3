use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Preferred streaming bitrate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Quality {
    Kbps12,
    Kbps48,
    Kbps96,
    Kbps160,
    #[default]
    Kbps320,
}

pub const ALL_QUALITIES: &[Quality] = &[
    Quality::Kbps12,
    Quality::Kbps48,
    Quality::Kbps96,
    Quality::Kbps160,
    Quality::Kbps320,
];

#[derive(Debug, Error)]
#[error("unknown quality '{0}', expected one of 12kbps, 48kbps, 96kbps, 160kbps, 320kbps")]
pub struct UnknownQuality(pub String);

impl Quality {
    pub fn bitrate(self) -> u32 {
        match self {
            Quality::Kbps12 => 12,
            Quality::Kbps48 => 48,
            Quality::Kbps96 => 96,
            Quality::Kbps160 => 160,
            Quality::Kbps320 => 320,
        }
    }
}

/// Reads the leading integer of a quality tag such as "160kbps".
///
/// Tags without a leading number map to 0.
pub fn parse_bitrate(tag: &str) -> u32 {
    let digits: String = tag
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

impl Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}kbps", self.bitrate())
    }
}

impl FromStr for Quality {
    type Err = UnknownQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bitrate = parse_bitrate(s);
        ALL_QUALITIES
            .iter()
            .copied()
            .find(|q| q.bitrate() == bitrate)
            .ok_or_else(|| UnknownQuality(s.to_string()))
    }
}

impl TryFrom<String> for Quality {
    type Error = UnknownQuality;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Quality> for String {
    fn from(value: Quality) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quality() {
        assert_eq!("320kbps".parse::<Quality>().unwrap(), Quality::Kbps320);
        assert_eq!("12kbps".parse::<Quality>().unwrap(), Quality::Kbps12);
        assert_eq!("96".parse::<Quality>().unwrap(), Quality::Kbps96);
        assert!("64kbps".parse::<Quality>().is_err());
        assert!("high".parse::<Quality>().is_err());
    }

    #[test]
    fn test_parse_bitrate() {
        assert_eq!(parse_bitrate("160kbps"), 160);
        assert_eq!(parse_bitrate(" 48kbps"), 48);
        assert_eq!(parse_bitrate("lossless"), 0);
        assert_eq!(parse_bitrate(""), 0);
    }

    #[test]
    fn test_quality_serde_as_string() -> anyhow::Result<()> {
        let json = serde_json::to_string(&Quality::Kbps160)?;
        assert_eq!(json, "\"160kbps\"");
        let back: Quality = serde_json::from_str(&json)?;
        assert_eq!(back, Quality::Kbps160);
        assert!(serde_json::from_str::<Quality>("\"7kbps\"").is_err());
        Ok(())
    }
}
