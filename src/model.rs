use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar month. Serialised as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Construction guarantees the month is valid.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(&self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or_default()
    }

    /// Canonical join key, e.g. `2025-01`.
    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = String;

    /// Accepts `2025-01`, `2025-01-15`, `Jan 2025` and `January 2025`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err("empty period identifier".to_string());
        }

        let parsed = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d"))
            .or_else(|_| NaiveDate::parse_from_str(&format!("01 {trimmed}"), "%d %b %Y"))
            .or_else(|_| NaiveDate::parse_from_str(&format!("01 {trimmed}"), "%d %B %Y"));

        parsed
            .map(Period::from_date)
            .map_err(|_| format!("invalid period identifier '{trimmed}'"))
    }
}

impl TryFrom<String> for Period {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.key()
    }
}

/// Support level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Primary,
    Secondary,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Primary, Tier::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "primary" | "fls" | "l1" => Some(Tier::Primary),
            "secondary" | "sls" | "l2" => Some(Tier::Secondary),
            _ => None,
        }
    }

    /// Assigns an event's team label to a tier. Labels containing any of the
    /// secondary markers (case-insensitive) are secondary, everything else is
    /// primary.
    pub fn classify(label: &str, secondary_markers: &[String]) -> Self {
        let label = label.to_ascii_lowercase();
        let is_secondary = secondary_markers
            .iter()
            .filter(|marker| !marker.trim().is_empty())
            .any(|marker| label.contains(&marker.trim().to_ascii_lowercase()));
        if is_secondary {
            Tier::Secondary
        } else {
            Tier::Primary
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Chat,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Email, Channel::Chat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Chat => "chat",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per tier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerTier<T> {
    pub primary: T,
    pub secondary: T,
}

impl<T> PerTier<T> {
    pub fn new(primary: T, secondary: T) -> Self {
        Self { primary, secondary }
    }

    pub fn get(&self, tier: Tier) -> &T {
        match tier {
            Tier::Primary => &self.primary,
            Tier::Secondary => &self.secondary,
        }
    }

    pub fn get_mut(&mut self, tier: Tier) -> &mut T {
        match tier {
            Tier::Primary => &mut self.primary,
            Tier::Secondary => &mut self.secondary,
        }
    }
}

/// One value per channel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelPair<T> {
    pub email: T,
    pub chat: T,
}

impl<T> ChannelPair<T> {
    pub fn new(email: T, chat: T) -> Self {
        Self { email, chat }
    }

    pub fn get(&self, channel: Channel) -> &T {
        match channel {
            Channel::Email => &self.email,
            Channel::Chat => &self.chat,
        }
    }
}
