use chrono::{DateTime, NaiveDate, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_PROFESSION: &str = "Fisioterapeuta";
pub const UNKNOWN_BUSINESS: &str = "Unknown Business";
pub const CLOSED_NEXT_ACTION: &str = "Closed - Not Interested";

/// Closed set of labelled values stored as their display label.
pub trait Choice: Copy + Default + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    /// Case-insensitive match with underscores treated as spaces.
    fn from_label(raw: &str) -> Option<Self> {
        let wanted = normalize(raw);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL
            .iter()
            .copied()
            .find(|c| normalize(c.label()) == wanted)
    }
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase().replace('_', " ")
}

macro_rules! choice {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl Choice for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = FlexibleType::deserialize(deserializer)?;
                Ok(raw.as_str().and_then(Self::from_label).unwrap_or_default())
            }
        }
    };
}

choice!(WebsiteStatus {
    #[default]
    No => "No",
    Weak => "Weak",
    Good => "Good",
    Broken => "Broken",
});

choice!(MapsVisibility {
    Top3 => "Top 3",
    Page1 => "Page 1",
    Page2 => "Page 2",
    Page3 => "Page 3",
    #[default]
    NotVisible => "Not visible",
});

choice!(WhoAnswered {
    Owner => "Owner",
    Gatekeeper => "Gatekeeper",
    #[default]
    NoAnswer => "No answer",
});

choice!(CallOutcome {
    #[default]
    NoAnswer => "No answer",
    Gatekeeper => "Gatekeeper",
    Interested => "Interested",
    NotNow => "Not now",
    CallLater => "Call later",
    NotInterestedHard => "Not interested hard",
    AlreadyGotSomeone => "Already got someone",
    FuturePotential => "Future potential",
    Booked => "Booked",
});

choice!(InterestLevel {
    #[default]
    Cold => "Cold",
    Warm => "Warm",
    Hot => "Hot",
});

choice!(WhatsAppSent {
    Yes => "Yes",
    #[default]
    No => "No",
});

choice!(LeadStage {
    #[default]
    New => "NEW",
    InProgress => "IN_PROGRESS",
    Closed => "CLOSED",
    Booked => "BOOKED",
});

impl LeadStage {
    pub fn is_finished(self) -> bool {
        matches!(self, LeadStage::Closed | LeadStage::Booked)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionHistoryEntry {
    #[serde(with = "timestamp", default = "Utc::now")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub outcome: CallOutcome,
    #[serde(default, deserialize_with = "text")]
    pub notes: String,
    #[serde(default, deserialize_with = "count")]
    pub attempt: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(default = "new_id", deserialize_with = "id")]
    pub id: String,
    #[serde(default, deserialize_with = "text")]
    pub business_name: String,
    #[serde(default, deserialize_with = "text")]
    pub contact_name: String,
    #[serde(default, deserialize_with = "text")]
    pub phone: String,
    #[serde(default, deserialize_with = "text")]
    pub profession: String,
    #[serde(default, deserialize_with = "text")]
    pub city: String,
    #[serde(default)]
    pub website_status: WebsiteStatus,
    #[serde(default)]
    pub maps_visibility: MapsVisibility,
    #[serde(default, deserialize_with = "count")]
    pub attempt_number: u32,
    #[serde(default)]
    pub who_answered: WhoAnswered,
    #[serde(default)]
    pub outcome: CallOutcome,
    #[serde(default)]
    pub interest_level: InterestLevel,
    #[serde(default, deserialize_with = "text")]
    pub next_action: String,
    #[serde(default, with = "blank_date")]
    pub follow_up_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "text")]
    pub follow_up_time: String,
    #[serde(default, deserialize_with = "text")]
    pub reminder_note: String,
    #[serde(rename = "whatsAppSent", default)]
    pub whatsapp_sent: WhatsAppSent,
    #[serde(default, deserialize_with = "text")]
    pub notes: String,
    #[serde(with = "timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::optional")]
    pub last_call_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lead_stage: LeadStage,
    #[serde(default, deserialize_with = "history")]
    pub action_history: Vec<ActionHistoryEntry>,
}

impl Lead {
    /// A lead that has never been called, with every field at its default.
    pub fn blank(business_name: &str, now: DateTime<Utc>) -> Lead {
        Lead {
            id: new_id(),
            business_name: business_name.trim().to_string(),
            contact_name: String::new(),
            phone: String::new(),
            profession: DEFAULT_PROFESSION.to_string(),
            city: String::new(),
            website_status: WebsiteStatus::default(),
            maps_visibility: MapsVisibility::default(),
            attempt_number: 0,
            who_answered: WhoAnswered::default(),
            outcome: CallOutcome::default(),
            interest_level: InterestLevel::default(),
            next_action: String::new(),
            follow_up_date: None,
            follow_up_time: String::new(),
            reminder_note: String::new(),
            whatsapp_sent: WhatsAppSent::default(),
            notes: String::new(),
            created_at: now,
            last_call_date: None,
            lead_stage: LeadStage::New,
            action_history: Vec::new(),
        }
    }

    /// Weak or broken website, or buried in the map results.
    pub fn needs_help(&self) -> bool {
        matches!(
            self.website_status,
            WebsiteStatus::Weak | WebsiteStatus::Broken
        ) || matches!(
            self.maps_visibility,
            MapsVisibility::Page3 | MapsVisibility::NotVisible
        )
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()[..9].to_string()
}

/// Any JSON value. Stored records come from hand-edited files and older app
/// versions, so a field of the wrong type degrades to its default.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlexibleType {
    Str(String),
    Int(i64),
    Float(f64),
    Other(IgnoredAny),
}

impl FlexibleType {
    fn as_str(&self) -> Option<&str> {
        match self {
            FlexibleType::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn into_text(self) -> String {
        match self {
            FlexibleType::Str(s) => s,
            FlexibleType::Int(n) => n.to_string(),
            FlexibleType::Float(f) => f.to_string(),
            FlexibleType::Other(_) => String::new(),
        }
    }

    fn into_count(self) -> u32 {
        match self {
            FlexibleType::Str(s) => s.trim().parse().unwrap_or_default(),
            FlexibleType::Int(n) if n < 0 => 0,
            FlexibleType::Int(n) => u32::try_from(n).unwrap_or(u32::MAX),
            // `as` saturates, NaN becomes 0
            FlexibleType::Float(f) => f as u32,
            FlexibleType::Other(_) => 0,
        }
    }
}

fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = FlexibleType::deserialize(deserializer)?.into_text();
    if raw.trim().is_empty() {
        Ok(new_id())
    } else {
        Ok(raw)
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(FlexibleType::deserialize(deserializer)?.into_text())
}

fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(FlexibleType::deserialize(deserializer)?.into_count())
}

/// Entries that are not objects are dropped; `null` means no history.
fn history<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ActionHistoryEntry>, D::Error> {
    let entries = match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(entries) => entries,
        _ => return Ok(Vec::new()),
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Millisecond RFC 3339 in UTC, the shape browsers produce for `toISOString`.
mod timestamp {
    use super::{parse_timestamp, FlexibleType};
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = FlexibleType::deserialize(deserializer)?;
        Ok(raw.as_str().and_then(parse_timestamp).unwrap_or_else(Utc::now))
    }

    pub mod optional {
        use super::super::{parse_timestamp, FlexibleType};
        use chrono::{DateTime, SecondsFormat, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => {
                    serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
                }
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = FlexibleType::deserialize(deserializer)?;
            Ok(raw.as_str().and_then(parse_timestamp))
        }
    }
}

/// `YYYY-MM-DD`, with the empty string standing for "no date".
mod blank_date {
    use super::{parse_date, FlexibleType};
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = FlexibleType::deserialize(deserializer)?;
        Ok(raw.as_str().and_then(parse_date))
    }
}
