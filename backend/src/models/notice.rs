use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A posted notice. `expires_at` is echoed back exactly as submitted; the
/// parsed instant drives expiry and is never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
    pub date: String,
    pub expires_at: String,
    #[serde(skip)]
    expires: DateTime<Utc>,
}

impl Notice {
    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    /// Active iff the expiry instant is strictly after `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }
}

/// Body for POST /notices. Every field is optional here so that missing
/// fields can be reported together instead of failing on the first one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateNoticeRequest {
    pub title: Option<String>,
    pub message: Option<String>,
    pub date: Option<String>,
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("Title must not be blank")]
    BlankTitle,
    #[error("Invalid expires_at timestamp: {0:?}")]
    InvalidExpiry(String),
}

impl ValidationError {
    /// Short label used for the rejection metric.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingFields(_) => "missing_fields",
            Self::BlankTitle => "blank_title",
            Self::InvalidExpiry(_) => "invalid_expiry",
        }
    }
}

impl TryFrom<CreateNoticeRequest> for Notice {
    type Error = ValidationError;

    fn try_from(req: CreateNoticeRequest) -> Result<Self, Self::Error> {
        let CreateNoticeRequest {
            title,
            message,
            date,
            expires_at,
        } = req;

        let (Some(title), Some(message), Some(date), Some(expires_at)) =
            (title.as_ref(), message.as_ref(), date.as_ref(), expires_at.as_ref())
        else {
            let missing = [
                ("title", title.is_none()),
                ("message", message.is_none()),
                ("date", date.is_none()),
                ("expires_at", expires_at.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect();
            return Err(ValidationError::MissingFields(missing));
        };

        if title.trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }

        let expires = parse_timestamp(expires_at)
            .ok_or_else(|| ValidationError::InvalidExpiry(expires_at.clone()))?;

        Ok(Self {
            title: title.clone(),
            message: message.clone(),
            date: date.clone(),
            expires_at: expires_at.clone(),
            expires,
        })
    }
}

// Offsets without seconds, which RFC 3339 does not allow.
const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an `expires_at` value.
///
/// - RFC 3339 with an offset, or `YYYY-MM-DDTHH:MM` followed by an offset
///   or `Z`, is taken as an exact instant.
/// - A naive date-time (what a `datetime-local` input sends) is read in the
///   server's local time zone.
/// - A bare `YYYY-MM-DD` means local midnight at the start of that day.
///
/// Returns `None` for anything else, including local times skipped by a
/// DST transition.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let zulu = raw
        .strip_suffix('Z')
        .or_else(|| raw.strip_suffix('z'))
        .map(|head| format!("{head}+00:00"));
    let with_offset = zulu.as_deref().unwrap_or(raw);
    if let Some(dt) = OFFSET_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(with_offset, fmt).ok())
    {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
