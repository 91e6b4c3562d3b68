use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

/// Display language for labels returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

/// Translatable labels surfaced in status views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKey {
    Pending,
    Approved,
    Rejected,
    Active,
    Suspended,
    Expired,
    Revoked,
    MeetsRequirements,
    DoesNotMeetRequirements,
}

impl Locale {
    /// Parse a BCP 47 style tag; only the primary language subtag is considered.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Locale::En),
            "ar" => Some(Locale::Ar),
            _ => None,
        }
    }

    /// First supported language in `Accept-Language`, else `fallback`.
    pub fn from_headers(headers: &HeaderMap, fallback: Locale) -> Self {
        headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| {
                raw.split(',')
                    .map(|entry| entry.split(';').next().unwrap_or_default())
                    .find_map(Locale::from_tag)
            })
            .unwrap_or(fallback)
    }

    pub const fn text(self, key: MessageKey) -> &'static str {
        match self {
            Locale::En => match key {
                MessageKey::Pending => "Pending",
                MessageKey::Approved => "Approved",
                MessageKey::Rejected => "Rejected",
                MessageKey::Active => "Active",
                MessageKey::Suspended => "Suspended",
                MessageKey::Expired => "Expired",
                MessageKey::Revoked => "Revoked",
                MessageKey::MeetsRequirements => "Meets requirements",
                MessageKey::DoesNotMeetRequirements => "Does not meet requirements",
            },
            Locale::Ar => match key {
                MessageKey::Pending => "قيد المراجعة",
                MessageKey::Approved => "مقبول",
                MessageKey::Rejected => "مرفوض",
                MessageKey::Active => "نشط",
                MessageKey::Suspended => "موقوف",
                MessageKey::Expired => "منتهي",
                MessageKey::Revoked => "ملغى",
                MessageKey::MeetsRequirements => "يستوفي المتطلبات",
                MessageKey::DoesNotMeetRequirements => "لا يستوفي المتطلبات",
            },
        }
    }
}
