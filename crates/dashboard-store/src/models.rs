use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StoreError;

/// Implements `as_str`, `Display` and a validating `FromStr` for a text enum
macro_rules! text_enum {
    ($ty:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = StoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(StoreError::Validation(format!(
                        "Invalid {}: '{}' (expected one of: {})",
                        $field,
                        other,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TriggerType {
    Price,
    News,
    AiRecommendation,
}

text_enum!(TriggerType, "trigger_type", {
    Price => "price",
    News => "news",
    AiRecommendation => "ai_recommendation",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum NotificationChannel {
    Whatsapp,
    Email,
    Sms,
}

text_enum!(NotificationChannel, "notification_channel", {
    Whatsapp => "whatsapp",
    Email => "email",
    Sms => "sms",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AlertStatus {
    Active,
    Triggered,
    Inactive,
}

text_enum!(AlertStatus, "status", {
    Active => "active",
    Triggered => "triggered",
    Inactive => "inactive",
});

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip)]
    pub settings: Option<String>,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Stock {
    pub id: i64,
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Alert joined with its stock symbol
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Alert {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub stock_symbol: String,
    pub trigger_type: TriggerType,
    pub trigger_value: String,
    pub notification_channel: NotificationChannel,
    pub webhook_url: Option<String>,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub triggered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewAlert {
    pub stock_symbol: String,
    pub stock_name: Option<String>,
    pub trigger_type: TriggerType,
    pub trigger_value: String,
    pub notification_channel: NotificationChannel,
    pub webhook_url: Option<String>,
}

/// Fields left as `None` keep their stored value.
///
/// `webhook_url: Some(None)` (or a blank URL) clears the alert's webhook.
#[derive(Debug, Clone, Default)]
pub struct AlertUpdate {
    pub trigger_value: Option<String>,
    pub notification_channel: Option<NotificationChannel>,
    pub webhook_url: Option<Option<String>>,
    pub status: Option<AlertStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomList {
    pub id: i64,
    #[serde(skip)]
    pub user_id: i64,
    pub name: String,
    pub stocks: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user preferences stored as JSON on the user row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub theme: String,
    pub default_index: String,
    pub notification_preferences: NotificationPreferences,
    pub ai_settings: AiSettings,
    pub display_preferences: DisplayPreferences,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            default_index: "Nifty50".to_string(),
            notification_preferences: NotificationPreferences::default(),
            ai_settings: AiSettings::default(),
            display_preferences: DisplayPreferences::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub email: bool,
    pub whatsapp: bool,
    pub sms: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            email: true,
            whatsapp: false,
            sms: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub recommendation_count: u32,
    pub risk_tolerance: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            recommendation_count: 5,
            risk_tolerance: "moderate".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPreferences {
    pub currency_format: String,
    pub number_format: String,
    pub chart_type: String,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            currency_format: "INR".to_string(),
            number_format: "indian".to_string(),
            chart_type: "candlestick".to_string(),
        }
    }
}
