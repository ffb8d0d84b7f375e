use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::SharedError;

/// Billing cycle of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Short price suffix used by presenters (`/mo`, `/yr`).
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Monthly => "/mo",
            Self::Yearly => "/yr",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring subscription as held in memory, in the local cache and inside
/// an encrypted envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Opaque unique token, assigned once at creation.
    pub id: String,
    pub name: String,
    /// Older documents carry the raw form value, so strings are accepted too.
    #[serde(deserialize_with = "deserialize_amount")]
    pub amount: f64,
    pub frequency: Frequency,
    pub renewal_date: NaiveDate,
    pub date_added: DateTime<Utc>,
}

impl Subscription {
    /// Case-insensitive name comparison used for duplicate detection.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Number(f64),
        Text(String),
    }

    match RawAmount::deserialize(deserializer)? {
        RawAmount::Number(n) => Ok(n),
        RawAmount::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

/// User input for a subscription that does not exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubscription {
    pub name: String,
    pub amount: f64,
    pub frequency: Frequency,
    pub renewal_date: NaiveDate,
}

impl NewSubscription {
    /// Validate the input and mint a record with a fresh id.
    pub fn into_record(self, now: DateTime<Utc>) -> Result<Subscription, SharedError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(SharedError::InvalidSubscription("name is empty".into()));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(SharedError::InvalidSubscription(format!(
                "amount must be a non-negative number, got {}",
                self.amount
            )));
        }

        Ok(Subscription {
            id: Uuid::new_v4().to_string(),
            name,
            amount: self.amount,
            frequency: self.frequency,
            renewal_date: self.renewal_date,
            date_added: now,
        })
    }
}

/// Encrypted-at-rest wire representation of a subscription. The id mirrors
/// the record id and is the remote document key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub id: String,
    pub ciphertext: String,
    pub updated_at: DateTime<Utc>,
}

/// A document as read back from the remote store.
///
/// Documents written before encryption was introduced hold the plain record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteDocument {
    Encrypted(Envelope),
    Legacy(Subscription),
}

impl RemoteDocument {
    pub fn id(&self) -> &str {
        match self {
            Self::Encrypted(envelope) => &envelope.id,
            Self::Legacy(record) => &record.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn renewal() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn test_new_subscription_trims_and_assigns_id() {
        let record = NewSubscription {
            name: "  Netflix  ".into(),
            amount: 15.49,
            frequency: Frequency::Monthly,
            renewal_date: renewal(),
        }
        .into_record(Utc::now())
        .unwrap();

        assert_eq!(record.name, "Netflix");
        assert!(!record.id.is_empty());
    }

    #[test]
    fn test_rejects_blank_name_and_negative_amount() {
        let blank = NewSubscription {
            name: "   ".into(),
            amount: 1.0,
            frequency: Frequency::Monthly,
            renewal_date: renewal(),
        };
        assert!(matches!(
            blank.into_record(Utc::now()),
            Err(SharedError::InvalidSubscription(_))
        ));

        let negative = NewSubscription {
            name: "Gym".into(),
            amount: -3.0,
            frequency: Frequency::Monthly,
            renewal_date: renewal(),
        };
        assert!(negative.into_record(Utc::now()).is_err());

        let nan = NewSubscription {
            name: "Gym".into(),
            amount: f64::NAN,
            frequency: Frequency::Monthly,
            renewal_date: renewal(),
        };
        assert!(nan.into_record(Utc::now()).is_err());
    }

    #[test]
    fn test_has_name_ignores_case() {
        let record = NewSubscription {
            name: "Spotify Premium".into(),
            amount: 11.99,
            frequency: Frequency::Monthly,
            renewal_date: renewal(),
        }
        .into_record(Utc::now())
        .unwrap();

        assert!(record.has_name("spotify premium"));
        assert!(record.has_name("SPOTIFY PREMIUM "));
        assert!(!record.has_name("Spotify"));
    }

    #[test]
    fn test_amount_accepts_string_form_value() {
        let record: Subscription = serde_json::from_value(json!({
            "id": "17000000000abc",
            "name": "Hulu",
            "amount": "17.99",
            "frequency": "monthly",
            "renewalDate": "2025-04-12",
            "dateAdded": "2024-11-02T10:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(record.amount, 17.99);
        assert_eq!(record.frequency, Frequency::Monthly);
    }

    #[test]
    fn test_remote_document_shapes() {
        let encrypted: RemoteDocument = serde_json::from_value(json!({
            "id": "a",
            "ciphertext": "b64",
            "updatedAt": "2024-11-02T10:00:00Z"
        }))
        .unwrap();
        assert!(matches!(encrypted, RemoteDocument::Encrypted(_)));

        let legacy: RemoteDocument = serde_json::from_value(json!({
            "id": "b",
            "name": "Tidal",
            "amount": 10.99,
            "frequency": "monthly",
            "renewalDate": "2025-01-01",
            "dateAdded": "2024-11-02T10:00:00Z"
        }))
        .unwrap();
        assert!(matches!(legacy, RemoteDocument::Legacy(_)));
        assert_eq!(legacy.id(), "b");
    }
}
