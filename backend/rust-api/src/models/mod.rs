use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User model stored in MongoDB "users" collection.
///
/// Accounts are provisioned by the external auth/onboarding flow; this
/// service only reads them to parameterize prompts and to own assessments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    /// Subject claim of the external identity provider.
    #[serde(rename = "identityId")]
    pub identity_id: String,
    pub email: String,
    pub name: String,
    pub industry: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            industry: self.industry.clone(),
            skills: self.skills.clone(),
        }
    }
}

/// The slice of a user that prompt construction needs.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub industry: String,
    pub skills: Vec<String>,
}

// Serde converters for chrono::DateTime <-> mongodb::bson::DateTime
pub mod bson_datetime_as_chrono {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bson_dt = bson::DateTime::from_millis(date.timestamp_millis());
        bson_dt.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bson_dt = bson::DateTime::deserialize(deserializer)?;
        Ok(DateTime::from_timestamp_millis(bson_dt.timestamp_millis()).unwrap())
    }
}

pub mod assessment;
