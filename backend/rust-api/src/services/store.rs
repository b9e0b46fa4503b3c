use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::FindOptions, Collection, Database};

use crate::metrics::track_db_operation;
use crate::models::assessment::Assessment;
use crate::models::User;
use crate::utils::retry::{retry_async_with_config, RetryConfig};

/// Persistence gateway for users and assessments.
#[async_trait]
pub trait AssessmentStore: Send + Sync {
    async fn find_user_by_identity(&self, identity_id: &str) -> Result<Option<User>>;
    async fn insert_assessment(&self, assessment: &Assessment) -> Result<()>;
    /// All assessments owned by the user, ordered by creation time ascending.
    async fn list_assessments(&self, user_id: &str) -> Result<Vec<Assessment>>;
    async fn ping(&self) -> Result<()>;
}

pub struct MongoStore {
    mongo: Database,
}

impl MongoStore {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn users(&self) -> Collection<User> {
        self.mongo.collection("users")
    }

    fn assessments(&self) -> Collection<Assessment> {
        self.mongo.collection("assessments")
    }
}

#[async_trait]
impl AssessmentStore for MongoStore {
    async fn find_user_by_identity(&self, identity_id: &str) -> Result<Option<User>> {
        let collection = self.users();
        track_db_operation("find_one", "users", async {
            retry_async_with_config(RetryConfig::default(), || async {
                collection
                    .find_one(doc! { "identityId": identity_id })
                    .await
                    .context("Failed to query users collection")
            })
            .await
        })
        .await
    }

    async fn insert_assessment(&self, assessment: &Assessment) -> Result<()> {
        tracing::info!(
            "Saving assessment to MongoDB: user={}, score={}",
            assessment.user_id,
            assessment.quiz_score
        );

        let collection = self.assessments();
        track_db_operation("insert_one", "assessments", async {
            retry_async_with_config(RetryConfig::aggressive(), || async {
                collection
                    .insert_one(assessment)
                    .await
                    .map(|_| ())
                    .context("Failed to save assessment to MongoDB")
            })
            .await
        })
        .await?;

        tracing::info!("Assessment saved successfully with id={}", assessment.id);
        Ok(())
    }

    async fn list_assessments(&self, user_id: &str) -> Result<Vec<Assessment>> {
        let collection = self.assessments();
        let options = FindOptions::builder()
            .sort(doc! { "createdAt": 1 })
            .build();

        track_db_operation("find", "assessments", async {
            let mut cursor = collection
                .find(doc! { "userId": user_id })
                .with_options(options)
                .await
                .context("Failed to query assessments")?;

            let mut result = Vec::new();
            while let Some(assessment) = cursor
                .try_next()
                .await
                .context("Failed to iterate assessments")?
            {
                result.push(assessment);
            }
            Ok(result)
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.mongo
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }
}
