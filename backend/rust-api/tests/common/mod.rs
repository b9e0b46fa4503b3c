#![allow(dead_code)]

use anyhow::anyhow;
use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use careercoach_api::{
    config::Config,
    create_router,
    middlewares::auth::{JwtClaims, JwtService},
    models::{assessment::Assessment, User},
    services::{provider::CompletionProvider, store::AssessmentStore, AppState},
};

pub const TEST_IDENTITY: &str = "test-identity";
pub const TEST_SECRET: &str = "test-secret";

/// Completion provider fed from a fixed script of replies. Counts calls so
/// tests can assert the retry bound and the no-call guarantees.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<String, String>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(vec![])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("provider called but not scripted")),
        }
    }
}

/// In-memory store standing in for MongoDB. `set_ping_failure` simulates a
/// lost database connection for health-check tests.
#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<Vec<User>>,
    assessments: Mutex<Vec<Assessment>>,
    fail_ping: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn assessment_count(&self) -> usize {
        self.assessments.lock().unwrap().len()
    }

    pub fn set_ping_failure(&self, fail: bool) {
        self.fail_ping.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AssessmentStore for InMemoryStore {
    async fn find_user_by_identity(&self, identity_id: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.identity_id == identity_id)
            .cloned())
    }

    async fn insert_assessment(&self, assessment: &Assessment) -> anyhow::Result<()> {
        self.assessments.lock().unwrap().push(assessment.clone());
        Ok(())
    }

    async fn list_assessments(&self, user_id: &str) -> anyhow::Result<Vec<Assessment>> {
        let mut result: Vec<Assessment> = self
            .assessments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by_key(|a| a.created_at);
        Ok(result)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        if self.fail_ping.load(Ordering::SeqCst) {
            Err(anyhow!("store unreachable"))
        } else {
            Ok(())
        }
    }
}

pub fn test_config() -> Config {
    Config {
        mongo_uri: "mongodb://localhost:27017/test".to_string(),
        mongo_database: "test".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        gemini_api_url: "http://localhost:1".to_string(),
        gemini_api_key: "unused".to_string(),
        gemini_model: "gemini-2.5-flash-lite".to_string(),
        provider_timeout_secs: 1,
    }
}

pub fn test_user() -> User {
    User {
        id: "user-1".to_string(),
        identity_id: TEST_IDENTITY.to_string(),
        email: "dev@example.com".to_string(),
        name: "Dev".to_string(),
        industry: "Software Engineering".to_string(),
        skills: vec!["Rust".to_string(), "Distributed systems".to_string()],
        created_at: Utc::now(),
    }
}

/// Build the full router over in-process fakes, seeded with one user.
pub fn create_test_app(
    store: Arc<InMemoryStore>,
    provider: Arc<ScriptedProvider>,
) -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    store.seed_user(test_user());

    let state = AppState::with_collaborators(test_config(), store, provider);
    create_router(Arc::new(state))
}

pub fn bearer_token(identity: &str) -> String {
    let service = JwtService::new(TEST_SECRET);
    let token = service
        .generate_token(JwtClaims {
            sub: identity.to_string(),
            exp: (Utc::now().timestamp() + 3600) as usize,
            iat: Utc::now().timestamp() as usize,
        })
        .unwrap();
    format!("Bearer {}", token)
}

/// A syntactically valid quiz payload with `count` questions. Every
/// question's correct answer is "Option B".
pub fn quiz_json(count: usize) -> String {
    let questions: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            json!({
                "question": format!("What does concept {} mean?", i),
                "options": ["Option A", "Option B", "Option C", "Option D"],
                "correctAnswer": "Option B",
                "explanation": format!("Explanation for concept {}.", i)
            })
        })
        .collect();
    json!({ "questions": questions }).to_string()
}

/// Submission body for a quiz produced by `quiz_json(count)`, answering
/// `wrong` of the questions incorrectly.
pub fn submission_body(count: usize, wrong: usize) -> serde_json::Value {
    let quiz: serde_json::Value = serde_json::from_str(&quiz_json(count)).unwrap();
    let answers: Vec<String> = (0..count)
        .map(|i| {
            if i < wrong {
                "Option C".to_string()
            } else {
                "Option B".to_string()
            }
        })
        .collect();
    json!({
        "questions": quiz["questions"],
        "answers": answers
    })
}
