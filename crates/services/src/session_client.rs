//! Single entry point for authentication and content operations.
//!
//! Built once at startup and shared by `Arc`. Recovery policy per operation:
//! - auth operations propagate gateway errors unchanged;
//! - stats and missed questions recover to empty defaults;
//! - question generation recovers with bundled samples only for unauthenticated callers;
//! - logout always completes locally.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use reasoning_core::fallback;
use reasoning_core::model::{
    AnswerSubmission, AuthSession, Difficulty, GradingResult, ProgressStats, Question,
    QuestionCategory, User,
};
use storage::repository::KeyValueStore;

use crate::error::ApiError;
use crate::gateway::RequestGateway;
use crate::token_store::TokenStore;
use crate::transport::HttpTransport;

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    user: User,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    category: QuestionCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    difficulty: Option<Difficulty>,
}

pub struct SessionClient {
    gateway: RequestGateway,
    tokens: Arc<TokenStore>,
    user: RwLock<Option<User>>,
    stats: RwLock<Option<ProgressStats>>,
}

impl SessionClient {
    /// Build the client and load the persisted credential.
    pub async fn init(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let tokens = Arc::new(TokenStore::new(store));
        let restored = tokens.load().await.is_some();
        tracing::info!(restored, "session client initialised");
        Self {
            gateway: RequestGateway::new(base_url, transport, Arc::clone(&tokens)),
            tokens,
            user: RwLock::new(None),
            stats: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_present()
    }

    /// The signed-in user, the guest, or `None` before any sign-in.
    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.user.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Stats from the last successful or defaulted fetch, if still fresh.
    #[must_use]
    pub fn cached_stats(&self) -> Option<ProgressStats> {
        self.stats.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    //
    // ─── AUTH ──────────────────────────────────────────────────────────────────
    //

    /// Create an account and sign in.
    ///
    /// # Errors
    ///
    /// Propagates the gateway's `ApiError` unchanged.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ApiError> {
        let session: AuthSession = self
            .gateway
            .post(
                "/auth/register",
                &json!({ "username": username, "email": email, "password": password }),
            )
            .await?;
        self.establish(&session).await;
        Ok(session)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Propagates the gateway's `ApiError` unchanged.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let session: AuthSession = self
            .gateway
            .post("/auth/login", &json!({ "email": email, "password": password }))
            .await?;
        self.establish(&session).await;
        Ok(session)
    }

    /// Continue without an account. Any stored credential is dropped.
    pub async fn enter_as_guest(&self) -> User {
        if self.tokens.is_present() {
            self.tokens.clear().await;
        }
        let guest = User::guest();
        self.set_user(Some(guest.clone()));
        self.set_stats(None);
        guest
    }

    /// Best-effort server logout; the device always ends up signed out.
    pub async fn logout(&self) {
        if self.tokens.is_present() {
            if let Err(err) = self.gateway.post::<_, Value>("/auth/logout", &json!({})).await {
                tracing::warn!(error = %err, "server logout failed, clearing local session anyway");
            }
        }
        self.tokens.clear().await;
        self.set_user(None);
        self.set_stats(None);
    }

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Propagates the gateway's `ApiError`; a 401 has already cleared the credential.
    pub async fn get_profile(&self) -> Result<User, ApiError> {
        let profile: ProfileResponse = self.gateway.get("/auth/profile").await?;
        self.set_user(Some(profile.user.clone()));
        Ok(profile.user)
    }

    /// Change username and email.
    ///
    /// # Errors
    ///
    /// Propagates the gateway's `ApiError` unchanged.
    pub async fn update_profile(&self, username: &str, email: &str) -> Result<User, ApiError> {
        let profile: ProfileResponse = self
            .gateway
            .put("/auth/profile", &json!({ "username": username, "email": email }))
            .await?;
        self.set_user(Some(profile.user.clone()));
        Ok(profile.user)
    }

    /// # Errors
    ///
    /// Propagates the gateway's `ApiError` unchanged.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let _: Value = self
            .gateway
            .put(
                "/auth/password",
                &json!({ "currentPassword": current_password, "newPassword": new_password }),
            )
            .await?;
        Ok(())
    }

    /// Verify the stored credential against the backend.
    ///
    /// Any failure, not only a 401, invalidates the session.
    pub async fn check_auth_status(&self) -> bool {
        if !self.tokens.is_present() {
            return false;
        }
        match self.get_profile().await {
            Ok(_) => true,
            Err(err) => {
                tracing::info!(error = %err, "stored session could not be verified");
                if self.tokens.is_present() {
                    self.tokens.clear().await;
                }
                self.set_user(None);
                false
            }
        }
    }

    //
    // ─── CONTENT ───────────────────────────────────────────────────────────────
    //

    /// Generate a question, falling back to a bundled sample for unauthenticated callers.
    ///
    /// Authentication is checked after the failure, so a 401 (which clears the
    /// credential) also degrades to the sample.
    ///
    /// # Errors
    ///
    /// Returns the gateway's `ApiError` only when the caller is still authenticated.
    pub async fn generate_question(
        &self,
        category: QuestionCategory,
        difficulty: Option<Difficulty>,
    ) -> Result<Question, ApiError> {
        let body = GenerateRequest {
            category,
            difficulty,
        };

        match self.gateway.post("/questions/generate", &body).await {
            Ok(question) => Ok(question),
            Err(err) if !self.is_authenticated() => {
                tracing::info!(%category, error = %err, "serving bundled sample question");
                Ok(fallback::sample_question(category))
            }
            Err(err) => Err(err),
        }
    }

    /// Grade an answer.
    ///
    /// Bundled sample questions are unknown to the backend and are graded on-device.
    ///
    /// # Errors
    ///
    /// Propagates the gateway's `ApiError` unchanged.
    pub async fn submit_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<GradingResult, ApiError> {
        if let Some(sample) = fallback::find_sample(&submission.question_id) {
            return Ok(fallback::grade_locally(&sample, &submission.user_answer));
        }

        let result = self.gateway.post("/questions/answer", submission).await?;
        self.set_stats(None);
        Ok(result)
    }

    /// Fetch progress stats; failures yield the all-zero record.
    pub async fn get_user_stats(&self) -> ProgressStats {
        let stats = match self.gateway.get("/questions/stats").await {
            Ok(stats) => stats,
            Err(err) => {
                tracing::info!(error = %err, "stats unavailable, showing defaults");
                ProgressStats::default()
            }
        };
        self.set_stats(Some(stats.clone()));
        stats
    }

    /// Fetch previously missed questions; failures yield an empty list.
    pub async fn get_missed_questions(&self) -> Vec<Question> {
        match self.gateway.get("/questions/missed").await {
            Ok(questions) => questions,
            Err(err) => {
                tracing::info!(error = %err, "missed questions unavailable");
                Vec::new()
            }
        }
    }

    async fn establish(&self, session: &AuthSession) {
        self.tokens.save(session.credential.clone()).await;
        self.set_user(Some(session.user.clone()));
        self.set_stats(None);
    }

    fn set_user(&self, user: Option<User>) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = user;
    }

    fn set_stats(&self, stats: Option<ProgressStats>) {
        *self.stats.write().unwrap_or_else(PoisonError::into_inner) = stats;
    }
}
