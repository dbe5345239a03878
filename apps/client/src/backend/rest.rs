//! REST client for the hosted backend (auth API + table API).

use async_trait::async_trait;
use mathlearn_core::{
    Category, FlashcardDeck, LeaderboardEntry, Material, Profile, Quiz, Role, UserAccount,
};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    AuthSession, Backend, BackendError, ContentRecord, ContentTable, ProgressUpdate, Result,
};

const MERGE_DUPLICATES: &str = "resolution=merge-duplicates";

// === API Request/Response Types ===

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpData<'a>,
}

#[derive(Debug, Serialize)]
struct SignUpData<'a> {
    username: &'a str,
}

#[derive(Debug, Serialize)]
struct RecoverRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    user: AuthUser,
}

/// Sign-up returns a bare user when confirmation is pending, a session otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session { user: AuthUser },
    User(AuthUser),
}

#[derive(Debug, Deserialize)]
struct RoleRow {
    role: Role,
}

#[derive(Debug, Serialize)]
struct RoleAssignment {
    user_id: Uuid,
    role: Role,
}

/// Backend reached over its REST conventions.
#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl RestBackend {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Start a request carrying the API key and a bearer token
    /// (the anon key when no user token is given).
    fn request(&self, method: Method, url: &str, token: Option<&str>) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(self.anon_key.as_str()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let resp = request
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(BackendError::Backend { status, message });
        }

        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        token: Option<&str>,
    ) -> Result<Vec<T>> {
        let url = self.table_url(table);
        let request = self
            .request(Method::GET, &url, token)
            .query(&[("select", "*")])
            .query(filters);
        self.send_json(request).await
    }

    async fn fetch_role(&self, token: &str, user_id: Uuid) -> Result<Role> {
        let rows: Vec<RoleRow> = self
            .select("user_roles", &[("user_id", eq(user_id))], Some(token))
            .await?;
        Ok(rows.into_iter().next().map(|r| r.role).unwrap_or_default())
    }

    async fn account(&self, token: &str, user: AuthUser) -> Result<UserAccount> {
        let role = self.fetch_role(token, user.id).await?;
        Ok(UserAccount {
            id: user.id,
            email: user.email.unwrap_or_default(),
            role,
        })
    }
}

/// Equality filter value.
fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

fn category_filter(category: Option<&str>) -> Vec<(&'static str, String)> {
    category.map(|c| ("category", eq(c))).into_iter().collect()
}

fn record_body(record: &ContentRecord) -> Result<serde_json::Value> {
    let value = match record {
        ContentRecord::Category(c) => serde_json::to_value(c),
        ContentRecord::Material(m) => serde_json::to_value(m),
        ContentRecord::Quiz(q) => serde_json::to_value(q),
        ContentRecord::FlashcardDeck(d) => serde_json::to_value(d),
    };
    value.map_err(|e| BackendError::Parse(e.to_string()))
}

#[async_trait]
impl Backend for RestBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let url = self.auth_url("token");
        let request = self
            .request(Method::POST, &url, None)
            .query(&[("grant_type", "password")])
            .json(&PasswordGrant { email, password });
        let response: TokenResponse = self.send_json(request).await?;

        let user = self.account(&response.access_token, response.user).await?;
        Ok(AuthSession {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            user,
        })
    }

    async fn sign_up(&self, email: &str, password: &str, username: &str) -> Result<UserAccount> {
        let url = self.auth_url("signup");
        let request = self.request(Method::POST, &url, None).json(&SignUpRequest {
            email,
            password,
            data: SignUpData { username },
        });
        let user = match self.send_json(request).await? {
            SignUpResponse::Session { user } | SignUpResponse::User(user) => user,
        };

        // Role rows are created server-side; a fresh account is a student.
        Ok(UserAccount {
            id: user.id,
            email: user.email.unwrap_or_else(|| email.to_string()),
            role: Role::Student,
        })
    }

    async fn get_user(&self, token: &str) -> Result<UserAccount> {
        let url = self.auth_url("user");
        let user: AuthUser = self
            .send_json(self.request(Method::GET, &url, Some(token)))
            .await?;
        self.account(token, user).await
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        let url = self.auth_url("logout");
        self.send(self.request(Method::POST, &url, Some(token)))
            .await?;
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<()> {
        let url = self.auth_url("recover");
        let request = self
            .request(Method::POST, &url, None)
            .json(&RecoverRequest { email });
        self.send(request).await?;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.select("categories", &[("order", "name.asc".into())], None)
            .await
    }

    async fn list_materials(&self, category: Option<&str>) -> Result<Vec<Material>> {
        self.select("materials", &category_filter(category), None)
            .await
    }

    async fn list_quizzes(&self, category: Option<&str>) -> Result<Vec<Quiz>> {
        self.select("quizzes", &category_filter(category), None)
            .await
    }

    async fn get_quiz(&self, id: Uuid) -> Result<Option<Quiz>> {
        let rows: Vec<Quiz> = self.select("quizzes", &[("id", eq(id))], None).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_flashcard_decks(&self, category: Option<&str>) -> Result<Vec<FlashcardDeck>> {
        self.select("flashcard_decks", &category_filter(category), None)
            .await
    }

    async fn get_flashcard_deck(&self, id: Uuid) -> Result<Option<FlashcardDeck>> {
        let rows: Vec<FlashcardDeck> = self
            .select("flashcard_decks", &[("id", eq(id))], None)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let rows: Vec<Profile> = self
            .select("profiles", &[("id", eq(user_id))], None)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn update_profile_progress(
        &self,
        token: &str,
        user_id: Uuid,
        update: &ProgressUpdate,
    ) -> Result<()> {
        let url = self.table_url("profiles");
        let request = self
            .request(Method::PATCH, &url, Some(token))
            .query(&[("id", eq(user_id))])
            .json(update);
        self.send(request).await?;
        Ok(())
    }

    async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        self.select(
            "leaderboard",
            &[
                ("order", "xp_points.desc".into()),
                ("limit", limit.to_string()),
            ],
            None,
        )
        .await
    }

    async fn upsert_content(&self, token: &str, record: &ContentRecord) -> Result<()> {
        let url = self.table_url(record.table().as_str());
        let request = self
            .request(Method::POST, &url, Some(token))
            .header("Prefer", MERGE_DUPLICATES)
            .json(&record_body(record)?);
        self.send(request).await?;
        tracing::info!(table = record.table().as_str(), id = %record.id(), "content saved");
        Ok(())
    }

    async fn delete_content(&self, token: &str, table: ContentTable, id: Uuid) -> Result<()> {
        let url = self.table_url(table.as_str());
        let request = self
            .request(Method::DELETE, &url, Some(token))
            .query(&[("id", eq(id))]);
        self.send(request).await?;
        tracing::info!(table = table.as_str(), %id, "content deleted");
        Ok(())
    }

    async fn assign_role(&self, token: &str, user_id: Uuid, role: Role) -> Result<()> {
        let url = self.table_url("user_roles");
        let request = self
            .request(Method::POST, &url, Some(token))
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", MERGE_DUPLICATES)
            .json(&RoleAssignment { user_id, role });
        self.send(request).await?;
        tracing::info!(%user_id, role = role.as_str(), "role assigned");
        Ok(())
    }
}
