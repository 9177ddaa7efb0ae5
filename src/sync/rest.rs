use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::entity::{CollectionGroup, UserSettings};
use crate::error::{PlaytabError, Result};
use crate::sync::{CollectionRow, CollectionsCallback, RemoteStore, SettingsRow, Subscription};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Clone)]
struct Session {
    user_id: String,
    access_token: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
}

/// Remote backend over a PostgREST-style HTTP row store.
///
/// Collections live in a `collections` table (row per collection, upsert
/// on `id`), settings in `user_settings` (row per user, upsert on
/// `user_id`). Change subscriptions are implemented by polling, since the
/// blocking client has no push channel.
pub struct RestRemote {
    client: Client,
    base_url: String,
    api_key: String,
    session: Mutex<Option<Session>>,
    poll_interval: Duration,
}

impl RestRemote {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            session: Mutex::new(None),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Password sign-in. Returns the authenticated user id.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(PlaytabError::Remote(format!(
                "Sign in failed ({status}): {body}"
            )));
        }

        let token: TokenResponse = response.json()?;
        let user_id = token.user.id.clone();
        let mut session = self.session.lock().expect("session lock poisoned");
        *session = Some(Session {
            user_id: user_id.clone(),
            access_token: token.access_token,
        });
        Ok(user_id)
    }

    pub fn sign_out(&self) {
        let mut session = self.session.lock().expect("session lock poisoned");
        *session = None;
    }

    fn session(&self) -> Result<Session> {
        let session = self.session.lock().expect("session lock poisoned");
        session.clone().ok_or(PlaytabError::AuthRequired)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn check(response: reqwest::blocking::Response, context: &str) -> Result<reqwest::blocking::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().unwrap_or_default();
            Err(PlaytabError::Remote(format!("{context} ({status}): {body}")))
        }
    }

    fn fetch_rows(
        client: &Client,
        url: &str,
        api_key: &str,
        session: &Session,
    ) -> Result<Vec<CollectionRow>> {
        let response = client
            .get(url)
            .query(&[
                ("user_id", format!("eq.{}", session.user_id).as_str()),
                ("order", "created_at.asc"),
                ("select", "*"),
            ])
            .header("apikey", api_key)
            .bearer_auth(&session.access_token)
            .send()?;
        let response = Self::check(response, "Failed to fetch collections")?;
        Ok(response.json()?)
    }
}

impl RemoteStore for RestRemote {
    fn current_user(&self) -> Result<Option<String>> {
        let session = self.session.lock().expect("session lock poisoned");
        Ok(session.as_ref().map(|s| s.user_id.clone()))
    }

    fn push_collections(&self, collections: &[CollectionGroup]) -> Result<()> {
        let session = self.session()?;
        let rows: Vec<CollectionRow> = collections
            .iter()
            .map(|group| CollectionRow::from_group(&session.user_id, group))
            .collect();

        let response = self
            .client
            .post(self.table_url("collections"))
            .query(&[("on_conflict", "id")])
            .header("apikey", &self.api_key)
            .header("Prefer", "resolution=merge-duplicates")
            .bearer_auth(&session.access_token)
            .json(&rows)
            .send()?;
        Self::check(response, "Failed to sync collections")?;
        Ok(())
    }

    fn pull_collections(&self) -> Result<Vec<CollectionGroup>> {
        let session = self.session()?;
        let rows = Self::fetch_rows(
            &self.client,
            &self.table_url("collections"),
            &self.api_key,
            &session,
        )?;
        Ok(rows.into_iter().map(CollectionRow::into_group).collect())
    }

    fn delete_collection(&self, collection_id: &str) -> Result<()> {
        let session = self.session()?;
        let response = self
            .client
            .delete(self.table_url("collections"))
            .query(&[
                ("id", format!("eq.{collection_id}").as_str()),
                ("user_id", format!("eq.{}", session.user_id).as_str()),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&session.access_token)
            .send()?;
        Self::check(response, "Failed to delete collection")?;
        Ok(())
    }

    fn push_settings(&self, settings: &UserSettings) -> Result<()> {
        let session = self.session()?;
        let row = SettingsRow {
            user_id: session.user_id.clone(),
            settings: *settings,
        };

        let response = self
            .client
            .post(self.table_url("user_settings"))
            .query(&[("on_conflict", "user_id")])
            .header("apikey", &self.api_key)
            .header("Prefer", "resolution=merge-duplicates")
            .bearer_auth(&session.access_token)
            .json(&[row])
            .send()?;
        Self::check(response, "Failed to sync settings")?;
        Ok(())
    }

    fn pull_settings(&self) -> Result<Option<UserSettings>> {
        let session = self.session()?;
        let response = self
            .client
            .get(self.table_url("user_settings"))
            .query(&[
                ("user_id", format!("eq.{}", session.user_id).as_str()),
                ("select", "settings"),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&session.access_token)
            .send()?;
        let response = Self::check(response, "Failed to fetch settings")?;

        #[derive(Deserialize)]
        struct SettingsOnly {
            settings: UserSettings,
        }
        let rows: Vec<SettingsOnly> = response.json()?;
        Ok(rows.into_iter().next().map(|row| row.settings))
    }

    fn subscribe_collections(
        &self,
        user_id: &str,
        callback: CollectionsCallback,
    ) -> Result<Subscription> {
        let session = self.session()?;
        if session.user_id != user_id {
            return Err(PlaytabError::AuthRequired);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let client = self.client.clone();
        let url = self.table_url("collections");
        let api_key = self.api_key.clone();
        let interval = self.poll_interval;

        thread::spawn(move || {
            let mut last_seen: Option<String> = None;
            while !thread_stop.load(Ordering::Relaxed) {
                match Self::fetch_rows(&client, &url, &api_key, &session) {
                    Ok(rows) => {
                        let fingerprint = serde_json::to_string(&rows).unwrap_or_default();
                        match &last_seen {
                            // Prime on the first successful fetch; only
                            // deliver actual changes.
                            None => last_seen = Some(fingerprint),
                            Some(previous) if *previous != fingerprint => {
                                last_seen = Some(fingerprint);
                                let groups =
                                    rows.into_iter().map(CollectionRow::into_group).collect();
                                callback(groups);
                            }
                            Some(_) => {}
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "collections poll failed");
                    }
                }
                thread::sleep(interval);
            }
        });

        Ok(Subscription::new(move || {
            stop.store(true, Ordering::Relaxed);
        }))
    }
}
