use crate::config::{self, GIT_COMMIT};
use axum::{extract::State, http::StatusCode, Json};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Names of the environment variables reported by [`health_check_environment`].
#[derive(Debug, Clone)]
pub struct HealthCheckEnv {
    keys: Arc<BTreeSet<String>>,
}

impl Default for HealthCheckEnv {
    fn default() -> Self {
        HealthCheckEnv {
            keys: Arc::new(BTreeSet::from([GIT_COMMIT.to_owned()])),
        }
    }
}

impl HealthCheckEnv {
    /// Registers one more variable. Registering a name twice has no effect.
    pub fn register_env_var(mut self, key: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.keys).insert(key.into());
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    /// Registered variables that are currently set to a non-empty value.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.keys
            .iter()
            .filter_map(|key| config::env_non_empty(key).map(|value| (key.clone(), value)))
            .collect()
    }
}

pub async fn health_check_no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn health_check_environment(
    State(env): State<HealthCheckEnv>,
) -> Json<BTreeMap<String, String>> {
    Json(env.snapshot())
}
