use serde::{Deserialize, Serialize};

/// The `aud` claim. Tokens in the wild carry either a single string or an
/// array of strings; a single audience is written back as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(value) => value == audience,
            Audience::Many(values) => values.iter().any(|value| value == audience),
        }
    }
}

impl From<&str> for Audience {
    fn from(value: &str) -> Self {
        Audience::Single(value.to_owned())
    }
}

impl From<Vec<String>> for Audience {
    fn from(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            Audience::Single(values.remove(0))
        } else {
            Audience::Many(values)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Identity provider e.g. github, gitlab, bitbucket etc.
    #[serde(default)]
    pub idp: String,

    /// Username at the identity provider
    #[serde(default)]
    pub alias: String,

    /// Arbitrary application specific role names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn new() -> Self {
        Claims::default()
    }

    /// Copies the identity part of the claims, leaving `exp`, `nbf` and `iat`
    /// unset so the caller can stamp them again.
    pub fn without_times(&self) -> Self {
        Claims {
            idp: self.idp.clone(),
            alias: self.alias.clone(),
            roles: self.roles.clone(),
            iss: self.iss.clone(),
            sub: self.sub.clone(),
            aud: self.aud.clone(),
            jti: self.jti.clone(),
            exp: None,
            nbf: None,
            iat: None,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles
            .as_ref()
            .map_or(false, |roles| roles.iter().any(|r| r == role))
    }
}
