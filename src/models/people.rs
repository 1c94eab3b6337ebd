use serde::{Deserialize, Serialize};

use crate::domain::{PersonId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonRow {
    pub id: PersonId,
    pub name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileRow {
    pub id: UserId,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}
