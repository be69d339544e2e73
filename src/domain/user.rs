use crate::domain::entry::EntryKind;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Stored user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub full_name: String,
    pub username: String,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default)]
    pub incomes: Vec<ObjectId>,
    #[serde(default)]
    pub expenses: Vec<ObjectId>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(new_user: NewUser, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: ObjectId::new(),
            full_name: new_user.full_name,
            username: new_user.username,
            email: new_user.email,
            password_hash,
            incomes: Vec::new(),
            expenses: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Reference list holding the ids of this user's entries of `kind`.
    pub fn entry_refs(&self, kind: EntryKind) -> &[ObjectId] {
        match kind {
            EntryKind::Income => &self.incomes,
            EntryKind::Expense => &self.expenses,
        }
    }

    pub fn entry_refs_mut(&mut self, kind: EntryKind) -> &mut Vec<ObjectId> {
        match kind {
            EntryKind::Income => &mut self.incomes,
            EntryKind::Expense => &mut self.expenses,
        }
    }

    pub fn owns(&self, kind: EntryKind, entry_id: &ObjectId) -> bool {
        self.entry_refs(kind).contains(entry_id)
    }
}

/// What clients get to see of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub incomes: Vec<String>,
    pub expenses: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_hex(),
            full_name: user.full_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            incomes: user.incomes.iter().map(|id| id.to_hex()).collect(),
            expenses: user.expenses.iter().map(|id| id.to_hex()).collect(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SignInRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub username: Option<String>,
}

/// Validated sign-up payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Validated profile changes; at least one field is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub username: Option<String>,
}
