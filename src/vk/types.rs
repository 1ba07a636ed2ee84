// src/vk/types.rs
// =============================================================================
// Data shapes for the VK API.
//
// Two layers:
// - Raw* structs mirror the JSON VK sends back (lots of optional fields)
// - UserRecord / GroupRecord are the normalized records we store in the graph
//
// Normalization is also where we decide a profile is unusable: deleted,
// banned or closed profiles never become records.
// =============================================================================

use serde::{Deserialize, Serialize};

/// A normalized VK user, ready to be written as a `User` node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    /// "first_name last_name"
    pub name: String,
    /// Short address (vk.com/<screen_name>); empty when VK has none
    pub screen_name: String,
    /// VK code: 1 = female, 2 = male. None when unspecified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// A normalized VK community, ready to be written as a `Group` node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    pub id: i64,
    pub name: String,
    pub screen_name: String,
}

/// Why a profile or community was not turned into a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unavailable {
    /// VK reports "deleted" or "banned"
    Deactivated(String),
    Closed,
}

// Every VK response is either {"response": ...} or {"error": {...}}
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub response: Option<T>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error_code: i64,
    #[serde(default)]
    pub error_msg: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCity {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub screen_name: Option<String>,
    pub sex: Option<u8>,
    pub city: Option<RawCity>,
    pub deactivated: Option<String>,
    #[serde(default)]
    pub is_closed: bool,
}

impl RawUser {
    pub fn into_record(self) -> Result<UserRecord, Unavailable> {
        if let Some(reason) = self.deactivated {
            return Err(Unavailable::Deactivated(reason));
        }
        if self.is_closed {
            return Err(Unavailable::Closed);
        }

        Ok(UserRecord {
            id: self.id,
            name: format!("{} {}", self.first_name, self.last_name)
                .trim()
                .to_string(),
            screen_name: self.screen_name.unwrap_or_default(),
            sex: self.sex.filter(|&s| s != 0),
            city: self
                .city
                .map(|c| c.title)
                .filter(|title| !title.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawGroup {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub screen_name: String,
    pub deactivated: Option<String>,
    /// 0 = open, 1 = closed, 2 = private
    #[serde(default)]
    pub is_closed: u8,
}

impl RawGroup {
    pub fn into_record(self) -> Result<GroupRecord, Unavailable> {
        if let Some(reason) = self.deactivated {
            return Err(Unavailable::Deactivated(reason));
        }
        if self.is_closed != 0 {
            return Err(Unavailable::Closed);
        }

        Ok(GroupRecord {
            id: self.id,
            name: self.name,
            screen_name: self.screen_name,
        })
    }
}

/// users.getFollowers: {"count": N, "items": [ids]}
#[derive(Debug, Deserialize)]
pub(crate) struct IdPage {
    #[serde(default)]
    pub items: Vec<i64>,
}

/// users.getSubscriptions (not extended): {"users": {...}, "groups": {...}}
#[derive(Debug, Deserialize)]
pub(crate) struct Subscriptions {
    pub groups: IdPage,
}

// groups.getById returns a bare array up to API 5.139 and
// {"groups": [...], "profiles": [...]} from 5.194 on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum GroupsById {
    Legacy(Vec<RawGroup>),
    Wrapped { groups: Vec<RawGroup> },
}

impl GroupsById {
    pub fn into_first(self) -> Option<RawGroup> {
        match self {
            GroupsById::Legacy(groups) | GroupsById::Wrapped { groups } => {
                groups.into_iter().next()
            }
        }
    }
}
