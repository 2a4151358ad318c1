//! Domain objects returned by the API.
//!
//! Resource clients decode responses into these types and pass them back
//! as arguments, where they serialize to their uuid or id.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::{Identity, Reference};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub uuid: String,
    pub name: Option<String>,
    #[serde(default)]
    pub urns: Vec<String>,
    /// Uuids of the groups the contact belongs to.
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, Option<String>>,
    pub language: Option<String>,
    #[serde(default, with = "crate::datetime::optional")]
    pub modified_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    pub id: i64,
    #[serde(default)]
    pub urns: Vec<String>,
    #[serde(default)]
    pub contacts: Vec<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    pub text: String,
    pub status: Option<String>,
    #[serde(default, with = "crate::datetime::optional")]
    pub created_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub broadcast: Option<i64>,
    pub contact: Option<String>,
    pub urn: Option<String>,
    pub status: Option<String>,
    pub direction: Option<String>,
    pub text: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, with = "crate::datetime::optional")]
    pub created_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, with = "crate::datetime::optional")]
    pub created_on: Option<DateTime<Utc>>,
}

impl Reference for Contact {
    fn identity(&self) -> Option<Identity> {
        Identity::prefer(Some(self.uuid.as_str()), None)
    }
}

impl Reference for Group {
    fn identity(&self) -> Option<Identity> {
        Identity::prefer(Some(self.uuid.as_str()), None)
    }
}

impl Reference for Broadcast {
    fn identity(&self) -> Option<Identity> {
        Identity::prefer(None, Some(self.id))
    }
}

impl Reference for Message {
    fn identity(&self) -> Option<Identity> {
        Identity::prefer(None, Some(self.id))
    }
}

impl Reference for Flow {
    fn identity(&self) -> Option<Identity> {
        Identity::prefer(Some(self.uuid.as_str()), None)
    }
}
