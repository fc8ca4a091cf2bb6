use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A student (alumno) document.
///
/// `id` is `None` until the record has been persisted; the store assigns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub age: i32,
    pub email: String,
}

impl Student {
    pub fn new<N: Into<String>, E: Into<String>>(name: N, age: i32, email: E) -> Self {
        Self {
            id: None,
            name: name.into(),
            age,
            email: email.into(),
        }
    }
}

/// Exact-match criteria. Unset fields are not constrained, so the default
/// filter matches every student.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentFilter {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub email: Option<String>,
}

/// Partial update applied with `$set` semantics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentUpdate {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub matched: u64,
    pub modified: u64,
}
