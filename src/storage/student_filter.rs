//! Helpers for building `StudentFilter` and `StudentUpdate` values and for
//! turning them into store documents.
//!
//! The in-memory backend evaluates the same criteria with `matches` and `apply`,
//! so both backends agree on what a filter selects and what an update changes.

use mongodb::bson::{doc, Document};

pub use crate::storage::types::{Student, StudentFilter, StudentUpdate};

/// Build a `StudentFilter` that matches students by exact name.
pub fn by_name<S: Into<String>>(name: S) -> StudentFilter {
    StudentFilter {
        name: Some(name.into()),
        ..Default::default()
    }
}

/// Build a `StudentFilter` that matches students by exact email.
pub fn by_email<S: Into<String>>(email: S) -> StudentFilter {
    StudentFilter {
        email: Some(email.into()),
        ..Default::default()
    }
}

/// Build a `StudentUpdate` that only sets the age.
pub fn set_age(age: i32) -> StudentUpdate {
    StudentUpdate {
        age: Some(age),
        ..Default::default()
    }
}

impl StudentFilter {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.email.is_none()
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(ref name) = self.name {
            filter.insert("name", name.as_str());
        }
        if let Some(age) = self.age {
            filter.insert("age", age);
        }
        if let Some(ref email) = self.email {
            filter.insert("email", email.as_str());
        }
        filter
    }

    pub fn matches(&self, student: &Student) -> bool {
        if let Some(ref name) = self.name {
            if &student.name != name {
                return false;
            }
        }
        if let Some(age) = self.age {
            if student.age != age {
                return false;
            }
        }
        if let Some(ref email) = self.email {
            if &student.email != email {
                return false;
            }
        }
        true
    }
}

impl StudentUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.age.is_none() && self.email.is_none()
    }

    /// `{ "$set": { .. } }` with only the fields present in the update.
    pub fn to_document(&self) -> Document {
        let mut fields = Document::new();
        if let Some(ref name) = self.name {
            fields.insert("name", name.as_str());
        }
        if let Some(age) = self.age {
            fields.insert("age", age);
        }
        if let Some(ref email) = self.email {
            fields.insert("email", email.as_str());
        }
        doc! { "$set": fields }
    }

    /// Applies the update in place. Returns whether any field actually changed,
    /// which is what the store reports as the modified count.
    pub fn apply(&self, student: &mut Student) -> bool {
        let mut changed = false;
        if let Some(ref name) = self.name {
            if &student.name != name {
                student.name = name.clone();
                changed = true;
            }
        }
        if let Some(age) = self.age {
            if student.age != age {
                student.age = age;
                changed = true;
            }
        }
        if let Some(ref email) = self.email {
            if &student.email != email {
                student.email = email.clone();
                changed = true;
            }
        }
        changed
    }
}
