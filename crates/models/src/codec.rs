//! Flat, class-tagged representation of an [`Object`].
//!
//! A flat record is a JSON object holding every entity field plus
//! `__class__`, the entity kind name. It is what the file engine persists.

use serde_json::{Map, Value};

use crate::entity::Object;
use crate::errors::ModelError;
use crate::kind::EntityKind;
use crate::password::PasswordHasher;

pub const CLASS_TAG: &str = "__class__";

pub type FlatRecord = Map<String, Value>;

/// Encode `object`, hashing a user's plaintext password in the output only.
pub fn encode(object: &Object, hasher: &PasswordHasher) -> Result<FlatRecord, ModelError> {
    let value = match object {
        Object::User(user) if user.password.needs_hashing() => {
            let mut sealed = object.clone();
            sealed.hash_password(hasher)?;
            serde_json::to_value(&sealed)
        }
        _ => serde_json::to_value(object),
    }
    .map_err(|e| ModelError::MalformedRecord(e.to_string()))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ModelError::MalformedRecord(format!("expected an object, got {other}"))),
    }
}

/// Decode a flat record back into the entity it describes.
pub fn decode(record: FlatRecord) -> Result<Object, ModelError> {
    let tag = match record.get(CLASS_TAG) {
        Some(Value::String(tag)) => tag.as_str(),
        Some(_) => return Err(ModelError::MalformedRecord(format!("{CLASS_TAG} must be a string"))),
        None => return Err(ModelError::MalformedRecord(format!("missing {CLASS_TAG}"))),
    };
    let kind: EntityKind = tag.parse()?;

    let object: Object = serde_json::from_value(Value::Object(record))
        .map_err(|e| ModelError::MalformedRecord(format!("{kind}: {e}")))?;
    Ok(object)
}
