// "domain.object_id" identifiers

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityIdError {
    #[error("entity id is empty")]
    Empty,
    #[error("entity id {0:?} has no '.' separating domain and object id")]
    MissingSeparator(String),
    #[error("entity id {0:?} has an empty domain")]
    EmptyDomain(String),
    #[error("entity id {0:?} has an empty object id")]
    EmptyObjectId(String),
}

/// Splits an id into `(domain, object_id)` at the first '.'; both parts must be non-empty.
pub fn split_entity_id(entity_id: &str) -> Result<(&str, &str), EntityIdError> {
    if entity_id.is_empty() {
        return Err(EntityIdError::Empty);
    }
    let (domain, object_id) = entity_id
        .split_once('.')
        .ok_or_else(|| EntityIdError::MissingSeparator(entity_id.to_string()))?;
    if domain.is_empty() {
        return Err(EntityIdError::EmptyDomain(entity_id.to_string()));
    }
    if object_id.is_empty() {
        return Err(EntityIdError::EmptyObjectId(entity_id.to_string()));
    }
    Ok((domain, object_id))
}

/// Domain part of an id, or the whole string when it does not split.
pub fn domain_of(entity_id: &str) -> &str {
    split_entity_id(entity_id).map_or(entity_id, |(domain, _)| domain)
}
