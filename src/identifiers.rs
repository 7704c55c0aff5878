//! Slug validation and external task-ID formatting/parsing (L2).

use crate::error::StoreError;

/// Validates a plan slug: non-empty, lowercase ASCII letters and hyphens
/// only, no leading or trailing hyphen.
pub fn validate_slug(slug: &str) -> Result<(), StoreError> {
    if slug.is_empty() {
        return Err(StoreError::EmptyId);
    }
    let bytes = slug.as_bytes();
    if bytes[0] == b'-' || bytes[bytes.len() - 1] == b'-' {
        return Err(StoreError::InvalidKebabCase(slug.to_string()));
    }
    if !bytes.iter().all(|b| b.is_ascii_lowercase() || *b == b'-') {
        return Err(StoreError::InvalidKebabCase(slug.to_string()));
    }
    Ok(())
}

/// Formats `{slug}:{number:03}`.
pub fn format_task_id(slug: &str, plan_task_number: i64) -> String {
    format!("{slug}:{plan_task_number:03}")
}

/// A parsed external task reference: either a bare internal row id, or a
/// `slug:number` pair that must still be resolved against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRef {
    Internal(i64),
    Formatted { slug: String, number: i64 },
}

/// Parses either a bare positive integer (`^[1-9][0-9]*$`) or `slug:number`.
pub fn parse_task_id(input: &str) -> Result<TaskRef, StoreError> {
    if let Some((slug, number)) = input.split_once(':') {
        if slug.is_empty() {
            return Err(StoreError::InvalidTaskId(input.to_string()));
        }
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StoreError::InvalidTaskId(input.to_string()));
        }
        validate_slug(slug).map_err(|_| StoreError::InvalidTaskId(input.to_string()))?;
        let number: i64 = number
            .parse()
            .map_err(|_| StoreError::InvalidTaskId(input.to_string()))?;
        if number < 1 || number > 999 {
            return Err(StoreError::InvalidTaskId(input.to_string()));
        }
        return Ok(TaskRef::Formatted {
            slug: slug.to_string(),
            number,
        });
    }

    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) || input.starts_with('0') {
        return Err(StoreError::InvalidTaskId(input.to_string()));
    }
    let id: i64 = input
        .parse()
        .map_err(|_| StoreError::InvalidTaskId(input.to_string()))?;
    Ok(TaskRef::Internal(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_kebab_slug() {
        assert!(validate_slug("auth").is_ok());
        assert!(validate_slug("auth-service").is_ok());
    }

    #[test]
    fn rejects_empty_slug() {
        assert!(matches!(validate_slug(""), Err(StoreError::EmptyId)));
    }

    #[test]
    fn rejects_leading_or_trailing_hyphen() {
        assert!(matches!(validate_slug("-auth"), Err(StoreError::InvalidKebabCase(_))));
        assert!(matches!(validate_slug("auth-"), Err(StoreError::InvalidKebabCase(_))));
    }

    #[test]
    fn rejects_non_lowercase_bytes() {
        assert!(matches!(validate_slug("Auth"), Err(StoreError::InvalidKebabCase(_))));
        assert!(matches!(validate_slug("auth_service"), Err(StoreError::InvalidKebabCase(_))));
    }

    #[test]
    fn format_and_parse_round_trip() {
        let id = format_task_id("auth", 7);
        assert_eq!(id, "auth:007");
        assert_eq!(
            parse_task_id(&id).unwrap(),
            TaskRef::Formatted { slug: "auth".to_string(), number: 7 }
        );
    }

    #[test]
    fn parses_bare_internal_id() {
        assert_eq!(parse_task_id("42").unwrap(), TaskRef::Internal(42));
    }

    #[test]
    fn rejects_malformed_task_ids() {
        assert!(parse_task_id("auth:").is_err());
        assert!(parse_task_id(":001").is_err());
        assert!(parse_task_id("auth:abc").is_err());
        assert!(parse_task_id("0").is_err());
        assert!(parse_task_id("").is_err());
    }
}
