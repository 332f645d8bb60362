//! Input checks applied before any policy decision.

use domains::{AppError, DonationDraft, Result, UserId};

pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_DESCRIPTION_CHARS: usize = 4000;
pub const MAX_LOCATION_CHARS: usize = 200;
pub const MAX_IMAGE_REF_CHARS: usize = 2048;
pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_CHARS: usize = 40;

/// Identities double as document ids, so they must be usable as one.
pub fn validate_identity(uid: &UserId) -> Result<()> {
    let raw = uid.as_str();
    if raw.trim().is_empty() {
        return Err(AppError::ValidationError("user id must not be blank".into()));
    }
    if raw.contains('/') {
        return Err(AppError::ValidationError(format!(
            "user id `{raw}` must not contain '/'"
        )));
    }
    Ok(())
}

/// Checks field bounds and returns the draft with trimmed text and
/// de-duplicated tags (first occurrence wins).
pub fn normalize_draft(draft: DonationDraft) -> Result<DonationDraft> {
    let title = draft.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::ValidationError("title is required".into()));
    }
    check_len("title", &title, MAX_TITLE_CHARS)?;
    check_len("description", &draft.description, MAX_DESCRIPTION_CHARS)?;

    let location = draft.location.trim().to_string();
    check_len("location", &location, MAX_LOCATION_CHARS)?;
    check_len("img", &draft.image, MAX_IMAGE_REF_CHARS)?;

    let mut tags: Vec<String> = Vec::with_capacity(draft.tags.len());
    for raw in &draft.tags {
        let tag = raw.trim();
        if tag.is_empty() {
            return Err(AppError::ValidationError("tags must not be blank".into()));
        }
        check_len("tag", tag, MAX_TAG_CHARS)?;
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    if tags.len() > MAX_TAGS {
        return Err(AppError::ValidationError(format!(
            "at most {MAX_TAGS} tags are allowed, got {}",
            tags.len()
        )));
    }

    Ok(DonationDraft {
        title,
        location,
        tags,
        ..draft
    })
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(AppError::ValidationError(format!(
            "{field} is {len} characters long, the limit is {max}"
        )));
    }
    Ok(())
}
