//! # Schema mapping
//!
//! Converts between stored field maps and the typed domain entities. This is
//! the only place that inspects raw field types.
//!
//! Fields the authorization policy depends on (`owner_id`, `admin`, the
//! `posts` and ban containers) must be well-formed or decoding fails with an
//! integrity error. Descriptive fields fall back to an empty value and log a
//! warning, and malformed list elements are skipped with a warning.

use chrono::{DateTime, Utc};
use tracing::warn;

use domains::{
    BanList, Donation, DonationId, FieldProblem, IntegrityError, UserData, UserId,
};

use crate::document::{DocumentKey, FieldValue, Fields};

pub const DONATIONS: &str = "donations";
pub const USERS: &str = "users";
pub const CONFIG: &str = "config";
pub const BANS_DOCUMENT: &str = "bans";

pub fn donation_key(id: &DonationId) -> DocumentKey {
    DocumentKey::new(DONATIONS, id.as_str())
}

pub fn user_key(uid: &UserId) -> DocumentKey {
    DocumentKey::new(USERS, uid.as_str())
}

pub fn bans_key() -> DocumentKey {
    DocumentKey::new(CONFIG, BANS_DOCUMENT)
}

type Decoded<T> = Result<T, IntegrityError>;

/// Typed accessors over one document's fields.
struct FieldReader<'a> {
    key: &'a DocumentKey,
    fields: &'a Fields,
}

impl<'a> FieldReader<'a> {
    fn new(key: &'a DocumentKey, fields: &'a Fields) -> Self {
        Self { key, fields }
    }

    fn problem(&self, field: &str, problem: FieldProblem) -> IntegrityError {
        IntegrityError {
            collection: self.key.collection.clone(),
            id: self.key.id.clone(),
            field: field.to_string(),
            problem,
        }
    }

    fn wrong_type(&self, field: &str, expected: &'static str, found: &FieldValue) -> IntegrityError {
        self.problem(
            field,
            FieldProblem::WrongType {
                expected,
                found: found.kind(),
            },
        )
    }

    fn raw(&self, field: &str) -> Decoded<&'a FieldValue> {
        self.fields
            .get(field)
            .ok_or_else(|| self.problem(field, FieldProblem::Missing))
    }

    fn lenient<T: Default>(&self, decoded: Decoded<T>) -> T {
        decoded.unwrap_or_else(|err| {
            warn!(document = %self.key, error = %err, "field may not have been converted properly");
            T::default()
        })
    }

    fn string(&self, field: &str) -> Decoded<String> {
        match self.raw(field)? {
            FieldValue::String(s) => Ok(s.clone()),
            other => Err(self.wrong_type(field, "string", other)),
        }
    }

    fn bool(&self, field: &str) -> Decoded<bool> {
        match self.raw(field)? {
            FieldValue::Bool(b) => Ok(*b),
            other => Err(self.wrong_type(field, "boolean", other)),
        }
    }

    fn integer(&self, field: &str) -> Decoded<i64> {
        match self.raw(field)? {
            FieldValue::Integer(i) => Ok(*i),
            other => Err(self.wrong_type(field, "integer", other)),
        }
    }

    fn timestamp(&self, field: &str) -> Decoded<DateTime<Utc>> {
        match self.raw(field)? {
            FieldValue::Timestamp(t) => Ok(*t),
            other => Err(self.wrong_type(field, "timestamp", other)),
        }
    }

    fn array(&self, field: &str) -> Decoded<&'a [FieldValue]> {
        match self.raw(field)? {
            FieldValue::Array(items) => Ok(items),
            other => Err(self.wrong_type(field, "array", other)),
        }
    }

    /// Non-string elements are skipped.
    fn string_list(&self, field: &str) -> Decoded<Vec<String>> {
        let mut out = Vec::new();
        for item in self.array(field)? {
            match item {
                FieldValue::String(s) => out.push(s.clone()),
                other => warn!(
                    document = %self.key,
                    field,
                    found = other.kind(),
                    "skipping non-string list element"
                ),
            }
        }
        Ok(out)
    }

    /// Elements that are not references into `collection` are skipped.
    fn references(&self, field: &str, collection: &str) -> Decoded<Vec<String>> {
        let mut out = Vec::new();
        for item in self.array(field)? {
            match item {
                FieldValue::Reference(target) if target.collection == collection => {
                    out.push(target.id.clone())
                }
                other => warn!(
                    document = %self.key,
                    field,
                    found = other.kind(),
                    "skipping element that is not a {collection} reference"
                ),
            }
        }
        Ok(out)
    }
}

pub fn decode_donation(key: &DocumentKey, fields: &Fields) -> Decoded<Donation> {
    let r = FieldReader::new(key, fields);
    let creation_timestamp = r.timestamp("creation_timestamp").unwrap_or_else(|err| {
        warn!(document = %key, error = %err, "field may not have been converted properly");
        DateTime::<Utc>::UNIX_EPOCH
    });

    Ok(Donation {
        id: DonationId::new(key.id.clone()),
        title: r.lenient(r.string("title")),
        description: r.lenient(r.string("description")),
        location: r.lenient(r.string("location")),
        image: r.lenient(r.string("img")),
        creation_timestamp,
        owner_id: UserId::new(r.string("owner_id")?),
        tags: r.lenient(r.string_list("tags")),
        reports: r
            .lenient(r.string_list("reports"))
            .into_iter()
            .map(UserId::new)
            .collect(),
    })
}

pub fn encode_donation(donation: &Donation) -> Fields {
    let mut fields = Fields::new();
    fields.insert("title".into(), FieldValue::String(donation.title.clone()));
    fields.insert(
        "description".into(),
        FieldValue::String(donation.description.clone()),
    );
    fields.insert("location".into(), FieldValue::String(donation.location.clone()));
    fields.insert("img".into(), FieldValue::String(donation.image.clone()));
    fields.insert(
        "creation_timestamp".into(),
        FieldValue::Timestamp(donation.creation_timestamp),
    );
    fields.insert(
        "owner_id".into(),
        FieldValue::String(donation.owner_id.to_string()),
    );
    fields.insert("tags".into(), string_list(donation.tags.iter().map(String::as_str)));
    fields.insert("reports".into(), encode_reports(&donation.reports));
    fields
}

pub fn encode_reports(reports: &[UserId]) -> FieldValue {
    string_list(reports.iter().map(UserId::as_str))
}

/// The uid is taken from the document id, not from the stored `uid` field.
pub fn decode_user(key: &DocumentKey, fields: &Fields) -> Decoded<UserData> {
    let r = FieldReader::new(key, fields);
    let registered_at = r.timestamp("registered_date").unwrap_or_else(|err| {
        warn!(document = %key, error = %err, "field may not have been converted properly");
        DateTime::<Utc>::UNIX_EPOCH
    });

    Ok(UserData {
        uid: UserId::new(key.id.clone()),
        display_name: r.lenient(r.string("display_name")),
        email: r.lenient(r.string("email")),
        registered_at,
        admin: r.bool("admin")?,
        donations_made: r.lenient(r.integer("donations_made")),
        posts: r
            .references("posts", DONATIONS)?
            .into_iter()
            .map(DonationId::new)
            .collect(),
    })
}

pub fn encode_user(user: &UserData) -> Fields {
    let mut fields = Fields::new();
    fields.insert("uid".into(), FieldValue::String(user.uid.to_string()));
    fields.insert(
        "display_name".into(),
        FieldValue::String(user.display_name.clone()),
    );
    fields.insert("email".into(), FieldValue::String(user.email.clone()));
    fields.insert(
        "registered_date".into(),
        FieldValue::Timestamp(user.registered_at),
    );
    fields.insert("admin".into(), FieldValue::Bool(user.admin));
    fields.insert(
        "donations_made".into(),
        FieldValue::Integer(user.donations_made),
    );
    fields.insert("posts".into(), encode_posts(&user.posts));
    fields
}

pub fn encode_posts(posts: &[DonationId]) -> FieldValue {
    FieldValue::Array(
        posts
            .iter()
            .map(|id| FieldValue::Reference(donation_key(id)))
            .collect(),
    )
}

pub fn decode_bans(key: &DocumentKey, fields: &Fields) -> Decoded<BanList> {
    let r = FieldReader::new(key, fields);
    Ok(r.string_list("users")?.into_iter().map(UserId::new).collect())
}

pub fn encode_bans(bans: &BanList) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        "users".into(),
        string_list(bans.iter().map(UserId::as_str)),
    );
    fields
}

fn string_list<'a>(items: impl Iterator<Item = &'a str>) -> FieldValue {
    FieldValue::Array(items.map(|s| FieldValue::String(s.to_string())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_fields() -> Fields {
        encode_user(&UserData {
            uid: UserId::new("u1"),
            display_name: "Ada".into(),
            email: "ada@example.com".into(),
            registered_at: Utc::now(),
            admin: false,
            donations_made: 2,
            posts: vec![DonationId::new("d1"), DonationId::new("d2")],
        })
    }

    #[test]
    fn test_user_decodes_posts_as_donation_ids() {
        let key = DocumentKey::new(USERS, "u1");
        let user = decode_user(&key, &user_fields()).unwrap();
        assert_eq!(user.posts, vec![DonationId::new("d1"), DonationId::new("d2")]);
        assert_eq!(user.donations_made, 2);
    }

    #[test]
    fn test_missing_admin_is_integrity_error() {
        let key = DocumentKey::new(USERS, "u1");
        let mut fields = user_fields();
        fields.remove("admin");
        let err = decode_user(&key, &fields).unwrap_err();
        assert_eq!(err.field, "admin");
        assert_eq!(err.problem, FieldProblem::Missing);
    }

    #[test]
    fn test_mistyped_admin_is_integrity_error() {
        let key = DocumentKey::new(USERS, "u1");
        let mut fields = user_fields();
        fields.insert("admin".into(), FieldValue::String("true".into()));
        let err = decode_user(&key, &fields).unwrap_err();
        assert_eq!(
            err.problem,
            FieldProblem::WrongType {
                expected: "boolean",
                found: "string"
            }
        );
    }

    #[test]
    fn test_foreign_post_entries_are_skipped() {
        let key = DocumentKey::new(USERS, "u1");
        let mut fields = user_fields();
        fields.insert(
            "posts".into(),
            FieldValue::Array(vec![
                FieldValue::Reference(DocumentKey::new(DONATIONS, "d1")),
                FieldValue::String("d2".into()),
                FieldValue::Reference(DocumentKey::new(USERS, "x")),
            ]),
        );
        let user = decode_user(&key, &fields).unwrap();
        assert_eq!(user.posts, vec![DonationId::new("d1")]);
    }

    #[test]
    fn test_donation_tolerates_mistyped_text() {
        let key = DocumentKey::new(DONATIONS, "d1");
        let mut fields = Fields::new();
        fields.insert("title".into(), FieldValue::Integer(5));
        fields.insert("owner_id".into(), FieldValue::String("u1".into()));
        let donation = decode_donation(&key, &fields).unwrap();
        assert_eq!(donation.title, "");
        assert!(donation.reports.is_empty());
        assert_eq!(donation.owner_id, UserId::new("u1"));
    }

    #[test]
    fn test_donation_without_owner_is_rejected() {
        let key = DocumentKey::new(DONATIONS, "d1");
        let err = decode_donation(&key, &Fields::new()).unwrap_err();
        assert_eq!(err.field, "owner_id");
    }

    #[test]
    fn test_ban_list_skips_non_strings() {
        let key = bans_key();
        let mut fields = Fields::new();
        fields.insert(
            "users".into(),
            FieldValue::Array(vec![FieldValue::String("a".into()), FieldValue::Integer(1)]),
        );
        let bans = decode_bans(&key, &fields).unwrap();
        assert_eq!(bans.len(), 1);
        assert!(bans.contains(&UserId::new("a")));
    }

    #[test]
    fn test_tagged_values_survive_json() {
        let fields = user_fields();
        let json = serde_json::to_string(&fields).unwrap();
        let back: Fields = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fields);
    }
}
