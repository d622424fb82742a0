//! Recipient resolution: deterministic mapping from a free-form string
//! (name, phone number, raw JID) to exactly one canonical address.
//!
//! Ordering is intentional: the live, synced store is authoritative and takes
//! priority over the static fallback snapshots, and group-name ambiguity is
//! only considered once no individual match exists anywhere.

use std::fmt;

use super::{
    digits_of, is_group_jid, looks_like_phone, ContactIndex, MessageStore, GROUP_SUFFIX,
    USER_SUFFIX,
};

/// How many store hits a name query considers before declaring ambiguity.
const STORE_MATCH_LIMIT: usize = 10;

// ── ResolveError ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ResolveError {
    /// Input had address shape but could not be normalized.
    InvalidAddress(String),
    /// More than one store chat matched the name; `(name, jid)` per candidate.
    AmbiguousContact(Vec<(String, String)>),
    /// More than one fallback group matched the name; `(name, jid)` per candidate.
    AmbiguousGroup(Vec<(String, String)>),
    /// Nothing matched anywhere.
    NotFound(String),
    /// The store itself failed while searching.
    StoreFailure(String),
}

fn enumerate(candidates: &[(String, String)]) -> String {
    candidates
        .iter()
        .map(|(name, jid)| format!("  {name} → {jid}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress(input) => write!(
                f,
                "'{input}' is not a valid WhatsApp address. Individual JIDs look like \
                 15551234567{USER_SUFFIX}, groups like 123456789-987654321{GROUP_SUFFIX}."
            ),
            Self::AmbiguousContact(candidates) => write!(
                f,
                "Multiple contacts match; use one of these JIDs instead:\n{}",
                enumerate(candidates)
            ),
            Self::AmbiguousGroup(candidates) => write!(
                f,
                "Multiple groups match; use one of these JIDs instead:\n{}",
                enumerate(candidates)
            ),
            Self::NotFound(query) => write!(
                f,
                "No contact or group matching '{query}' was found. Try a phone number \
                 (e.g. +15551234567) or a full JID instead."
            ),
            Self::StoreFailure(e) => write!(f, "chat store error: {e}"),
        }
    }
}

// ── Resolution ───────────────────────────────────────────────────────────

/// Resolve a free-form recipient string to one canonical JID.
///
/// 1. Address-shaped input (contains `@`): group JIDs pass through unchanged;
///    individual local parts are normalized by the single-user rule.
/// 2. Phone-shaped input: digits become an individual JID.
/// 3. Anything else is a name, tried against the store first, then the
///    individual fallback list, then the group fallback list.
pub(crate) fn resolve_recipient(
    store: &MessageStore,
    index: &ContactIndex,
    input: &str,
) -> Result<String, ResolveError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::InvalidAddress(input.to_string()));
    }

    if trimmed.contains('@') {
        // Group addresses must never be renormalized.
        if is_group_jid(trimmed) {
            return Ok(trimmed.to_string());
        }
        return normalize_user_jid(trimmed);
    }

    if looks_like_phone(trimmed) {
        return Ok(format!("{}{USER_SUFFIX}", digits_of(trimmed)));
    }

    resolve_name(store, index, trimmed)
}

/// Canonical single-user normalization: the local part, stripped of `+`,
/// spaces and dashes, must be pure digits.
fn normalize_user_jid(input: &str) -> Result<String, ResolveError> {
    let local = match input.split_once('@') {
        Some((local, _)) => local,
        None => input,
    };
    let cleaned: String = local
        .chars()
        .filter(|c| !matches!(c, '+' | ' ' | '-'))
        .collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(ResolveError::InvalidAddress(input.to_string()));
    }
    Ok(format!("{cleaned}{USER_SUFFIX}"))
}

fn resolve_name(
    store: &MessageStore,
    index: &ContactIndex,
    name: &str,
) -> Result<String, ResolveError> {
    let hits = store
        .search_contacts(name, STORE_MATCH_LIMIT)
        .map_err(ResolveError::StoreFailure)?;
    match hits.len() {
        1 => return Ok(hits[0].jid.clone()),
        n if n > 1 => {
            let candidates = hits
                .iter()
                .map(|c| (c.display_name().to_string(), c.jid.clone()))
                .collect();
            return Err(ResolveError::AmbiguousContact(candidates));
        }
        _ => {}
    }

    if let Some(jid) = index.find_contact_fallback(name) {
        return Ok(jid);
    }

    let groups = index.find_group_fallback(name);
    match groups.len() {
        0 => Err(ResolveError::NotFound(name.to_string())),
        1 => Ok(groups[0].jid.clone()),
        _ => Err(ResolveError::AmbiguousGroup(
            groups.into_iter().map(|g| (g.name, g.jid)).collect(),
        )),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::{FallbackContact, FallbackGroup};
    use std::path::PathBuf;

    fn temp_store(name: &str) -> (MessageStore, PathBuf) {
        let dir = std::env::temp_dir().join("wamcp_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("resolver_{}_{name}.sqlite", std::process::id()));
        let _ = std::fs::remove_file(&path);
        (MessageStore::open_or_create(&path).unwrap(), path)
    }

    fn empty_index() -> ContactIndex {
        ContactIndex::with_entries(Vec::new(), Vec::new())
    }

    #[test]
    fn group_jid_passes_through_unchanged() {
        let (store, path) = temp_store("group_passthrough");
        let jid = resolve_recipient(&store, &empty_index(), "123456789-987654321@g.us").unwrap();
        assert_eq!(jid, "123456789-987654321@g.us");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn user_jid_is_normalized() {
        let (store, path) = temp_store("user_jid");
        let index = empty_index();
        assert_eq!(
            resolve_recipient(&store, &index, "+1 555-123-4567@s.whatsapp.net").unwrap(),
            "15551234567@s.whatsapp.net"
        );
        assert_eq!(
            resolve_recipient(&store, &index, "15551234567@s.whatsapp.net").unwrap(),
            "15551234567@s.whatsapp.net"
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn malformed_address_is_invalid() {
        let (store, path) = temp_store("invalid");
        let err = resolve_recipient(&store, &empty_index(), "alice@s.whatsapp.net").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidAddress(_)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn phone_number_becomes_individual_jid() {
        let (store, path) = temp_store("phone");
        let jid = resolve_recipient(&store, &empty_index(), "+91 99190 03141").unwrap();
        assert_eq!(jid, "919919003141@s.whatsapp.net");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn single_store_match_wins() {
        let (store, path) = temp_store("store_single");
        store
            .upsert_chat("15551234567@s.whatsapp.net", Some("Alice"), Some(100))
            .unwrap();
        let jid = resolve_recipient(&store, &empty_index(), "alice").unwrap();
        assert_eq!(jid, "15551234567@s.whatsapp.net");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn multiple_store_matches_are_ambiguous() {
        let (store, path) = temp_store("store_multi");
        store.upsert_chat("1@s.whatsapp.net", Some("Sam One"), Some(100)).unwrap();
        store.upsert_chat("2@s.whatsapp.net", Some("Sam Two"), Some(200)).unwrap();
        let err = resolve_recipient(&store, &empty_index(), "sam").unwrap_err();
        match err {
            ResolveError::AmbiguousContact(candidates) => {
                assert_eq!(candidates.len(), 2);
                let text = ResolveError::AmbiguousContact(candidates).to_string();
                assert!(text.contains("Sam One → 1@s.whatsapp.net"));
                assert!(text.contains("Sam Two → 2@s.whatsapp.net"));
            }
            other => panic!("expected AmbiguousContact, got {other:?}"),
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn store_beats_fallback_list() {
        let (store, path) = temp_store("priority");
        store
            .upsert_chat("111@s.whatsapp.net", Some("Dana"), Some(100))
            .unwrap();
        let index = ContactIndex::with_entries(
            vec![FallbackContact {
                name: Some("Dana".into()),
                first_name: None,
                last_name: None,
                phone: Some("999".into()),
            }],
            Vec::new(),
        );
        assert_eq!(
            resolve_recipient(&store, &index, "dana").unwrap(),
            "111@s.whatsapp.net"
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn fallback_contact_then_group_order() {
        let (store, path) = temp_store("fallback_order");
        let index = ContactIndex::with_entries(
            vec![FallbackContact {
                name: Some("Erin".into()),
                first_name: None,
                last_name: None,
                phone: Some("+44 7700 900123".into()),
            }],
            vec![FallbackGroup { name: "Erin Fan Club".into(), jid: "77@g.us".into() }],
        );
        // individual fallback wins before groups are even considered
        assert_eq!(
            resolve_recipient(&store, &index, "erin").unwrap(),
            "447700900123@s.whatsapp.net"
        );
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn two_fallback_groups_are_ambiguous_and_sorted() {
        let (store, path) = temp_store("group_ambiguous");
        let index = ContactIndex::with_entries(
            Vec::new(),
            vec![
                FallbackGroup { name: "Smith Family".into(), jid: "2@g.us".into() },
                FallbackGroup { name: "Family Chat".into(), jid: "1@g.us".into() },
            ],
        );
        let err = resolve_recipient(&store, &index, "family").unwrap_err();
        match &err {
            ResolveError::AmbiguousGroup(candidates) => {
                assert_eq!(candidates[0].0, "Family Chat");
                assert_eq!(candidates[1].0, "Smith Family");
            }
            other => panic!("expected AmbiguousGroup, got {other:?}"),
        }
        let text = err.to_string();
        assert!(text.contains("Family Chat → 1@g.us"));
        assert!(text.contains("Smith Family → 2@g.us"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn single_fallback_group_resolves() {
        let (store, path) = temp_store("group_single");
        let index = ContactIndex::with_entries(
            Vec::new(),
            vec![FallbackGroup { name: "Book Club".into(), jid: "42@g.us".into() }],
        );
        assert_eq!(resolve_recipient(&store, &index, "book").unwrap(), "42@g.us");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn nothing_anywhere_is_not_found_with_guidance() {
        let (store, path) = temp_store("not_found");
        let err = resolve_recipient(&store, &empty_index(), "nobody").unwrap_err();
        assert!(matches!(err, ResolveError::NotFound(_)));
        let text = err.to_string();
        assert!(text.contains("phone number"));
        assert!(text.contains("JID"));
        std::fs::remove_file(&path).ok();
    }
}
