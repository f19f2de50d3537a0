//! Member records: one parsed method, field, or enum-constant fragment.

use crate::entity::DetailTag;
use crate::fetch::RawMemberFragment;

/// The kind of a member entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// A method declaration
    Method,
    /// An enum constant
    EnumConstant,
    /// A field declaration
    Field,
}

/// Parsed representation of one member fragment.
///
/// Immutable once constructed; memoized by `location` so an identical
/// location always yields the identical record for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    /// Page location plus `#fragment` anchor
    pub location: String,
    /// Bare member name, without parameter text
    pub name: String,
    /// Member kind
    pub kind: MemberKind,
    /// Signature text as declared, kept for methods so overloads stay apart
    pub signature: Option<String>,
    /// Plain description text
    pub description: String,
    /// Raw description markup
    pub raw_description: String,
    /// Labeled detail blocks ("Parameters:", "Returns:", "Since:", ...)
    pub extra_info: Vec<DetailTag>,
}

impl MemberRecord {
    /// Build a member record from a fetched fragment.
    pub(crate) fn from_raw(
        location: impl Into<String>,
        name: impl Into<String>,
        kind: MemberKind,
        signature: Option<String>,
        raw: RawMemberFragment,
    ) -> Self {
        Self {
            location: location.into(),
            name: name.into(),
            kind,
            signature,
            description: raw.description,
            raw_description: raw.raw_description,
            extra_info: raw.extra_info,
        }
    }
}

/// Strip parameter text from a member map key: `indexOf(int, int)` →
/// `indexOf`. Non-method keys pass through unchanged.
pub(crate) fn bare_member_name(key: &str) -> &str {
    match key.split_once('(') {
        Some((name, _)) => name.trim(),
        None => key.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_member_name_strips_parameters() {
        assert_eq!(bare_member_name("indexOf(int, int)"), "indexOf");
        assert_eq!(bare_member_name("indexOf (String)"), "indexOf");
    }

    #[test]
    fn test_bare_member_name_passes_fields_through() {
        assert_eq!(bare_member_name("CASE_INSENSITIVE_ORDER"), "CASE_INSENSITIVE_ORDER");
    }
}
