mod class;
mod member;
mod tag;

pub use class::{ClassKind, ClassRecord};
pub use member::{MemberKind, MemberRecord};
pub use tag::DetailTag;

pub(crate) use member::bare_member_name;
