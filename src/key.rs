//! Component identity
//!
//! A [`ComponentKey`] is what callers ask the container for: a type token,
//! optionally qualified by a [`Tag`]. Two keys are equal iff both the type
//! token and the tag match.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Object-safe view of a tag value.
trait DynTag: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn DynTag) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
    fn dyn_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T> DynTag for T
where
    T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynTag) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        // Tags of different concrete types never compare equal, so fold the
        // type into the hash as well.
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn dyn_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Opaque, comparable qualifier for a component identity.
///
/// Any `Hash + Eq + Debug + Send + Sync + 'static` value can be a tag. Tags
/// are equal only when they hold the same concrete type and equal values.
/// String tags are normalized, so `Tag::from("disk")` equals
/// `Tag::from(String::from("disk"))`.
///
/// # Examples
///
/// ```rust
/// use inject_container::Tag;
///
/// #[derive(Debug, Hash, PartialEq, Eq)]
/// enum Backend { Memory, Disk }
///
/// assert_eq!(Tag::from("disk"), Tag::from(String::from("disk")));
/// assert_eq!(Tag::new(Backend::Disk), Tag::new(Backend::Disk));
/// assert_ne!(Tag::new(Backend::Disk), Tag::new(Backend::Memory));
/// assert_ne!(Tag::from(1u32), Tag::from(1u64));
/// ```
#[derive(Clone)]
pub struct Tag(Arc<dyn DynTag>);

impl Tag {
    /// Wrap any hashable value as a tag.
    #[inline]
    pub fn new<T>(value: T) -> Self
    where
        T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        Self(Arc::new(value))
    }

    /// Borrow the tag value if it has concrete type `T`.
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.dyn_eq(&*other.0)
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.dyn_hash(state);
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.dyn_fmt(f)
    }
}

impl From<&'static str> for Tag {
    fn from(value: &'static str) -> Self {
        Self::new(Cow::<'static, str>::Borrowed(value))
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Self::new(Cow::<'static, str>::Owned(value))
    }
}

macro_rules! tag_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Tag {
                fn from(value: $ty) -> Self {
                    Self::new(value)
                }
            }
        )*
    };
}

tag_from_int!(u32, u64, i32, i64, usize);

/// Identity of a component: type token plus optional tag.
///
/// The type name is carried for diagnostics only and does not take part in
/// equality or hashing.
#[derive(Clone)]
pub struct ComponentKey {
    type_id: TypeId,
    type_name: &'static str,
    tag: Option<Tag>,
}

impl ComponentKey {
    /// Untagged identity for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            tag: None,
        }
    }

    /// Identity for `T` qualified by `tag`.
    #[inline]
    pub fn tagged<T: ?Sized + 'static>(tag: impl Into<Tag>) -> Self {
        Self::of::<T>().with_tag(tag)
    }

    /// Replace the tag of this identity.
    #[inline]
    pub fn with_tag(mut self, tag: impl Into<Tag>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    /// Whether this identity names type `T`, regardless of tag.
    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for ComponentKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.tag == other.tag
    }
}

impl Eq for ComponentKey {}

impl Hash for ComponentKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.tag.hash(state);
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}[{:?}]", self.type_name, tag),
            None => f.write_str(self.type_name),
        }
    }
}

impl fmt::Debug for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentKey")
            .field("type_name", &self.type_name)
            .field("tag", &self.tag)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Storage;
    struct Logger;

    #[derive(Debug, Hash, PartialEq, Eq)]
    enum Backend {
        Memory,
        Disk,
    }

    #[test]
    fn test_string_tags_normalize() {
        assert_eq!(Tag::from("disk"), Tag::from("disk".to_string()));
        assert_ne!(Tag::from("disk"), Tag::from("memory"));
    }

    #[test]
    fn test_tags_of_different_types_differ() {
        assert_ne!(Tag::from(7u32), Tag::from(7u64));
        assert_ne!(Tag::from(7i32), Tag::from("7"));
        assert_eq!(Tag::new(Backend::Disk), Tag::new(Backend::Disk));
        assert_ne!(Tag::new(Backend::Disk), Tag::new(Backend::Memory));
    }

    #[test]
    fn test_tag_downcast() {
        let tag = Tag::new(Backend::Memory);
        assert_eq!(tag.downcast_ref::<Backend>(), Some(&Backend::Memory));
        assert!(tag.downcast_ref::<u32>().is_none());
    }

    #[test]
    fn test_key_equality() {
        assert_eq!(ComponentKey::of::<Storage>(), ComponentKey::of::<Storage>());
        assert_ne!(ComponentKey::of::<Storage>(), ComponentKey::of::<Logger>());
        assert_ne!(
            ComponentKey::of::<Storage>(),
            ComponentKey::tagged::<Storage>("disk")
        );
        assert_eq!(
            ComponentKey::tagged::<Storage>("disk"),
            ComponentKey::tagged::<Storage>("disk".to_string())
        );
        assert_ne!(
            ComponentKey::tagged::<Storage>("disk"),
            ComponentKey::tagged::<Storage>("memory")
        );
    }

    #[test]
    fn test_key_hashing() {
        let mut set = HashSet::new();
        set.insert(ComponentKey::tagged::<Storage>("disk"));
        set.insert(ComponentKey::tagged::<Storage>("disk".to_string()));
        set.insert(ComponentKey::tagged::<Storage>("memory"));
        set.insert(ComponentKey::of::<Storage>());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_key_display() {
        let plain = ComponentKey::of::<Storage>();
        let tagged = ComponentKey::tagged::<Storage>("disk");

        assert!(plain.to_string().ends_with("Storage"));
        assert!(tagged.to_string().ends_with("Storage[\"disk\"]"));
        assert!(tagged.is::<Storage>());
        assert!(!tagged.is::<Logger>());
    }
}
