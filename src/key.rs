//! Composite cache keys.
//!
//! A [`CacheKey`] identifies one cacheable unit of work as an ordered list of
//! sub-keys, typically one per pipeline component. Equality and hashing are
//! defined by the key's canonical string.
//!
//! ## Canonical Form
//!
//! ```text
//!   parts:      ["AB", "C"]            ["A", "BC"]
//!   canonical:  PK|2:AB|1:C            PK|1:A|2:BC
//!               ▲  ▲                   (different keys)
//!               │  └─ length-prefixed part
//!               └──── fixed tag
//! ```
//!
//! Every part is framed as `<byte length>:<text>`, so part boundaries are
//! recoverable and two different part sequences never share a canonical
//! string. Raw concatenation would make `"AB" + "C"` equal to `"A" + "BC"`.
//!
//! ## Example Usage
//!
//! ```
//! use mrucache::key::{CacheKey, ComponentKey, ComponentKind};
//!
//! let key = CacheKey::new()
//!     .with(ComponentKey::new(ComponentKind::Generator, "file", 42))
//!     .with(ComponentKey::new(ComponentKind::Serializer, "html", 7));
//! assert_eq!(key.len(), 2);
//!
//! assert_ne!(CacheKey::from_parts(["AB", "C"]), CacheKey::from_parts(["A", "BC"]));
//! ```

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

const KEY_TAG: &str = "PK";

/// A value that can contribute one sub-key to a [`CacheKey`].
pub trait KeyPart {
    /// Returns this part's canonical text, before framing.
    fn key_part(&self) -> Cow<'_, str>;
}

impl KeyPart for str {
    fn key_part(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl KeyPart for String {
    fn key_part(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl<T: KeyPart + ?Sized> KeyPart for &T {
    fn key_part(&self) -> Cow<'_, str> {
        (**self).key_part()
    }
}

macro_rules! int_key_part {
    ($($ty:ty),*) => {
        $(
            impl KeyPart for $ty {
                fn key_part(&self) -> Cow<'_, str> {
                    Cow::Owned(self.to_string())
                }
            }
        )*
    };
}

int_key_part!(u32, u64, i32, i64, usize);

/// Role of a pipeline component contributing to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Generator,
    Transformer,
    Serializer,
    Reader,
}

impl ComponentKind {
    fn tag(self) -> char {
        match self {
            Self::Generator => 'G',
            Self::Transformer => 'T',
            Self::Serializer => 'S',
            Self::Reader => 'R',
        }
    }
}

/// Sub-key for one pipeline component: its role, its identifier within the
/// pipeline and the key it generated for the current request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    kind: ComponentKind,
    id: String,
    key: u64,
}

impl ComponentKey {
    pub fn new(kind: ComponentKind, id: impl Into<String>, key: u64) -> Self {
        Self {
            kind,
            id: id.into(),
            key,
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> u64 {
        self.key
    }
}

impl KeyPart for ComponentKey {
    fn key_part(&self) -> Cow<'_, str> {
        // The id is framed so that ids containing '-' stay unambiguous.
        Cow::Owned(format!(
            "{}{}:{}-{}",
            self.kind.tag(),
            self.id.len(),
            self.id,
            self.key
        ))
    }
}

/// Ordered composite key for a cacheable unit of work.
#[derive(Clone)]
pub struct CacheKey {
    parts: usize,
    canonical: String,
}

impl CacheKey {
    /// Creates a key with no parts.
    pub fn new() -> Self {
        Self {
            parts: 0,
            canonical: String::from(KEY_TAG),
        }
    }

    /// Creates a key from parts, in order.
    pub fn from_parts<I>(parts: I) -> Self
    where
        I: IntoIterator,
        I::Item: KeyPart,
    {
        let mut key = Self::new();
        for part in parts {
            key.push(&part);
        }
        key
    }

    /// Appends a part.
    pub fn push<P: KeyPart + ?Sized>(&mut self, part: &P) {
        let text = part.key_part();
        self.canonical.push('|');
        self.canonical.push_str(&text.len().to_string());
        self.canonical.push(':');
        self.canonical.push_str(&text);
        self.parts += 1;
    }

    /// Appends a part, builder style.
    pub fn with<P: KeyPart>(mut self, part: P) -> Self {
        self.push(&part);
        self
    }

    /// Number of parts.
    pub fn len(&self) -> usize {
        self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts == 0
    }

    /// The canonical string that defines equality and hashing.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl Default for CacheKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacheKey").field(&self.canonical).finish()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl KeyPart for CacheKey {
    fn key_part(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.canonical)
    }
}
