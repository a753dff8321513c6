//! Strategy-agnostic description of a type's shape.
//!
//! Both the reflection resolver and the static source resolver produce
//! [`TypeDescriptor`]s; the schema compiler consumes nothing else. Nested types are
//! held as [`TypeRef`]s so that recursive type graphs (`Node { next: Option<Box<Node>> }`)
//! can be described without being expanded up front: a deferred reference knows its
//! identity cheaply and produces the descriptor only when the compiler descends into it.

use crate::metadata::{FieldMetadata, RenameRule};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Upper bound on wrapper hops followed when classifying a map key
const MAX_KEY_HOPS: usize = 32;

/// Scalar categories a primitive descriptor can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    String,
    Char,
    Boolean,
    /// Integers; unsigned ones get a non-negative constraint
    Integer { unsigned: bool },
    Float,
    /// Point in time, serialized as RFC 3339 date-time
    Instant,
    /// Calendar date without time
    Date,
    Uuid,
}

/// A type whose descriptor is produced on demand.
///
/// `identity` must be available without resolving, since the compiler uses it for
/// cache lookups and cycle detection before descending.
pub trait DeferredType: Send + Sync {
    fn identity(&self) -> &str;
    fn resolve(&self) -> TypeDescriptor;
}

/// Reference to a nested type, either already built or produced lazily
#[derive(Clone)]
pub enum TypeRef {
    Ready(Arc<TypeDescriptor>),
    Deferred(Arc<dyn DeferredType>),
}

impl TypeRef {
    pub fn ready(descriptor: TypeDescriptor) -> Self {
        TypeRef::Ready(Arc::new(descriptor))
    }

    pub fn deferred<D: DeferredType + 'static>(deferred: D) -> Self {
        TypeRef::Deferred(Arc::new(deferred))
    }

    pub fn identity(&self) -> &str {
        match self {
            TypeRef::Ready(descriptor) => &descriptor.identity,
            TypeRef::Deferred(deferred) => deferred.identity(),
        }
    }

    /// Produce the referenced descriptor
    pub fn load(&self) -> Arc<TypeDescriptor> {
        match self {
            TypeRef::Ready(descriptor) => Arc::clone(descriptor),
            TypeRef::Deferred(deferred) => Arc::new(deferred.resolve()),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only the identity: deferred graphs may be cyclic.
        write!(f, "TypeRef({})", self.identity())
    }
}

/// A field of a record type
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Declared field name, before any renaming
    pub name: String,
    /// Declared type of the field
    pub ty: TypeRef,
    /// Annotations attached to the field
    pub metadata: FieldMetadata,
    /// Declared as `Option<T>`; never required
    pub optional: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            metadata: FieldMetadata::default(),
            optional: false,
        }
    }

    pub fn with_metadata(mut self, metadata: FieldMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }
}

/// An enum variant; `payload` is `None` for unit variants
#[derive(Debug, Clone)]
pub struct Variant {
    pub name: String,
    pub payload: Option<TypeRef>,
}

impl Variant {
    pub fn unit(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    pub fn with_payload(name: impl Into<String>, payload: TypeRef) -> Self {
        Self {
            name: name.into(),
            payload: Some(payload),
        }
    }
}

/// What a type looks like
#[derive(Debug, Clone)]
pub enum Kind {
    Primitive(PrimitiveKind),
    Record {
        fields: Vec<FieldDescriptor>,
        /// Container-level casing rule applied to fields without an override
        rename_all: Option<RenameRule>,
    },
    List(TypeRef),
    Map {
        key: TypeRef,
        value: TypeRef,
    },
    /// Transparent wrapper (`Box`, `Arc`, `&T`, `Option`, aliases, newtypes)
    Pointer {
        target: TypeRef,
        optional: bool,
    },
    Enum(Vec<Variant>),
    /// Untyped value, accepts anything
    Dynamic,
    /// No schema mapping exists; carries the reason
    Unsupported(String),
}

/// Normalized, immutable description of a type
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Stable key used for caching and cycle detection
    pub identity: String,
    pub kind: Kind,
    /// Human-readable description taken from doc comments, if any
    pub description: Option<String>,
}

impl TypeDescriptor {
    pub fn new(identity: impl Into<String>, kind: Kind) -> Self {
        Self {
            identity: identity.into(),
            kind,
            description: None,
        }
    }

    pub fn primitive(identity: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self::new(identity, Kind::Primitive(kind))
    }

    pub fn record(
        identity: impl Into<String>,
        fields: Vec<FieldDescriptor>,
        rename_all: Option<RenameRule>,
    ) -> Self {
        Self::new(identity, Kind::Record { fields, rename_all })
    }

    pub fn list(element: TypeRef) -> Self {
        let identity = format!("Vec<{}>", element.identity());
        Self::new(identity, Kind::List(element))
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        let identity = format!("Map<{}, {}>", key.identity(), value.identity());
        Self::new(identity, Kind::Map { key, value })
    }

    pub fn pointer(target: TypeRef) -> Self {
        let identity = format!("Box<{}>", target.identity());
        Self::new(
            identity,
            Kind::Pointer {
                target,
                optional: false,
            },
        )
    }

    pub fn optional(target: TypeRef) -> Self {
        let identity = format!("Option<{}>", target.identity());
        Self::new(
            identity,
            Kind::Pointer {
                target,
                optional: true,
            },
        )
    }

    pub fn enumeration(identity: impl Into<String>, variants: Vec<Variant>) -> Self {
        Self::new(identity, Kind::Enum(variants))
    }

    pub fn dynamic(identity: impl Into<String>) -> Self {
        Self::new(identity, Kind::Dynamic)
    }

    pub fn unsupported(identity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(identity, Kind::Unsupported(reason.into()))
    }

    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = identity.into();
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Whether the descriptor carries usable structure.
    ///
    /// Records need at least one field; untyped and unsupported shapes carry nothing.
    pub fn is_resolvable(&self) -> bool {
        match &self.kind {
            Kind::Record { fields, .. } => !fields.is_empty(),
            Kind::Enum(variants) => !variants.is_empty(),
            Kind::Primitive(_) | Kind::List(_) | Kind::Map { .. } | Kind::Pointer { .. } => true,
            Kind::Dynamic | Kind::Unsupported(_) => false,
        }
    }

    /// Whether values of this type serialize as JSON strings (usable as object keys).
    ///
    /// Pointer chains are followed until an identity repeats; a cyclic chain is not a key.
    pub fn is_string_key(&self) -> bool {
        let mut seen = HashSet::new();
        let mut current: Option<Arc<TypeDescriptor>> = None;
        loop {
            let descriptor = current.as_deref().unwrap_or(self);
            if !seen.insert(descriptor.identity.clone()) {
                return false;
            }
            if seen.len() > MAX_KEY_HOPS {
                return false;
            }
            let next = match &descriptor.kind {
                Kind::Primitive(
                    PrimitiveKind::String | PrimitiveKind::Char | PrimitiveKind::Uuid,
                ) => return true,
                Kind::Enum(variants) => return variants.iter().all(|v| v.payload.is_none()),
                Kind::Pointer { target, .. } => target.load(),
                _ => return false,
            };
            current = Some(next);
        }
    }

    /// Module part of a `path::Name` identity, if any
    pub fn module_path(&self) -> Option<&str> {
        let base = self.identity.split('<').next().unwrap_or(&self.identity);
        base.rfind("::").map(|idx| &base[..idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lazy {
        identity: String,
    }

    impl DeferredType for Lazy {
        fn identity(&self) -> &str {
            &self.identity
        }

        fn resolve(&self) -> TypeDescriptor {
            TypeDescriptor::primitive(self.identity.clone(), PrimitiveKind::String)
        }
    }

    #[test]
    fn test_synthetic_identities() {
        let string = TypeRef::ready(TypeDescriptor::primitive("String", PrimitiveKind::String));
        let int = TypeRef::ready(TypeDescriptor::primitive(
            "u32",
            PrimitiveKind::Integer { unsigned: true },
        ));

        assert_eq!(TypeDescriptor::list(string.clone()).identity, "Vec<String>");
        assert_eq!(
            TypeDescriptor::map(string.clone(), int.clone()).identity,
            "Map<String, u32>"
        );
        assert_eq!(TypeDescriptor::pointer(int.clone()).identity, "Box<u32>");
        assert_eq!(TypeDescriptor::optional(int).identity, "Option<u32>");
    }

    #[test]
    fn test_deferred_identity_without_resolving() {
        let r = TypeRef::deferred(Lazy {
            identity: "crate::models::User".to_string(),
        });
        assert_eq!(r.identity(), "crate::models::User");
        assert_eq!(format!("{:?}", r), "TypeRef(crate::models::User)");
        assert!(matches!(
            r.load().kind,
            Kind::Primitive(PrimitiveKind::String)
        ));
    }

    #[test]
    fn test_is_resolvable() {
        assert!(!TypeDescriptor::record("Empty", vec![], None).is_resolvable());
        assert!(!TypeDescriptor::dynamic("any").is_resolvable());
        assert!(!TypeDescriptor::unsupported("F", "function").is_resolvable());
        assert!(TypeDescriptor::primitive("bool", PrimitiveKind::Boolean).is_resolvable());
    }

    #[test]
    fn test_string_keys() {
        let string = TypeRef::ready(TypeDescriptor::primitive("String", PrimitiveKind::String));
        assert!(TypeDescriptor::pointer(string).is_string_key());
        assert!(!TypeDescriptor::primitive("i64", PrimitiveKind::Integer { unsigned: false })
            .is_string_key());
        let status =
            TypeDescriptor::enumeration("Status", vec![Variant::unit("A"), Variant::unit("B")]);
        assert!(status.is_string_key());
    }

    struct SelfKey;

    impl DeferredType for SelfKey {
        fn identity(&self) -> &str {
            "crate::Key"
        }

        // struct Key(Option<Box<Key>>)
        fn resolve(&self) -> TypeDescriptor {
            let boxed = TypeDescriptor::pointer(TypeRef::deferred(SelfKey));
            let optional = TypeDescriptor::optional(TypeRef::ready(boxed));
            TypeDescriptor::pointer(TypeRef::ready(optional)).with_identity("crate::Key")
        }
    }

    #[test]
    fn test_recursive_newtype_is_not_a_string_key() {
        assert!(!TypeRef::deferred(SelfKey).load().is_string_key());
    }

    #[test]
    fn test_module_path() {
        let d = TypeDescriptor::record("crate::models::Page<crate::models::User>", vec![], None);
        assert_eq!(d.module_path(), Some("crate::models"));
        assert_eq!(TypeDescriptor::dynamic("any").module_path(), None);
    }
}
