//! Runtime reflection resolver.
//!
//! A live type describes itself by implementing [`Reflect`]. Nested types are
//! referenced through [`TypeRef::reflected`], which defers the call to
//! `T::type_descriptor()` until the compiler descends into the field, so
//! self-referential types can be described without recursing at construction time.
//!
//! ```
//! use handler_schema::descriptor::TypeDescriptor;
//! use handler_schema::reflect::{record, Reflect};
//!
//! struct User {
//!     id: i64,
//!     name: String,
//!     tags: Vec<String>,
//! }
//!
//! impl Reflect for User {
//!     fn type_descriptor() -> TypeDescriptor {
//!         record::<Self>()
//!             .field::<i64>("ID", &[])
//!             .field::<String>("Name", &["validate(required)"])
//!             .field::<Vec<String>>("Tags", &[])
//!             .build()
//!     }
//! }
//! ```

use crate::descriptor::{DeferredType, FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeRef};
use crate::metadata::{ContainerMetadata, FieldMetadata};
use log::debug;
use std::any::type_name;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;
use std::time::SystemTime;

/// A type that can describe its own shape at runtime
pub trait Reflect: 'static {
    fn type_descriptor() -> TypeDescriptor;

    /// Whether a field of this type may be absent (`Option<T>`)
    fn is_optional() -> bool {
        false
    }
}

/// Deferred descriptor of a reflected type, keyed by its `type_name`
struct Reflected {
    identity: &'static str,
    build: fn() -> TypeDescriptor,
}

impl DeferredType for Reflected {
    fn identity(&self) -> &str {
        self.identity
    }

    fn resolve(&self) -> TypeDescriptor {
        (self.build)().with_identity(self.identity)
    }
}

impl TypeRef {
    /// Lazy reference to a reflected type
    pub fn reflected<T: Reflect + ?Sized>() -> Self {
        TypeRef::deferred(Reflected {
            identity: type_name::<T>(),
            build: T::type_descriptor,
        })
    }
}

/// Start describing a record type
pub fn record<T: Reflect + ?Sized>() -> RecordBuilder {
    RecordBuilder {
        identity: type_name::<T>().to_string(),
        fields: Vec::new(),
        container: ContainerMetadata::default(),
    }
}

/// Builder for record descriptors of live types.
///
/// Field tags use attribute syntax, e.g. `"serde(rename = \"userName\")"` or
/// `"validate(length(min = 1))"`.
pub struct RecordBuilder {
    identity: String,
    fields: Vec<FieldDescriptor>,
    container: ContainerMetadata,
}

impl RecordBuilder {
    /// Container-level tags such as `serde(rename_all = "camelCase")` or doc lines
    pub fn container_tags(mut self, tags: &[&str]) -> Self {
        self.container = ContainerMetadata::from_tags(tags);
        self
    }

    pub fn field<T: Reflect + ?Sized>(mut self, name: &str, tags: &[&str]) -> Self {
        let field = FieldDescriptor::new(name, TypeRef::reflected::<T>())
            .with_metadata(FieldMetadata::from_tags(tags))
            .optional(T::is_optional());
        self.fields.push(field);
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::record(self.identity, self.fields, self.container.rename_all)
            .with_description(self.container.description)
    }
}

/// Handle to a type in the running program
#[derive(Debug, Clone)]
pub struct LiveType {
    name: String,
    describe: Option<fn() -> TypeDescriptor>,
}

fn describe_named<T: Reflect + ?Sized>() -> TypeDescriptor {
    T::type_descriptor().with_identity(type_name::<T>())
}

impl LiveType {
    pub fn of<T: Reflect + ?Sized>() -> Self {
        Self {
            name: type_name::<T>().to_string(),
            describe: Some(describe_named::<T>),
        }
    }

    /// Open handle carrying no type information (an "any" value)
    pub fn any(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            describe: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_opaque(&self) -> bool {
        self.describe.is_none()
    }
}

/// Resolves live type handles into descriptors
#[derive(Debug, Default, Clone, Copy)]
pub struct ReflectionResolver;

impl ReflectionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Describe a live type; opaque handles produce a dynamic descriptor
    pub fn resolve(&self, live: &LiveType) -> TypeDescriptor {
        match live.describe {
            Some(describe) => {
                debug!("Reflecting type: {}", live.name);
                describe()
            }
            None => {
                debug!("Opaque handle {}, treating as dynamic", live.name);
                TypeDescriptor::dynamic(live.name.clone())
            }
        }
    }
}

macro_rules! reflect_primitive {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl Reflect for $ty {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::primitive(type_name::<$ty>(), $kind)
                }
            }
        )+
    };
}

reflect_primitive!(PrimitiveKind::Integer { unsigned: false } => i8, i16, i32, i64, i128, isize);
reflect_primitive!(PrimitiveKind::Integer { unsigned: true } => u8, u16, u32, u64, u128, usize);
reflect_primitive!(PrimitiveKind::Float => f32, f64);
reflect_primitive!(PrimitiveKind::String => String, str);
reflect_primitive!(PrimitiveKind::Char => char);
reflect_primitive!(PrimitiveKind::Boolean => bool);
reflect_primitive!(PrimitiveKind::Instant => SystemTime);

macro_rules! reflect_list {
    ($($ty:ident),+) => {
        $(
            impl<T: Reflect> Reflect for $ty<T> {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::list(TypeRef::reflected::<T>())
                }
            }
        )+
    };
}

reflect_list!(Vec, VecDeque, BTreeSet);

impl<T: Reflect, S: 'static> Reflect for HashSet<T, S> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::list(TypeRef::reflected::<T>())
    }
}

impl<T: Reflect> Reflect for [T] {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::list(TypeRef::reflected::<T>())
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::list(TypeRef::reflected::<T>())
    }
}

impl<K: Reflect, V: Reflect, S: 'static> Reflect for HashMap<K, V, S> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::map(TypeRef::reflected::<K>(), TypeRef::reflected::<V>())
    }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::map(TypeRef::reflected::<K>(), TypeRef::reflected::<V>())
    }
}

macro_rules! reflect_pointer {
    ($($ty:ident),+) => {
        $(
            impl<T: Reflect + ?Sized> Reflect for $ty<T> {
                fn type_descriptor() -> TypeDescriptor {
                    TypeDescriptor::pointer(TypeRef::reflected::<T>())
                }
            }
        )+
    };
}

reflect_pointer!(Box, Rc, Arc);

impl<T: Reflect> Reflect for Option<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::optional(TypeRef::reflected::<T>())
    }

    fn is_optional() -> bool {
        true
    }
}

impl Reflect for serde_json::Value {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::dynamic(type_name::<Self>())
    }
}

impl Reflect for serde_json::Map<String, serde_json::Value> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::map(
            TypeRef::reflected::<String>(),
            TypeRef::reflected::<serde_json::Value>(),
        )
    }
}

#[cfg(feature = "chrono")]
mod chrono_impls {
    use super::*;

    impl<Tz: chrono::TimeZone + 'static> Reflect for chrono::DateTime<Tz> {
        fn type_descriptor() -> TypeDescriptor {
            TypeDescriptor::primitive(type_name::<Self>(), PrimitiveKind::Instant)
        }
    }

    reflect_primitive!(PrimitiveKind::Instant => chrono::NaiveDateTime);
    reflect_primitive!(PrimitiveKind::Date => chrono::NaiveDate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SchemaCache;
    use crate::descriptor::Kind;
    use crate::schema_compiler::{ResolutionContext, SchemaCompiler};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct User;

    impl Reflect for User {
        fn type_descriptor() -> TypeDescriptor {
            record::<Self>()
                .field::<i64>("ID", &[])
                .field::<String>("Name", &["validate(required)"])
                .field::<Vec<String>>("Tags", &[])
                .build()
        }
    }

    struct Node;

    impl Reflect for Node {
        fn type_descriptor() -> TypeDescriptor {
            record::<Self>().field::<Option<Box<Node>>>("Next", &[]).build()
        }
    }

    struct Profile;

    impl Reflect for Profile {
        fn type_descriptor() -> TypeDescriptor {
            record::<Self>()
                .container_tags(&["serde(rename_all = \"camelCase\")", "doc = \" A user profile\""])
                .field::<String>("display_name", &["validate(required, length(min = 1))"])
                .field::<Option<String>>("avatar_url", &["validate(required, url)"])
                .build()
        }
    }

    fn compile(live: &LiveType) -> serde_json::Value {
        let descriptor = ReflectionResolver::new().resolve(live);
        let compiler = SchemaCompiler::new(Arc::new(SchemaCache::new()));
        let mut ctx = ResolutionContext::new(".");
        serde_json::to_value(compiler.compile(&descriptor, &mut ctx)).unwrap()
    }

    #[test]
    fn test_record_fields_in_order() {
        let descriptor = ReflectionResolver::new().resolve(&LiveType::of::<User>());
        assert_eq!(descriptor.identity, type_name::<User>());
        match &descriptor.kind {
            Kind::Record { fields, .. } => {
                let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(names, vec!["ID", "Name", "Tags"]);
                assert!(fields[1].metadata.required);
                assert_eq!(fields[2].ty.identity(), type_name::<Vec<String>>());
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_user_schema() {
        assert_eq!(
            compile(&LiveType::of::<User>()),
            json!({
                "type": "object",
                "properties": {
                    "id": {"type": "integer"},
                    "name": {"type": "string"},
                    "tags": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["name"]
            })
        );
    }

    #[test]
    fn test_self_referential_type() {
        let schema = compile(&LiveType::of::<Node>());
        assert_eq!(
            schema["properties"]["next"]["description"],
            json!(format!("circular reference to {}", type_name::<Node>()))
        );
    }

    #[test]
    fn test_option_marks_field_optional() {
        let schema = compile(&LiveType::of::<Profile>());
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "description": "A user profile",
                "properties": {
                    "displayName": {"type": "string", "minLength": 1},
                    "avatarUrl": {"type": "string", "format": "uri"}
                },
                "required": ["displayName"]
            })
        );
    }

    #[test]
    fn test_opaque_handle_is_dynamic() {
        let live = LiveType::any("interface{}");
        assert!(live.is_opaque());
        let descriptor = ReflectionResolver::new().resolve(&live);
        assert!(matches!(descriptor.kind, Kind::Dynamic));
        assert!(!descriptor.is_resolvable());
    }

    #[test]
    fn test_container_impls() {
        assert!(matches!(
            <HashMap<String, u8>>::type_descriptor().kind,
            Kind::Map { .. }
        ));
        assert!(matches!(<[u8; 4]>::type_descriptor().kind, Kind::List(_)));
        assert!(matches!(<Arc<str>>::type_descriptor().kind, Kind::Pointer { .. }));
        assert!(matches!(
            serde_json::Value::type_descriptor().kind,
            Kind::Dynamic
        ));
        assert!(<Option<u8>>::is_optional());
        assert!(!<Box<u8>>::is_optional());
    }

    #[test]
    fn test_reflected_identity_is_type_name() {
        let r = TypeRef::reflected::<BTreeMap<String, u32>>();
        assert_eq!(r.identity(), type_name::<BTreeMap<String, u32>>());
        assert_eq!(r.load().identity, r.identity());
    }

    #[test]
    fn test_unsigned_and_time() {
        let schema = compile(&LiveType::of::<u16>());
        assert_eq!(schema, json!({"type": "integer", "minimum": 0.0}));
        let schema = compile(&LiveType::of::<SystemTime>());
        assert_eq!(schema, json!({"type": "string", "format": "date-time"}));
    }
}
