//! Type-erased access to schema-backed values.

use serde_json::{Map, Value};

use super::{Member, MemberKind, PathError, Schema, accessor_name};

/// A type that declares a property [`Schema`].
///
/// The schema is built once, typically in a `LazyLock` static:
///
/// ```ignore
/// impl Bindable for Address {
///     fn schema() -> &'static Schema<Self> {
///         static SCHEMA: LazyLock<Schema<Address>> = LazyLock::new(|| {
///             Schema::builder("Address")
///                 .scalar("City", |a: &Address| a.city.clone(), |a, v| a.city = v)
///                 .build()
///         });
///         &SCHEMA
///     }
/// }
/// ```
pub trait Bindable: Send + Sized + 'static {
    fn schema() -> &'static Schema<Self>;
}

/// Object-safe view of any value reachable through a property path.
///
/// Implemented for every [`Bindable`] type.
pub trait Node: Send {
    fn type_name(&self) -> &'static str;

    fn member_kind(&self, name: &str) -> Option<MemberKind>;

    /// Current value of a field, `None` for commands and unknown names.
    fn read(&self, name: &str) -> Option<Value>;

    /// All fields in declaration order. Commands are skipped.
    fn snapshot(&self) -> Map<String, Value>;

    /// Convert `raw` into the field's declared type and assign it.
    fn write(&mut self, name: &str, raw: &str) -> Result<(), PathError>;

    /// Run a command with `arg` as its parameter.
    fn execute(&mut self, name: &str, arg: &str) -> Result<(), PathError>;

    /// Step into the object held by an object property.
    fn descend(&mut self, name: &str) -> Result<&mut dyn Node, PathError>;

    /// Step into a collection element through the `<name>_get` accessor.
    fn keyed(&mut self, name: &str, key: &str) -> Result<&mut dyn Node, PathError>;
}

impl<T: Bindable> Node for T {
    fn type_name(&self) -> &'static str {
        T::schema().type_name()
    }

    fn member_kind(&self, name: &str) -> Option<MemberKind> {
        T::schema().member(name).map(Member::kind)
    }

    fn read(&self, name: &str) -> Option<Value> {
        T::schema().read(self, name)
    }

    fn snapshot(&self) -> Map<String, Value> {
        T::schema()
            .members()
            .filter_map(|(name, member)| match member {
                Member::Field(field) => Some((name.to_string(), (field.get)(self))),
                Member::Command(_) => None,
            })
            .collect()
    }

    fn write(&mut self, name: &str, raw: &str) -> Result<(), PathError> {
        T::schema().write(self, name, raw)
    }

    fn execute(&mut self, name: &str, arg: &str) -> Result<(), PathError> {
        T::schema().execute(self, name, arg)
    }

    fn descend(&mut self, name: &str) -> Result<&mut dyn Node, PathError> {
        let schema = T::schema();
        match schema.member(name) {
            Some(Member::Field(field)) => match &field.descend {
                Some(descend) => descend(self).ok_or_else(|| PathError::AbsentValue {
                    type_name: schema.type_name(),
                    name: name.to_string(),
                }),
                None => Err(PathError::NotAnObject {
                    type_name: schema.type_name(),
                    name: name.to_string(),
                }),
            },
            Some(Member::Command(_)) => Err(PathError::NotAnObject {
                type_name: schema.type_name(),
                name: name.to_string(),
            }),
            None => Err(schema.unknown(name)),
        }
    }

    fn keyed(&mut self, name: &str, key: &str) -> Result<&mut dyn Node, PathError> {
        let schema = T::schema();
        let accessor = accessor_name(name);
        match schema.accessor(&accessor) {
            Some(get) => get(self, key).ok_or_else(|| PathError::AbsentValue {
                type_name: schema.type_name(),
                name: format!("{name}[{key}]"),
            }),
            None => Err(PathError::MissingAccessor {
                type_name: schema.type_name(),
                accessor,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Address, Item, Person};

    #[test]
    fn test_snapshot_skips_commands() {
        let person = Person::default();
        let snapshot = person.snapshot();
        assert!(snapshot.contains_key("Name"));
        assert!(snapshot.contains_key("Age"));
        assert!(!snapshot.contains_key("Greet"));
    }

    #[test]
    fn test_snapshot_nests_children() {
        let mut person = Person::default();
        person.address = Some(Address::new("Oslo"));
        let snapshot = person.snapshot();
        assert_eq!(snapshot["Address"]["City"], "Oslo");

        person.address = None;
        assert_eq!(person.snapshot()["Address"], Value::Null);
    }

    #[test]
    fn test_write_and_read() {
        let mut person = Person::default();
        person.write("Tags", r#"["x","y"]"#).unwrap();
        assert_eq!(person.read("Tags"), Some(serde_json::json!(["x", "y"])));
        assert!(person.read("Greet").is_none());
    }

    #[test]
    fn test_write_read_only_fails() {
        let mut person = Person::default();
        let err = person.write("Items", "[]").unwrap_err();
        assert!(matches!(err, PathError::ReadOnly { .. }));
    }

    #[test]
    fn test_descend_absent_child() {
        let mut person = Person::default();
        person.address = None;
        let err = person.descend("Address").map(|_| ()).unwrap_err();
        assert!(matches!(err, PathError::AbsentValue { .. }));

        let err = person.descend("Name").map(|_| ()).unwrap_err();
        assert!(matches!(err, PathError::NotAnObject { .. }));
    }

    #[test]
    fn test_keyed_lookup() {
        let mut person = Person::default();
        person.items = vec![Item::new(42, "old")];

        let item = person.keyed("Items", "42").unwrap();
        assert_eq!(item.type_name(), "Item");
        item.write("Title", "new").unwrap();
        assert_eq!(person.items[0].title, "new");

        let err = person.keyed("Items", "7").map(|_| ()).unwrap_err();
        assert!(matches!(err, PathError::AbsentValue { .. }));

        let err = person.keyed("Tags", "0").map(|_| ()).unwrap_err();
        assert!(matches!(err, PathError::MissingAccessor { ref accessor, .. } if accessor == "Tags_get"));
    }
}
