//! Per-type property schemas.
//!
//! Every object reachable through a property path declares a [`Schema`]:
//! a table from property name to its capability, built once per type.
//!
//! ```text
//! Schema<Person>
//! ├── Name      Field(Scalar)      get / set via FromStr
//! ├── Tags      Field(Structured)  get / set via JSON
//! ├── Address   Field(Object)      get / descend
//! ├── Items     Field(Structured)  get (read-only)
//! ├── Greet     Command            exec(arg)
//! └── accessors
//!     └── Items_get                (key) -> element
//! ```
//!
//! # Modules
//!
//! - `convert` - Text payload conversion
//! - `error` - Path resolution errors
//! - `node` - Type-erased [`Node`] view over a schema-backed value

pub mod convert;
mod error;
mod node;

use std::fmt::Display;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use convert::{parse_scalar, parse_structured, to_value};

pub use error::PathError;
pub use node::{Bindable, Node};

/// Suffix appended to a collection property's name to find its keyed accessor.
pub const KEYED_ACCESSOR_SUFFIX: &str = "_get";

/// Marker that opens a keyed-lookup path segment (`Items.$42.Title`).
pub const KEY_MARKER: char = '$';

type Getter<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, &str) -> Result<(), PathError> + Send + Sync>;
type Descend<T> = Box<dyn for<'a> Fn(&'a mut T) -> Option<&'a mut dyn Node> + Send + Sync>;
type Accessor<T> =
    Box<dyn for<'a, 'k> Fn(&'a mut T, &'k str) -> Option<&'a mut dyn Node> + Send + Sync>;
type Exec<T> = Box<dyn Fn(&mut T, &str) + Send + Sync>;

/// Conventional accessor name for a collection property.
pub fn accessor_name(property: &str) -> String {
    format!("{property}{KEYED_ACCESSOR_SUFFIX}")
}

// =============================================================================
// Members
// =============================================================================

/// How a field's text payload is turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Parsed with `FromStr`.
    Scalar,
    /// Deserialized from JSON text.
    Structured,
    /// Nested schema-backed object, path traversal descends into it.
    Object,
}

/// Erased description of a member, used by path traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field { kind: ValueKind, writable: bool },
    Command,
}

/// A readable (and possibly writable) property.
pub struct Field<T> {
    kind: ValueKind,
    get: Getter<T>,
    set: Option<Setter<T>>,
    descend: Option<Descend<T>>,
}

/// A property whose write executes an action instead of assigning.
pub struct Command<T> {
    exec: Exec<T>,
}

/// Tagged schema entry.
pub enum Member<T> {
    Field(Field<T>),
    Command(Command<T>),
}

impl<T> Member<T> {
    pub fn kind(&self) -> MemberKind {
        match self {
            Member::Field(field) => MemberKind::Field {
                kind: field.kind,
                writable: field.set.is_some(),
            },
            Member::Command(_) => MemberKind::Command,
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

/// Property table of a single type.
pub struct Schema<T> {
    type_name: &'static str,
    members: Vec<(&'static str, Member<T>)>,
    index: FxHashMap<&'static str, usize>,
    accessors: FxHashMap<String, Accessor<T>>,
}

impl<T: 'static> Schema<T> {
    pub fn builder(type_name: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder {
            schema: Schema {
                type_name,
                members: Vec::new(),
                index: FxHashMap::default(),
                accessors: FxHashMap::default(),
            },
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn member(&self, name: &str) -> Option<&Member<T>> {
        self.index.get(name).map(|&i| &self.members[i].1)
    }

    /// Members in declaration order.
    pub fn members(&self) -> impl Iterator<Item = (&'static str, &Member<T>)> {
        self.members.iter().map(|(name, member)| (*name, member))
    }

    /// Look up a keyed accessor by its conventional name (`Items_get`).
    pub fn accessor(&self, accessor: &str) -> Option<&Accessor<T>> {
        self.accessors.get(accessor)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn read(&self, target: &T, name: &str) -> Option<Value> {
        match self.member(name)? {
            Member::Field(field) => Some((field.get)(target)),
            Member::Command(_) => None,
        }
    }

    fn write(&self, target: &mut T, name: &str, raw: &str) -> Result<(), PathError> {
        match self.member(name) {
            Some(Member::Field(Field { set: Some(set), .. })) => set(target, raw),
            Some(_) => Err(PathError::ReadOnly {
                type_name: self.type_name,
                name: name.to_string(),
            }),
            None => Err(self.unknown(name)),
        }
    }

    fn execute(&self, target: &mut T, name: &str, arg: &str) -> Result<(), PathError> {
        match self.member(name) {
            Some(Member::Command(command)) => {
                (command.exec)(target, arg);
                Ok(())
            }
            Some(Member::Field(_)) => Err(PathError::NotAnObject {
                type_name: self.type_name,
                name: name.to_string(),
            }),
            None => Err(self.unknown(name)),
        }
    }

    fn unknown(&self, name: &str) -> PathError {
        PathError::UnknownProperty {
            type_name: self.type_name,
            name: name.to_string(),
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds a [`Schema`] one member at a time.
///
/// # Example
///
/// ```ignore
/// Schema::builder("Person")
///     .scalar("Name", |p: &Person| p.name.clone(), Person::set_name)
///     .structured("Tags", |p: &Person| p.tags.clone(), |p, v| p.tags = v)
///     .command("Greet", |p, arg| p.greet(arg))
///     .build()
/// ```
pub struct SchemaBuilder<T> {
    schema: Schema<T>,
}

impl<T: 'static> SchemaBuilder<T> {
    /// Field converted from text with `FromStr`.
    pub fn scalar<V, G, S>(self, name: &'static str, get: G, set: S) -> Self
    where
        V: FromStr + Serialize + 'static,
        V::Err: Display,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let getter: Getter<T> = Box::new(move |t: &T| to_value(&get(t)));
        let setter: Setter<T> = Box::new(move |t: &mut T, raw: &str| {
            set(t, parse_scalar::<V>(name, raw)?);
            Ok(())
        });
        self.field(name, ValueKind::Scalar, getter, Some(setter), None)
    }

    /// Field deserialized from JSON text.
    pub fn structured<V, G, S>(self, name: &'static str, get: G, set: S) -> Self
    where
        V: DeserializeOwned + Serialize + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let getter: Getter<T> = Box::new(move |t: &T| to_value(&get(t)));
        let setter: Setter<T> = Box::new(move |t: &mut T, raw: &str| {
            set(t, parse_structured::<V>(name, raw)?);
            Ok(())
        });
        self.field(name, ValueKind::Structured, getter, Some(setter), None)
    }

    /// Field that can be read and serialized but never assigned.
    pub fn read_only<V, G>(self, name: &'static str, get: G) -> Self
    where
        V: Serialize + 'static,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        let getter: Getter<T> = Box::new(move |t: &T| to_value(&get(t)));
        self.field(name, ValueKind::Structured, getter, None, None)
    }

    /// Nested object property. `None` means the property currently holds no object.
    pub fn child<C, G, M>(self, name: &'static str, get: G, get_mut: M) -> Self
    where
        C: Bindable,
        G: Fn(&T) -> Option<&C> + Send + Sync + 'static,
        M: Fn(&mut T) -> Option<&mut C> + Send + Sync + 'static,
    {
        let getter: Getter<T> = Box::new(move |t: &T| {
            get(t)
                .map(|c| Value::Object(c.snapshot()))
                .unwrap_or(Value::Null)
        });
        let descend: Descend<T> =
            Box::new(descend_fn::<T, _>(move |t| get_mut(t).map(|c| c as &mut dyn Node)));
        self.field(name, ValueKind::Object, getter, None, Some(descend))
    }

    /// Keyed accessor for a collection property, registered as `<name>_get`.
    ///
    /// The collection itself still has to be declared as a field.
    pub fn keyed<I, A>(mut self, name: &'static str, accessor: A) -> Self
    where
        I: Bindable,
        A: for<'a, 'k> Fn(&'a mut T, &'k str) -> Option<&'a mut I> + Send + Sync + 'static,
    {
        let accessor: Accessor<T> = Box::new(accessor_fn::<T, _>(move |t, key| {
            accessor(t, key).map(|item| item as &mut dyn Node)
        }));
        self.schema.accessors.insert(accessor_name(name), accessor);
        self
    }

    /// Property whose write runs `exec` with the written text.
    pub fn command<E>(self, name: &'static str, exec: E) -> Self
    where
        E: Fn(&mut T, &str) + Send + Sync + 'static,
    {
        self.member(
            name,
            Member::Command(Command {
                exec: Box::new(exec),
            }),
        )
    }

    pub fn build(self) -> Schema<T> {
        self.schema
    }

    fn field(
        self,
        name: &'static str,
        kind: ValueKind,
        get: Getter<T>,
        set: Option<Setter<T>>,
        descend: Option<Descend<T>>,
    ) -> Self {
        self.member(
            name,
            Member::Field(Field {
                kind,
                get,
                set,
                descend,
            }),
        )
    }

    fn member(mut self, name: &'static str, member: Member<T>) -> Self {
        let schema = &mut self.schema;
        match schema.index.get(name) {
            Some(&i) => schema.members[i].1 = member,
            None => {
                schema.index.insert(name, schema.members.len());
                schema.members.push((name, member));
            }
        }
        self
    }
}

// Pin the higher-ranked signatures so closures returning borrows infer correctly.
fn descend_fn<T, F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut T) -> Option<&'a mut dyn Node>,
{
    f
}

fn accessor_fn<T, F>(f: F) -> F
where
    F: for<'a, 'k> Fn(&'a mut T, &'k str) -> Option<&'a mut dyn Node>,
{
    f
}
