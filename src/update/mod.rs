//! Path update engine.
//!
//! Applies one `path = text` update to a view model:
//!
//! ```text
//! "Items.$42.Title" = "x"
//!
//!  Items ──$42──> Items_get("42") ──> Title ──> write("x")
//!  └ non-terminal  └ keyed lookup         └ terminal
//! ```
//!
//! Resolution happens before any mutation: an unresolved segment aborts the
//! whole path and hands `(path, raw)` to the view model's unresolved-update
//! hook. Nothing here returns an error to the caller.
//!
//! # Modules
//!
//! - `path` - Segment parsing

mod path;

use crate::schema::{MemberKind, Node, PathError};
use crate::vm::ViewModel;

pub use path::{PathStep, parse_path};

/// What a successfully resolved update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// A field was assigned.
    Assigned,
    /// A command ran; nothing was assigned.
    Executed,
}

/// Result of [`apply_update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied(Applied),
    /// The update was forwarded to the unresolved-update hook.
    Unresolved(PathError),
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied(_))
    }
}

/// Apply `raw` at `path` on `vm`, then reconcile the change set.
///
/// After an assignment, a pending change for the same path whose text equals
/// `raw` is dropped, so the client's own value is not echoed back. A pending
/// value that differs (the setter clamped or derived something else) stays.
pub fn apply_update(vm: &mut dyn ViewModel, path: &str, raw: &str) -> UpdateOutcome {
    match apply_path(&mut *vm, path, raw) {
        Ok(Applied::Assigned) => {
            if vm.changes().remove_if_text_eq(path, raw) {
                crate::debug!("path"; "{} = {} accepted verbatim", path, raw);
            }
            UpdateOutcome::Applied(Applied::Assigned)
        }
        Ok(Applied::Executed) => UpdateOutcome::Applied(Applied::Executed),
        Err(e) => {
            crate::debug!("path"; "unresolved `{}` on {}: {}", path, vm.type_name(), e);
            vm.on_unresolved_update(path, raw);
            UpdateOutcome::Unresolved(e)
        }
    }
}

/// Apply every update of a batch. An unresolved path never stops its siblings.
pub fn apply_updates<'a, I>(vm: &mut dyn ViewModel, updates: I) -> Vec<UpdateOutcome>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    updates
        .into_iter()
        .map(|(path, raw)| apply_update(vm, path, raw))
        .collect()
}

/// Resolve `path` against `root` and apply `raw` at its terminal segment.
pub fn apply_path(root: &mut dyn Node, path: &str, raw: &str) -> Result<Applied, PathError> {
    let steps = parse_path(path)?;
    let (last, walk) = steps
        .split_last()
        .ok_or_else(|| PathError::Incomplete(path.to_string()))?;

    let mut current = root;
    for step in walk {
        current = match *step {
            PathStep::Property(name) => {
                require_member(&*current, name)?;
                current.descend(name)?
            }
            PathStep::Keyed { property, key } => {
                require_member(&*current, property)?;
                current.keyed(property, key)?
            }
        };
    }

    let PathStep::Property(name) = *last else {
        return Err(PathError::Incomplete(path.to_string()));
    };
    match current.member_kind(name) {
        Some(MemberKind::Command) => {
            current.execute(name, raw)?;
            Ok(Applied::Executed)
        }
        Some(MemberKind::Field { .. }) => {
            current.write(name, raw)?;
            Ok(Applied::Assigned)
        }
        None => Err(PathError::UnknownProperty {
            type_name: current.type_name(),
            name: name.to_string(),
        }),
    }
}

fn require_member(node: &dyn Node, name: &str) -> Result<(), PathError> {
    match node.member_kind(name) {
        Some(_) => Ok(()),
        None => Err(PathError::UnknownProperty {
            type_name: node.type_name(),
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Address, Item, Person};
    use serde_json::json;

    #[test]
    fn test_assign_scalar() {
        let mut person = Person::default();
        let outcome = apply_update(&mut person, "Name", "Bob");
        assert_eq!(outcome, UpdateOutcome::Applied(Applied::Assigned));
        assert_eq!(person.name, "Bob");
    }

    #[test]
    fn test_echo_removed() {
        let mut person = Person::default();
        apply_update(&mut person, "Name", "Bob");
        assert!(!person.changes().contains("Name"));
    }

    #[test]
    fn test_divergent_value_kept() {
        let mut person = Person::default();
        apply_update(&mut person, "Age", "150");
        assert_eq!(person.age, 100);
        assert_eq!(person.changes().get("Age"), Some(json!(100)));
    }

    #[test]
    fn test_structured_value() {
        let mut person = Person::default();
        apply_update(&mut person, "Tags", r#"["a","b"]"#);
        assert_eq!(person.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_command_executes_without_assignment() {
        let mut person = Person::default();
        let outcome = apply_update(&mut person, "Greet", "Ann");
        assert_eq!(outcome, UpdateOutcome::Applied(Applied::Executed));
        assert_eq!(person.greeting, "Hello, Ann");
        assert_eq!(person.changes().get("Greeting"), Some(json!("Hello, Ann")));
    }

    #[test]
    fn test_nested_property() {
        let mut person = Person::default();
        person.address = Some(Address::new("Oslo"));
        apply_update(&mut person, "Address.City", "Bergen");
        assert_eq!(person.address.as_ref().unwrap().city, "Bergen");
    }

    #[test]
    fn test_keyed_accessor() {
        let mut person = Person::default();
        person.items = vec![Item::new(7, "seven"), Item::new(42, "old")];

        let outcome = apply_update(&mut person, "Items.$42.Title", "x");
        assert!(outcome.is_applied());
        assert_eq!(person.items[1].title, "x");
        assert_eq!(person.items[0].title, "seven");
        assert_eq!(person.accessor_calls, vec!["42"]);
    }

    #[test]
    fn test_keyed_key_is_trimmed() {
        let mut person = Person::default();
        person.items = vec![Item::new(42, "old")];
        apply_update(&mut person, "Items.$ 42 .Title", "x");
        assert_eq!(person.items[0].title, "x");
    }

    #[test]
    fn test_unknown_property_goes_to_hook() {
        let mut person = Person::default();
        let outcome = apply_update(&mut person, "Nope", "1");
        assert!(matches!(
            outcome,
            UpdateOutcome::Unresolved(PathError::UnknownProperty { .. })
        ));
        assert_eq!(person.unresolved, vec![("Nope".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_absent_intermediate_is_unresolved() {
        let mut person = Person::default();
        person.address = None;
        let outcome = apply_update(&mut person, "Address.City", "Oslo");
        assert!(matches!(
            outcome,
            UpdateOutcome::Unresolved(PathError::AbsentValue { .. })
        ));
        assert_eq!(person.unresolved.len(), 1);
    }

    #[test]
    fn test_missing_key_aborts_whole_path() {
        let mut person = Person::default();
        person.items = vec![Item::new(1, "one")];
        let outcome = apply_update(&mut person, "Items.$2.Title", "x");
        assert!(!outcome.is_applied());
        assert_eq!(person.items[0].title, "one");
        assert_eq!(person.unresolved[0].0, "Items.$2.Title");
    }

    #[test]
    fn test_conversion_failure_is_unresolved() {
        let mut person = Person::default();
        let outcome = apply_update(&mut person, "Age", "old");
        assert!(matches!(
            outcome,
            UpdateOutcome::Unresolved(PathError::Conversion { .. })
        ));
        assert_eq!(person.age, 0);
    }

    #[test]
    fn test_path_ending_in_key_is_unresolved() {
        let mut person = Person::default();
        person.items = vec![Item::new(42, "old")];
        let outcome = apply_update(&mut person, "Items.$42", "x");
        assert!(matches!(
            outcome,
            UpdateOutcome::Unresolved(PathError::Incomplete(_))
        ));
    }

    #[test]
    fn test_batch_siblings_still_apply() {
        let mut person = Person::default();
        let outcomes = apply_updates(
            &mut person,
            [("Name", "Bob"), ("Bogus.Path", "1"), ("Age", "30")],
        );
        assert_eq!(outcomes.iter().filter(|o| o.is_applied()).count(), 2);
        assert_eq!(person.name, "Bob");
        assert_eq!(person.age, 30);
    }
}
