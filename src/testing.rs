//! View model fixtures shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::catalog::{TypeCatalog, TypeDescriptor};
use crate::push::{DispatchFn, PushRequester};
use crate::schema::{Bindable, Schema};
use crate::vm::{ChangeSet, ViewModel};

// =============================================================================
// Address / Item
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct Address {
    pub city: String,
    pub zip: String,
}

impl Address {
    pub fn new(city: &str) -> Self {
        Self {
            city: city.to_string(),
            zip: String::new(),
        }
    }
}

impl Bindable for Address {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Address>> = LazyLock::new(|| {
            Schema::builder("Address")
                .scalar("City", |a: &Address| a.city.clone(), |a, v| a.city = v)
                .scalar("Zip", |a: &Address| a.zip.clone(), |a, v| a.zip = v)
                .build()
        });
        &SCHEMA
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    pub id: u32,
    pub title: String,
}

impl Item {
    pub fn new(id: u32, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
        }
    }
}

impl Bindable for Item {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Item>> = LazyLock::new(|| {
            Schema::builder("Item")
                .read_only("Id", |i: &Item| i.id)
                .scalar("Title", |i: &Item| i.title.clone(), |i, v| i.title = v)
                .build()
        });
        &SCHEMA
    }
}

// =============================================================================
// Person
// =============================================================================

/// Covers every member kind: scalars, JSON, child object, keyed collection,
/// command, ignored property.
#[derive(Debug, Default)]
pub struct Person {
    pub name: String,
    pub age: i32,
    pub tags: Vec<String>,
    pub address: Option<Address>,
    pub items: Vec<Item>,
    pub greeting: String,
    pub secret: String,
    pub policy: Option<&'static str>,
    pub unresolved: Vec<(String, String)>,
    pub accessor_calls: Vec<String>,
    changes: ChangeSet,
}

impl Person {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn guarded(policy: &'static str) -> Self {
        Self {
            policy: Some(policy),
            ..Self::default()
        }
    }

    fn set_name(&mut self, name: String) {
        self.changes.record("Name", &name);
        self.name = name;
    }

    fn set_age(&mut self, age: i32) {
        self.age = age.clamp(0, 100);
        self.changes.record("Age", &self.age);
    }

    fn set_tags(&mut self, tags: Vec<String>) {
        self.changes.record("Tags", &tags);
        self.tags = tags;
    }

    fn greet(&mut self, whom: &str) {
        self.greeting = format!("Hello, {whom}");
        self.changes.record("Greeting", &self.greeting);
    }

    fn item_mut(&mut self, key: &str) -> Option<&mut Item> {
        self.accessor_calls.push(key.to_string());
        let id: u32 = key.parse().ok()?;
        self.items.iter_mut().find(|item| item.id == id)
    }
}

impl Bindable for Person {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Person>> = LazyLock::new(|| {
            Schema::builder("Person")
                .scalar("Name", |p: &Person| p.name.clone(), Person::set_name)
                .scalar("Age", |p: &Person| p.age, Person::set_age)
                .structured("Tags", |p: &Person| p.tags.clone(), Person::set_tags)
                .child(
                    "Address",
                    |p: &Person| p.address.as_ref(),
                    |p: &mut Person| p.address.as_mut(),
                )
                .read_only("Items", |p: &Person| p.items.clone())
                .keyed("Items", Person::item_mut)
                .read_only("Greeting", |p: &Person| p.greeting.clone())
                .scalar("Secret", |p: &Person| p.secret.clone(), |p, v| p.secret = v)
                .command("Greet", Person::greet)
                .build()
        });
        &SCHEMA
    }
}

impl ViewModel for Person {
    fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    fn ignored_properties(&self) -> &[&'static str] {
        &["Secret"]
    }

    fn policy(&self) -> Option<&str> {
        self.policy
    }

    fn on_unresolved_update(&mut self, path: &str, raw: &str) {
        self.unresolved.push((path.to_string(), raw.to_string()));
    }
}

// =============================================================================
// Counter
// =============================================================================

/// Raises push requests on its own through the `Tick` command.
#[derive(Debug, Default)]
pub struct Counter {
    pub count: i32,
    pub events: Arc<Mutex<Vec<String>>>,
    requester: Option<PushRequester>,
    changes: ChangeSet,
}

impl Counter {
    pub fn with_events(events: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    /// Change state outside any inbound update and ask for a push.
    pub fn tick(&mut self) {
        self.count += 1;
        self.changes.record("Count", &self.count);
        if let Some(requester) = &self.requester {
            requester.request();
        }
    }

    fn set_count(&mut self, count: i32) {
        self.count = count;
        self.changes.record("Count", &count);
    }
}

impl Bindable for Counter {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Counter>> = LazyLock::new(|| {
            Schema::builder("Counter")
                .scalar("Count", |c: &Counter| c.count, Counter::set_count)
                .command("Tick", |c: &mut Counter, _| c.tick())
                .build()
        });
        &SCHEMA
    }
}

impl ViewModel for Counter {
    fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    fn attach_push_requester(&mut self, requester: PushRequester) {
        self.events.lock().push(format!("attach {}", requester.vm_id()));
        self.requester = Some(requester);
    }

    fn detach_push_requester(&mut self) {
        self.events.lock().push("detach".to_string());
        self.requester = None;
    }

    fn dispose(&mut self) {
        self.events.lock().push("dispose".to_string());
    }
}

// =============================================================================
// Shell (master)
// =============================================================================

/// Master that supplies `Person` subs (and `Vault`, a guarded `Person`) and
/// records their lifecycle.
#[derive(Debug, Default)]
pub struct Shell {
    pub created: Vec<String>,
    pub disposing: Vec<String>,
    changes: ChangeSet,
}

impl Bindable for Shell {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Shell>> = LazyLock::new(|| {
            Schema::builder("Shell")
                .read_only("Created", |s: &Shell| s.created.clone())
                .read_only("Disposing", |s: &Shell| s.disposing.clone())
                .build()
        });
        &SCHEMA
    }
}

impl ViewModel for Shell {
    fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    fn sub_vm(&mut self, type_name: &str, instance_key: Option<&str>) -> Option<Box<dyn ViewModel>> {
        let sub = match type_name {
            "Person" => Person::named(&format!("{} from Shell", instance_key.unwrap_or("anon"))),
            "Vault" => Person::guarded("vault"),
            _ => return None,
        };
        Some(Box::new(sub))
    }

    fn on_sub_created(&mut self, vm_id: &str, _sub: &mut dyn ViewModel) {
        self.created.push(vm_id.to_string());
    }

    fn on_sub_disposing(&mut self, vm_id: &str, _sub: &mut dyn ViewModel) {
        self.disposing.push(vm_id.to_string());
    }
}

// =============================================================================
// Ledger / Account (shared dependency)
// =============================================================================

/// State shared by every account it opens. Changing the balance through one
/// account marks it changed on all of them.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    balance: Arc<Mutex<i64>>,
    books: Arc<Mutex<Vec<ChangeSet>>>,
}

impl Ledger {
    pub fn open(&self) -> Account {
        let changes = ChangeSet::new();
        self.books.lock().push(changes.clone());
        Account {
            ledger: self.clone(),
            changes,
        }
    }

    pub fn balance(&self) -> i64 {
        *self.balance.lock()
    }

    fn set_balance(&self, balance: i64) {
        *self.balance.lock() = balance;
        for book in self.books.lock().iter() {
            book.record("Balance", &balance);
        }
    }
}

#[derive(Debug)]
pub struct Account {
    ledger: Ledger,
    changes: ChangeSet,
}

impl Bindable for Account {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: LazyLock<Schema<Account>> = LazyLock::new(|| {
            Schema::builder("Account")
                .scalar(
                    "Balance",
                    |a: &Account| a.ledger.balance(),
                    |a, v| a.ledger.set_balance(v),
                )
                .build()
        });
        &SCHEMA
    }
}

impl ViewModel for Account {
    fn changes(&self) -> &ChangeSet {
        &self.changes
    }
}

// =============================================================================
// Catalog and dispatch helpers
// =============================================================================

/// Catalog with `Person` (keyed by name), `Counter`, `Shell` and `Vault`
/// (a `Person` guarded by the `vault` policy).
pub fn fixture_catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(
            TypeDescriptor::of::<Person>("Person")
                .keyed_constructor(|key| Box::new(Person::named(key))),
        )
        .with(TypeDescriptor::of::<Counter>("Counter"))
        .with(TypeDescriptor::of::<Shell>("Shell"))
        .with(TypeDescriptor::new("Vault").constructor(|| Box::new(Person::guarded("vault"))))
}

/// Catalog whose `Shell` constructor counts its invocations.
pub fn counting_catalog(constructed: Arc<AtomicUsize>) -> TypeCatalog {
    fixture_catalog().with(TypeDescriptor::new("Shell").constructor(move || {
        constructed.fetch_add(1, Ordering::SeqCst);
        Box::new(Shell::default())
    }))
}

/// One dispatched payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub connection: String,
    pub vm_id: String,
    pub payload: String,
}

impl Sent {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.payload).unwrap()
    }
}

/// Dispatch sink that records everything it is given.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    sent: Arc<Mutex<Vec<Sent>>>,
}

impl Recorder {
    pub fn dispatch(&self) -> DispatchFn {
        let sent = Arc::clone(&self.sent);
        Arc::new(move |connection: &str, vm_id: &str, payload: &str| {
            sent.lock().push(Sent {
                connection: connection.to_string(),
                vm_id: vm_id.to_string(),
                payload: payload.to_string(),
            });
        })
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    /// Payloads sent for `vm_id`, in order.
    pub fn for_vm(&self, vm_id: &str) -> Vec<Sent> {
        self.sent
            .lock()
            .iter()
            .filter(|s| s.vm_id == vm_id)
            .cloned()
            .collect()
    }

    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock())
    }
}
