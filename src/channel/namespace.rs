//! Namespace carrier: the four scope slots attached to every channel.
//!
//! Slots travel independently of values: one relay worker per slot copies the
//! upstream value to the downstream channel(s) as soon as it is published, so
//! a stage that only needs scope (a bare variable lookup) never waits behind
//! value traffic.

use super::cancel::CancelToken;
use super::error::ChannelResult;
use super::slot::Slot;
use crate::context::FilterContext;
use crate::values::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Variable scope: name → replayable value sequence. Copy-on-write.
#[derive(Clone, Default, PartialEq)]
pub struct Scope(Arc<BTreeMap<String, Arc<[Value]>>>);

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// The values bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<Arc<[Value]>> {
        self.0.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// A new scope with `name` bound to `values`; `self` is unchanged.
    pub fn bind(&self, name: impl Into<String>, values: Vec<Value>) -> Scope {
        let mut map = (*self.0).clone();
        map.insert(name.into(), values.into());
        Scope(Arc::new(map))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// Format-string table: format name → template.
pub type FormatStrings = Arc<BTreeMap<String, String>>;

/// Identifies one of the four namespace slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Globals,
    Locals,
    FormatStrings,
    Context,
}

impl SlotKind {
    pub const ALL: [SlotKind; 4] = [
        SlotKind::Globals,
        SlotKind::Locals,
        SlotKind::FormatStrings,
        SlotKind::Context,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SlotKind::Globals => "globals",
            SlotKind::Locals => "locals",
            SlotKind::FormatStrings => "format-strings",
            SlotKind::Context => "context",
        }
    }
}

/// Resolved values of all four slots.
#[derive(Debug, Clone, Default)]
pub struct NamespaceSet {
    pub globals: Scope,
    pub locals: Scope,
    pub format_strings: FormatStrings,
    pub context: Arc<FilterContext>,
}

/// The slots attached to one channel instance.
#[derive(Default)]
pub struct Namespaces {
    globals: Slot<Scope>,
    locals: Slot<Scope>,
    format_strings: Slot<FormatStrings>,
    context: Slot<Arc<FilterContext>>,
}

impl Namespaces {
    /// All slots unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// All slots already published.
    pub fn from_set(set: NamespaceSet) -> Self {
        Self {
            globals: Slot::with_value(set.globals),
            locals: Slot::with_value(set.locals),
            format_strings: Slot::with_value(set.format_strings),
            context: Slot::with_value(set.context),
        }
    }

    pub fn globals(&self, cancel: &CancelToken) -> ChannelResult<Scope> {
        self.globals.get(cancel)
    }

    pub fn locals(&self, cancel: &CancelToken) -> ChannelResult<Scope> {
        self.locals.get(cancel)
    }

    pub fn format_strings(&self, cancel: &CancelToken) -> ChannelResult<FormatStrings> {
        self.format_strings.get(cancel)
    }

    pub fn context(&self, cancel: &CancelToken) -> ChannelResult<Arc<FilterContext>> {
        self.context.get(cancel)
    }

    pub fn set_globals(&self, scope: Scope) -> ChannelResult<()> {
        self.globals.set(scope)
    }

    pub fn set_locals(&self, scope: Scope) -> ChannelResult<()> {
        self.locals.set(scope)
    }

    pub fn set_format_strings(&self, table: FormatStrings) -> ChannelResult<()> {
        self.format_strings.set(table)
    }

    pub fn set_context(&self, context: Arc<FilterContext>) -> ChannelResult<()> {
        self.context.set(context)
    }

    pub fn is_set(&self, kind: SlotKind) -> bool {
        match kind {
            SlotKind::Globals => self.globals.is_set(),
            SlotKind::Locals => self.locals.is_set(),
            SlotKind::FormatStrings => self.format_strings.is_set(),
            SlotKind::Context => self.context.is_set(),
        }
    }

    /// Publish empty defaults into every slot nobody has written yet.
    pub fn fill_defaults(&self) {
        self.globals.set_if_empty(Scope::new);
        self.locals.set_if_empty(Scope::new);
        self.format_strings.set_if_empty(FormatStrings::default);
        self.context.set_if_empty(Default::default);
    }

    /// Block until all four slots are published and return them.
    pub fn snapshot(&self, cancel: &CancelToken) -> ChannelResult<NamespaceSet> {
        Ok(NamespaceSet {
            globals: self.globals(cancel)?,
            locals: self.locals(cancel)?,
            format_strings: self.format_strings(cancel)?,
            context: self.context(cancel)?,
        })
    }

    /// Wait for slot `kind` here, then publish the same value to every target.
    pub fn relay(
        &self,
        kind: SlotKind,
        targets: &[&Namespaces],
        cancel: &CancelToken,
    ) -> ChannelResult<()> {
        let outcome = match kind {
            SlotKind::Globals => {
                let value = self.globals(cancel)?;
                publish(targets, |t| t.set_globals(value.clone()))
            }
            SlotKind::Locals => {
                let value = self.locals(cancel)?;
                publish(targets, |t| t.set_locals(value.clone()))
            }
            SlotKind::FormatStrings => {
                let value = self.format_strings(cancel)?;
                publish(targets, |t| t.set_format_strings(value.clone()))
            }
            SlotKind::Context => {
                let value = self.context(cancel)?;
                publish(targets, |t| t.set_context(value.clone()))
            }
        };
        if let Err(e) = outcome {
            tracing::warn!(slot = kind.name(), "namespace relay: {}", e);
        }
        Ok(())
    }
}

/// Write to every target even if one of them was already assigned.
fn publish(
    targets: &[&Namespaces],
    mut write: impl FnMut(&Namespaces) -> ChannelResult<()>,
) -> ChannelResult<()> {
    let mut outcome = Ok(());
    for target in targets {
        if let Err(e) = write(target) {
            outcome = Err(e);
        }
    }
    outcome
}
