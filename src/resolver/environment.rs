use crate::resolver::BindingId;
use drop_bomb::DropBomb;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::resolver) enum BindingStatus {
    /// The name is introduced by a `:=` further down the block and has not been bound yet.
    Uninitialized,
    Initialized(BindingId),
}

/// Why a lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(in crate::resolver) enum LookupFailure {
    Undefined,
    /// The only matches were reservations for bindings that come later.
    Uninitialized,
}

#[derive(Debug, Clone)]
pub(in crate::resolver) struct Environment {
    globals: HashMap<String, BindingId>,
    current_scope: Scope,
    parent_scopes: Vec<Scope>,
    binding_id_cursor: BindingId,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            globals: HashMap::new(),
            current_scope: Scope::default(),
            parent_scopes: vec![],
            binding_id_cursor: 1,
        }
    }

    fn next_binding_id(&mut self) -> BindingId {
        let id = self.binding_id_cursor;
        self.binding_id_cursor += 1;
        id
    }

    pub(in crate::resolver) fn enter_scope(&mut self) -> ScopeGuard {
        let enclosing_scope = std::mem::take(&mut self.current_scope);
        self.parent_scopes.push(enclosing_scope);
        ScopeGuard(DropBomb::new("You forgot to close a scope"))
    }

    pub(in crate::resolver) fn exit_scope(&mut self, mut guard: ScopeGuard) {
        guard.0.defuse();
        let parent_scope = self.parent_scopes.pop().unwrap_or_default();
        self.current_scope = parent_scope;
    }

    /// Register a top-level name. Returns `None` if the name is already taken.
    pub(in crate::resolver) fn define_global(&mut self, name: &str) -> Option<BindingId> {
        if self.globals.contains_key(name) {
            return None;
        }
        let id = self.next_binding_id();
        self.globals.insert(name.to_owned(), id);
        Some(id)
    }

    /// Bind `name` in the current scope to a fresh id. Returns `None` if the current scope
    /// already has a binding for `name`; a pending reservation does not count.
    pub(in crate::resolver) fn define(&mut self, name: &str) -> Option<BindingId> {
        if let Some(BindingStatus::Initialized(_)) = self.current_scope.get(name) {
            return None;
        }
        Some(self.rebind(name))
    }

    /// Mark `name` as declared later in the current scope. No-op if the scope already knows it.
    pub(in crate::resolver) fn reserve(&mut self, name: &str) {
        self.current_scope
            .bindings
            .entry(name.to_owned())
            .or_insert(BindingStatus::Uninitialized);
    }

    /// Bind `name` in the current scope to a fresh id, replacing whatever was there.
    pub(in crate::resolver) fn rebind(&mut self, name: &str) -> BindingId {
        let id = self.next_binding_id();
        self.current_scope
            .bindings
            .insert(name.to_owned(), BindingStatus::Initialized(id));
        id
    }

    /// Innermost scope first, then the global table.
    pub(in crate::resolver) fn get(&self, name: &str) -> Result<BindingId, LookupFailure> {
        let mut found_reservation = false;
        let scopes = std::iter::once(&self.current_scope).chain(self.parent_scopes.iter().rev());
        for scope in scopes {
            match scope.get(name) {
                Some(BindingStatus::Initialized(id)) => return Ok(id),
                Some(BindingStatus::Uninitialized) => found_reservation = true,
                None => {}
            }
        }
        match self.globals.get(name) {
            Some(id) => Ok(*id),
            None if found_reservation => Err(LookupFailure::Uninitialized),
            None => Err(LookupFailure::Undefined),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(in crate::resolver) struct Scope {
    bindings: HashMap<String, BindingStatus>,
}

impl Scope {
    fn get(&self, name: &str) -> Option<BindingStatus> {
        self.bindings.get(name).copied()
    }
}

/// `ScopeGuard` ensures, at runtime, that we never leave a scope unclosed.
/// The resolver has no way to defuse the drop bomb (the field is private outside of
/// this module) - it is forced to call [`Environment::exit_scope`], which gives us
/// a chance to restore the enclosing scope.
#[must_use = "Nested scopes must be closed!"]
pub(in crate::resolver) struct ScopeGuard(DropBomb);
