//! Scoped, append-only symbol table.
//!
//! Scopes mirror the script's lexical structure: one module scope plus one
//! scope per class or function body. A name's first definition in a scope is
//! kept forever; later definitions never overwrite it and nothing is removed.

use std::collections::HashMap;

use super::builtins;

pub type ScopeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
}

/// Where a name was first bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    /// 1-based source line.
    pub line: usize,
    /// Statement sequence number; uses only see definitions with a smaller one.
    pub order: usize,
}

#[derive(Debug, Clone)]
struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    names: HashMap<String, Definition>,
    /// Set by a star import whose exports are unknown.
    wildcard: Option<Definition>,
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub const MODULE: ScopeId = 0;

    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Module,
                parent: None,
                names: HashMap::new(),
                wildcard: None,
            }],
        }
    }

    pub fn push_scope(&mut self, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            names: HashMap::new(),
            wildcard: None,
        });
        self.scopes.len() - 1
    }

    /// Let any name resolve in `scope` from `order` on.
    pub fn define_wildcard(&mut self, scope: ScopeId, line: usize, order: usize) {
        if let Some(target) = self.scopes.get_mut(scope).filter(|s| s.wildcard.is_none()) {
            target.wildcard = Some(Definition { line, order });
        }
    }

    /// Record a definition. Returns `false` when the scope already had one.
    pub fn define(&mut self, scope: ScopeId, name: &str, line: usize, order: usize) -> bool {
        let Some(target) = self.scopes.get_mut(scope) else {
            return false;
        };
        if target.names.contains_key(name) {
            return false;
        }
        target.names.insert(name.to_string(), Definition { line, order });
        true
    }

    /// First-definition line of `name` in exactly `scope`.
    pub fn first_definition(&self, scope: ScopeId, name: &str) -> Option<usize> {
        self.scopes
            .get(scope)
            .and_then(|s| s.names.get(name))
            .map(|d| d.line)
    }

    /// Scopes consulted when resolving a name used in `scope`, innermost
    /// first. Enclosing class bodies are not visible from nested scopes.
    pub fn lookup_chain(&self, scope: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![scope];
        let mut current = self.scopes.get(scope).and_then(|s| s.parent);
        while let Some(id) = current {
            if self.scopes[id].kind != ScopeKind::Class {
                chain.push(id);
            }
            current = self.scopes[id].parent;
        }
        chain
    }

    /// Whether a use of `name` in `scope` resolves.
    ///
    /// With `at_order` set, the innermost scope only counts earlier
    /// definitions, and so do enclosing scopes unless the use sits inside a
    /// function body (function bodies run after the module has been loaded).
    /// Without it, ordering is ignored.
    pub fn resolves(&self, scope: ScopeId, name: &str, at_order: Option<usize>) -> bool {
        if builtins::is_builtin(name) {
            return true;
        }
        let chain = self.lookup_chain(scope);
        let deferred = chain
            .iter()
            .any(|&id| self.scopes[id].kind == ScopeKind::Function);

        chain.iter().enumerate().any(|(depth, &id)| {
            let scope = &self.scopes[id];
            let Some(def) = scope.names.get(name).or(scope.wildcard.as_ref()) else {
                return false;
            };
            match at_order {
                Some(order) if depth == 0 || !deferred => def.order < order,
                _ => true,
            }
        })
    }

    /// Total number of recorded definitions.
    pub fn len(&self) -> usize {
        self.scopes.iter().map(|s| s.names.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
