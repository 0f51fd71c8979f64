//! Lexical nesting state tracked while a compilation unit is traversed.
//!
//! Types and methods nest as stacks: the innermost entry is the current one.
//! Statement blocks form a tree kept in an arena so that scoping questions can
//! still be answered after the blocks have been left.

use factgraph::EntityId;
use factgraph_parser_api::Span;
use std::collections::HashMap;
use thiserror::Error;

/// Index of a [`StatementBlock`] in the tracker's arena.
pub type BlockId = usize;

/// A type declaration being visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFrame {
    /// Class entity
    pub entity: EntityId,
    /// Unique name of the class
    pub name: String,
}

/// A method, constructor or synthetic initializer being visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodFrame {
    /// Method entity
    pub entity: EntityId,
    /// Unique name of the method
    pub name: String,
    /// Class declaring the method
    pub class: EntityId,
    saved_block: Option<BlockId>,
}

impl MethodFrame {
    /// A frame for `entity` declared in `class`.
    pub fn new(entity: EntityId, name: impl Into<String>, class: EntityId) -> Self {
        Self {
            entity,
            name: name.into(),
            class,
            saved_block: None,
        }
    }
}

/// A `{ .. }` block: a source range inside its parent block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementBlock {
    /// Range covered by the block
    pub span: Span,
    /// Enclosing block of the same method
    pub parent: Option<BlockId>,
    /// Nesting depth within the method (outermost block is 0)
    pub depth: usize,
}

/// Unbalanced enter/leave pairs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// A leave did not match the innermost enter
    #[error("unbalanced {what} scope: expected depth {expected}, found {actual}")]
    Unbalanced {
        /// Which stack was affected
        what: &'static str,
        /// Depth recorded on entry
        expected: usize,
        /// Depth found on exit
        actual: usize,
    },

    /// A block other than the current one was left
    #[error("left block {left} while block {current:?} was current")]
    BlockMismatch {
        /// Block being left
        left: BlockId,
        /// Block that was current
        current: Option<BlockId>,
    },
}

/// Nesting state of one traversal.
#[derive(Debug, Default)]
pub struct ScopeTracker {
    types: Vec<TypeFrame>,
    methods: Vec<MethodFrame>,
    blocks: Vec<StatementBlock>,
    current_block: Option<BlockId>,
    anonymous_counters: HashMap<String, usize>,
    local_scopes: HashMap<EntityId, BlockId>,
    local_ordinals: HashMap<(EntityId, String), usize>,
    violation: Option<ScopeError>,
}

impl ScopeTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Innermost type being visited.
    pub fn current_type(&self) -> Option<&TypeFrame> {
        self.types.last()
    }

    /// Innermost method being visited.
    pub fn current_method(&self) -> Option<&MethodFrame> {
        self.methods.last()
    }

    /// Whether the innermost method belongs to the innermost type, i.e. the
    /// traversal is inside a method body rather than directly in a type body.
    pub fn in_method_of_current_type(&self) -> bool {
        match (self.current_type(), self.current_method()) {
            (Some(t), Some(m)) => m.class == t.entity,
            _ => false,
        }
    }

    /// Push a nested type; returns the depth to hand back on leave.
    pub fn enter_nested_type(&mut self, frame: TypeFrame) -> usize {
        self.types.push(frame);
        self.types.len()
    }

    /// Pop the type pushed at `depth`.
    pub fn leave_nested_type(&mut self, depth: usize) -> Result<TypeFrame, ScopeError> {
        if self.types.len() != depth || depth == 0 {
            return Err(ScopeError::Unbalanced {
                what: "type",
                expected: depth,
                actual: self.types.len(),
            });
        }
        self.types.pop().ok_or(ScopeError::Unbalanced {
            what: "type",
            expected: depth,
            actual: 0,
        })
    }

    /// Push a nested method; blocks of the new method start a fresh tree.
    pub fn enter_nested_method(&mut self, mut frame: MethodFrame) -> usize {
        frame.saved_block = self.current_block.take();
        self.methods.push(frame);
        self.methods.len()
    }

    /// Pop the method pushed at `depth`, restoring the enclosing block.
    pub fn leave_nested_method(&mut self, depth: usize) -> Result<MethodFrame, ScopeError> {
        if self.methods.len() != depth || depth == 0 {
            return Err(ScopeError::Unbalanced {
                what: "method",
                expected: depth,
                actual: self.methods.len(),
            });
        }
        let frame = self.methods.pop().ok_or(ScopeError::Unbalanced {
            what: "method",
            expected: depth,
            actual: 0,
        })?;
        self.current_block = frame.saved_block;
        Ok(frame)
    }

    /// Open a child block of the current one and make it current.
    pub fn enter_block(&mut self, span: Span) -> BlockId {
        let depth = self
            .current_block
            .map(|b| self.blocks[b].depth + 1)
            .unwrap_or(0);
        let id = self.blocks.len();
        self.blocks.push(StatementBlock {
            span,
            parent: self.current_block,
            depth,
        });
        self.current_block = Some(id);
        id
    }

    /// Close `block`, which must be the current one.
    pub fn leave_block(&mut self, block: BlockId) -> Result<(), ScopeError> {
        if self.current_block != Some(block) {
            return Err(ScopeError::BlockMismatch {
                left: block,
                current: self.current_block,
            });
        }
        self.current_block = self.blocks[block].parent;
        Ok(())
    }

    /// Block currently open, if any.
    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    /// A block by id.
    pub fn block(&self, id: BlockId) -> Option<&StatementBlock> {
        self.blocks.get(id)
    }

    /// Make sure `type_name` has an anonymous-class counter.
    pub fn seed_anonymous_counter(&mut self, type_name: &str) {
        self.anonymous_counters
            .entry(type_name.to_string())
            .or_insert(0);
    }

    /// Next anonymous-class ordinal of `type_name`, starting at 0.
    pub fn next_anonymous_ordinal(&mut self, type_name: &str) -> usize {
        let counter = self
            .anonymous_counters
            .entry(type_name.to_string())
            .or_insert(0);
        let ordinal = *counter;
        *counter += 1;
        ordinal
    }

    /// Record the block a local variable was declared in.
    pub fn declare_local(&mut self, local: EntityId, block: BlockId) {
        self.local_scopes.insert(local, block);
    }

    /// Block a local variable was declared in.
    pub fn scope_of_local(&self, local: EntityId) -> Option<BlockId> {
        self.local_scopes.get(&local).copied()
    }

    /// Unique name for a local `name` of `method`.
    ///
    /// The first declaration is `<method>.<name>`; later declarations of the
    /// same name in the same method (sibling blocks) get `#1`, `#2`, ...
    pub fn local_variable_name(
        &mut self,
        method: EntityId,
        method_name: &str,
        name: &str,
    ) -> String {
        let ordinal = self
            .local_ordinals
            .entry((method, name.to_string()))
            .or_insert(0);
        let unique = if *ordinal == 0 {
            format!("{method_name}.{name}")
        } else {
            format!("{method_name}.{name}#{ordinal}")
        };
        *ordinal += 1;
        unique
    }

    /// Whether `inner` is `outer` or nested inside it.
    pub fn block_encloses(&self, outer: BlockId, inner: BlockId) -> bool {
        let mut cursor = Some(inner);
        while let Some(id) = cursor {
            if id == outer {
                return true;
            }
            cursor = self.blocks.get(id).and_then(|b| b.parent);
        }
        false
    }

    /// Remember an unbalanced leave detected where it cannot be returned.
    pub fn record_violation(&mut self, error: ScopeError) {
        self.violation.get_or_insert(error);
    }

    /// Take the first recorded violation, if any.
    pub fn take_violation(&mut self) -> Option<ScopeError> {
        self.violation.take()
    }

    /// Whether every stack is back at its initial state.
    pub fn is_balanced(&self) -> bool {
        self.types.is_empty() && self.methods.is_empty() && self.current_block.is_none()
    }
}
