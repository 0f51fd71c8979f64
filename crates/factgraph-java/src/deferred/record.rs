//! Deferred invocation records.

use super::cascade::{self, MethodIndex};
use super::snapshot::ScopeSnapshot;
use crate::naming::{self, UNDEFINED};
use factgraph::{AssociationKind, EntityId, EntityKind, FactModel, SourceAnchor};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Lifecycle of a deferred record. There is no failed state: a record that
/// matches nothing is `Resolved` with empty candidate sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionState {
    /// Captured during traversal
    Created,
    /// The resolution pass is working on it
    Resolving,
    /// Candidate sets are final
    Resolved,
}

/// Which syntax produced the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvocationKind {
    /// `recv.m(..)` or `m(..)`
    Method,
    /// `super.m(..)`
    SuperMethod,
    /// `this(..)`
    Constructor,
    /// `super(..)`
    SuperConstructor,
    /// `new T(..)`
    ClassInstanceCreation,
}

impl InvocationKind {
    /// Whether the invocation targets a constructor.
    pub fn is_constructor(self) -> bool {
        matches!(
            self,
            InvocationKind::Constructor
                | InvocationKind::SuperConstructor
                | InvocationKind::ClassInstanceCreation
        )
    }
}

/// What is known about an expression when its invocation is deferred.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionSummary {
    /// Source text, when statements are recorded
    pub text: String,
    /// Type name (array marker for arrays), when a binding provided it
    pub type_name: Option<String>,
    /// Type in signature form (`int[]`), when a binding provided it
    pub signature_type: Option<String>,
    /// Variable name to look up in scope when the type is unknown
    pub name: Option<String>,
}

/// The object an invocation is sent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Receiver {
    /// No explicit receiver; the caller's class
    Implicit,
    /// `super`; the superclass of the caller's class
    Super,
    /// A type known from syntax (constructor calls)
    Type(String),
    /// An explicit receiver expression
    Expression(ExpressionSummary),
}

/// Final outcome of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Exactly one candidate
    Unique(EntityId),
    /// Several candidates survived every stage
    Ambiguous(Vec<EntityId>),
    /// No candidate
    Unresolved,
}

/// An invocation whose callee could not be named during traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedMethodInvocation {
    /// Syntax of the invocation
    pub kind: InvocationKind,
    /// Calling method
    pub caller: EntityId,
    /// Class declaring the calling method
    pub caller_class: EntityId,
    /// Invoked simple name (the constructor marker for constructor calls)
    pub method_name: String,
    /// Receiver as captured
    pub receiver: Receiver,
    /// Argument expressions as captured
    pub arguments: Vec<ExpressionSummary>,
    /// Variables in scope at the call site
    pub scope: ScopeSnapshot,
    /// Location of the invocation
    pub anchor: SourceAnchor,
    /// Source text of the invocation
    pub statement: String,
    /// Lifecycle state
    pub state: ResolutionState,
    /// Unique name of the receiver type, once resolved
    pub receiver_type: Option<String>,
    /// Argument types in signature form, undefined where unknown
    pub argument_types: Vec<String>,
    /// Stage 1 candidates
    pub matches_by_name: Vec<EntityId>,
    /// Stage 2 candidates
    pub matches_by_nr_of_parameters: Vec<EntityId>,
    /// Stage 3 candidates
    pub matches_by_call_receiver_type_subtyping: Vec<EntityId>,
    /// Stage 4 candidates, exact parameter types
    pub matches_by_all_parameters_type: Vec<EntityId>,
    /// Stage 4 candidates, undefined parameter types equal
    pub matches_by_all_parameters_type_soft: Vec<EntityId>,
}

impl UnresolvedMethodInvocation {
    /// A freshly captured record with an implicit receiver and no arguments.
    pub fn new(
        kind: InvocationKind,
        caller: EntityId,
        caller_class: EntityId,
        method_name: impl Into<String>,
        anchor: SourceAnchor,
    ) -> Self {
        Self {
            kind,
            caller,
            caller_class,
            method_name: method_name.into(),
            receiver: Receiver::Implicit,
            arguments: Vec::new(),
            scope: ScopeSnapshot::new(),
            anchor,
            statement: String::new(),
            state: ResolutionState::Created,
            receiver_type: None,
            argument_types: Vec::new(),
            matches_by_name: Vec::new(),
            matches_by_nr_of_parameters: Vec::new(),
            matches_by_call_receiver_type_subtyping: Vec::new(),
            matches_by_all_parameters_type: Vec::new(),
            matches_by_all_parameters_type_soft: Vec::new(),
        }
    }

    /// Builder: receiver.
    pub fn with_receiver(mut self, receiver: Receiver) -> Self {
        self.receiver = receiver;
        self
    }

    /// Builder: argument expressions.
    pub fn with_arguments(mut self, arguments: Vec<ExpressionSummary>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Builder: scope snapshot.
    pub fn with_scope(mut self, scope: ScopeSnapshot) -> Self {
        self.scope = scope;
        self
    }

    /// Builder: statement text.
    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = statement.into();
        self
    }

    /// Whether the resolution pass has run on this record.
    pub fn is_resolved(&self) -> bool {
        self.state == ResolutionState::Resolved
    }

    /// Run the receiver, argument and cascade steps against a complete model.
    ///
    /// Only reads the model, so records can be resolved concurrently.
    pub fn resolve(&mut self, model: &FactModel, index: &MethodIndex) {
        self.state = ResolutionState::Resolving;
        self.scope.add_enclosing_fields(model, self.caller_class);

        self.receiver_type = self.resolve_receiver(model);
        self.argument_types = self
            .arguments
            .iter()
            .map(|argument| self.resolve_argument(model, argument))
            .collect();

        self.matches_by_name = cascade::by_name(index, &self.method_name);
        self.matches_by_nr_of_parameters =
            cascade::by_parameter_count(model, &self.matches_by_name, self.arguments.len());
        self.matches_by_call_receiver_type_subtyping = match &self.receiver_type {
            // Constructors are not inherited
            Some(receiver) if self.kind.is_constructor() => cascade::by_receiver_type(
                model,
                &self.matches_by_nr_of_parameters,
                &HashSet::from([receiver.clone()]),
            ),
            Some(receiver) => cascade::by_receiver_type(
                model,
                &self.matches_by_nr_of_parameters,
                &model.type_closure(receiver),
            ),
            // Nothing to narrow on
            None => self.matches_by_nr_of_parameters.clone(),
        };
        self.matches_by_all_parameters_type = cascade::by_parameter_types(
            model,
            &self.matches_by_call_receiver_type_subtyping,
            &self.argument_types,
            cascade::exact_match,
        );
        self.matches_by_all_parameters_type_soft = cascade::by_parameter_types(
            model,
            &self.matches_by_call_receiver_type_subtyping,
            &self.argument_types,
            cascade::soft_match,
        );

        self.state = ResolutionState::Resolved;
        trace!(
            "Resolved {} in {}: {} by name, {} by count, {} by receiver, {} exact, {} soft",
            self.method_name,
            model.name_of(self.caller),
            self.matches_by_name.len(),
            self.matches_by_nr_of_parameters.len(),
            self.matches_by_call_receiver_type_subtyping.len(),
            self.matches_by_all_parameters_type.len(),
            self.matches_by_all_parameters_type_soft.len(),
        );
    }

    /// The best candidate after resolution.
    ///
    /// Exact parameter matches win, then soft matches, then a receiver stage
    /// that kept a single candidate.
    pub fn best_match(&self) -> Resolution {
        let ranked = [
            &self.matches_by_all_parameters_type,
            &self.matches_by_all_parameters_type_soft,
        ];
        for candidates in ranked {
            match candidates.as_slice() {
                [] => continue,
                [only] => return Resolution::Unique(*only),
                many => return Resolution::Ambiguous(many.to_vec()),
            }
        }
        match self.matches_by_call_receiver_type_subtyping.as_slice() {
            [only] => Resolution::Unique(*only),
            _ => Resolution::Unresolved,
        }
    }

    fn resolve_receiver(&self, model: &FactModel) -> Option<String> {
        match &self.receiver {
            Receiver::Implicit => Some(model.name_of(self.caller_class).to_string()),
            Receiver::Super => Some(
                model
                    .superclass_of(self.caller_class)
                    .map(|s| model.name_of(s).to_string())
                    .unwrap_or_else(|| "java.lang.Object".to_string()),
            ),
            Receiver::Type(name) => Some(name.clone()),
            Receiver::Expression(expr) => {
                if let Some(type_name) = &expr.type_name {
                    return Some(type_name.clone());
                }
                let resolved = expr
                    .name
                    .as_deref()
                    .and_then(|name| self.lookup_variable_type(model, name));
                if resolved.is_none() {
                    debug!(
                        "Receiver '{}' of {} in {} left unresolved",
                        expr.text,
                        self.method_name,
                        model.name_of(self.caller)
                    );
                }
                resolved
            }
        }
    }

    fn resolve_argument(&self, model: &FactModel, argument: &ExpressionSummary) -> String {
        if let Some(signature) = &argument.signature_type {
            return signature.clone();
        }
        argument
            .name
            .as_deref()
            .and_then(|name| self.lookup_variable(model, name))
            .and_then(|variable| model.entity(variable).ok())
            .and_then(|variable| variable.signature_type.clone())
            .unwrap_or_else(|| UNDEFINED.to_string())
    }

    /// The variable a (possibly qualified) name denotes.
    ///
    /// `a.b` resolves `a` through the scope, then `b` as a field of `a`'s type.
    fn lookup_variable(&self, model: &FactModel, name: &str) -> Option<EntityId> {
        if let Some(id) = self.scope.unique(name) {
            return Some(id);
        }
        let (qualifier, field) = name.rsplit_once('.')?;
        let owner_type = self.lookup_variable_type(model, qualifier)?;
        model.lookup(
            EntityKind::Attribute,
            &naming::attribute_name(&owner_type, field),
        )
    }

    fn lookup_variable_type(&self, model: &FactModel, name: &str) -> Option<String> {
        let variable = self.lookup_variable(model, name)?;
        let declared = model.entity(variable).ok()?.declared_type?;
        Some(model.name_of(declared).to_string())
    }
}

/// Counts of a linking pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LinkOutcome {
    pub unique: usize,
    pub ambiguous: usize,
    pub unresolved: usize,
    pub linked: usize,
}

/// Create Invocation associations for resolved records.
pub(crate) fn link_record(
    model: &mut FactModel,
    record: &UnresolvedMethodInvocation,
    link_unique: bool,
    link_ambiguous: bool,
    outcome: &mut LinkOutcome,
) -> factgraph::Result<()> {
    let target = match record.best_match() {
        Resolution::Unique(id) => {
            outcome.unique += 1;
            link_unique.then_some(id)
        }
        Resolution::Ambiguous(candidates) => {
            outcome.ambiguous += 1;
            if link_ambiguous {
                candidates.first().copied()
            } else {
                None
            }
        }
        Resolution::Unresolved => {
            outcome.unresolved += 1;
            None
        }
    };
    if let Some(callee) = target {
        model.add_association(
            AssociationKind::Invocation,
            record.caller,
            callee,
            Some(record.anchor.clone()),
            record.statement.clone(),
        )?;
        outcome.linked += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(model: &mut FactModel, class: &str, name: &str, params: &[&str]) -> EntityId {
        let class_id = model.get_or_create(EntityKind::Class, class);
        let unique = format!("{class}.{name}({})", params.join(","));
        let id = model.get_or_create(EntityKind::Method, &unique);
        model.set_parent(id, class_id).unwrap();
        model.entity_mut(id).unwrap().parameter_types =
            params.iter().map(|p| p.to_string()).collect();
        id
    }

    fn typed(signature: &str) -> ExpressionSummary {
        ExpressionSummary {
            text: signature.to_string(),
            type_name: Some(signature.to_string()),
            signature_type: Some(signature.to_string()),
            name: None,
        }
    }

    fn assert_monotone(record: &UnresolvedMethodInvocation) {
        let subset = |a: &[EntityId], b: &[EntityId]| a.iter().all(|x| b.contains(x));
        assert!(subset(
            &record.matches_by_all_parameters_type,
            &record.matches_by_call_receiver_type_subtyping
        ));
        assert!(subset(
            &record.matches_by_all_parameters_type_soft,
            &record.matches_by_call_receiver_type_subtyping
        ));
        assert!(subset(
            &record.matches_by_call_receiver_type_subtyping,
            &record.matches_by_nr_of_parameters
        ));
        assert!(subset(
            &record.matches_by_nr_of_parameters,
            &record.matches_by_name
        ));
    }

    #[test]
    fn test_implicit_receiver_is_caller_class() {
        let mut model = FactModel::new();
        let caller = method(&mut model, "a.A", "main", &[]);
        let target = method(&mut model, "a.A", "helper", &["int"]);
        let _elsewhere = method(&mut model, "a.B", "helper", &["int"]);
        let class = model.lookup(EntityKind::Class, "a.A").unwrap();

        let mut record = UnresolvedMethodInvocation::new(
            InvocationKind::Method,
            caller,
            class,
            "helper",
            SourceAnchor::new("A.java", 0, 10),
        )
        .with_arguments(vec![typed("int")]);

        record.resolve(&model, &MethodIndex::build(&model));
        assert!(record.is_resolved());
        assert_eq!(record.receiver_type.as_deref(), Some("a.A"));
        assert_eq!(record.best_match(), Resolution::Unique(target));
        assert_monotone(&record);
    }

    #[test]
    fn test_unknown_argument_matches_softly_only_when_parameter_unknown() {
        let mut model = FactModel::new();
        let caller = method(&mut model, "a.A", "main", &[]);
        let typed_put = method(&mut model, "a.A", "put", &["java.lang.String"]);
        let loose_put = method(&mut model, "a.A", "put", &["<undef>.Key"]);
        let class = model.lookup(EntityKind::Class, "a.A").unwrap();

        let mut record = UnresolvedMethodInvocation::new(
            InvocationKind::Method,
            caller,
            class,
            "put",
            SourceAnchor::new("A.java", 0, 10),
        )
        .with_arguments(vec![ExpressionSummary::default()]);

        record.resolve(&model, &MethodIndex::build(&model));
        assert_eq!(record.argument_types, vec![UNDEFINED.to_string()]);
        assert!(record.matches_by_all_parameters_type.is_empty());
        assert_eq!(record.matches_by_all_parameters_type_soft, vec![loose_put]);
        assert!(!record.matches_by_all_parameters_type_soft.contains(&typed_put));
        assert_eq!(record.best_match(), Resolution::Unique(loose_put));
        assert_monotone(&record);
    }

    #[test]
    fn test_receiver_from_scope_variable() {
        let mut model = FactModel::new();
        let caller = method(&mut model, "a.A", "main", &[]);
        let class = model.lookup(EntityKind::Class, "a.A").unwrap();
        let t = model.get_or_create(EntityKind::Class, "a.T");
        let bar = method(&mut model, "a.T", "bar", &[]);
        let _other_bar = method(&mut model, "a.U", "bar", &[]);

        let foo = model.get_or_create(EntityKind::LocalVariable, "a.A.main().foo");
        model.set_parent(foo, caller).unwrap();
        model.entity_mut(foo).unwrap().declared_type = Some(t);

        let mut scope = ScopeSnapshot::new();
        scope.add_level(vec![("foo".to_string(), foo)]);

        let mut record = UnresolvedMethodInvocation::new(
            InvocationKind::Method,
            caller,
            class,
            "bar",
            SourceAnchor::new("A.java", 0, 9),
        )
        .with_receiver(Receiver::Expression(ExpressionSummary {
            text: "foo".into(),
            name: Some("foo".into()),
            ..Default::default()
        }))
        .with_scope(scope);

        record.resolve(&model, &MethodIndex::build(&model));
        assert_eq!(record.receiver_type.as_deref(), Some("a.T"));
        assert_eq!(record.best_match(), Resolution::Unique(bar));
    }

    #[test]
    fn test_ambiguous_receiver_name_stays_unresolved() {
        let mut model = FactModel::new();
        let caller = method(&mut model, "a.A", "main", &[]);
        let class = model.lookup(EntityKind::Class, "a.A").unwrap();
        let first = model.get_or_create(EntityKind::LocalVariable, "a.A.main().foo");
        let second = model.get_or_create(EntityKind::LocalVariable, "a.A.main().foo#1");

        let mut scope = ScopeSnapshot::new();
        scope.add_level(vec![("foo".to_string(), first), ("foo".to_string(), second)]);

        let mut record = UnresolvedMethodInvocation::new(
            InvocationKind::Method,
            caller,
            class,
            "bar",
            SourceAnchor::new("A.java", 0, 9),
        )
        .with_receiver(Receiver::Expression(ExpressionSummary {
            name: Some("foo".into()),
            ..Default::default()
        }))
        .with_scope(scope);

        record.resolve(&model, &MethodIndex::build(&model));
        assert_eq!(record.receiver_type, None);
        assert_eq!(record.best_match(), Resolution::Unresolved);
    }

    #[test]
    fn test_no_candidates_is_unresolved_not_an_error() {
        let mut model = FactModel::new();
        let caller = method(&mut model, "a.A", "main", &[]);
        let class = model.lookup(EntityKind::Class, "a.A").unwrap();

        let mut record = UnresolvedMethodInvocation::new(
            InvocationKind::Method,
            caller,
            class,
            "missing",
            SourceAnchor::new("A.java", 0, 9),
        );
        record.resolve(&model, &MethodIndex::build(&model));
        assert_eq!(record.state, ResolutionState::Resolved);
        assert!(record.matches_by_name.is_empty());
        assert_eq!(record.best_match(), Resolution::Unresolved);
    }

    #[test]
    fn test_link_policy() {
        let mut model = FactModel::new();
        let caller = method(&mut model, "a.A", "main", &[]);
        let first = method(&mut model, "a.A", "run", &["<undef>.X"]);
        let _second = method(&mut model, "a.A", "run", &["<undef>.Y"]);
        let class = model.lookup(EntityKind::Class, "a.A").unwrap();

        let mut record = UnresolvedMethodInvocation::new(
            InvocationKind::Method,
            caller,
            class,
            "run",
            SourceAnchor::new("A.java", 0, 9),
        )
        .with_arguments(vec![ExpressionSummary::default()]);
        record.resolve(&model, &MethodIndex::build(&model));
        assert!(matches!(record.best_match(), Resolution::Ambiguous(ref c) if c.len() == 2));

        let mut outcome = LinkOutcome::default();
        link_record(&mut model, &record, true, false, &mut outcome).unwrap();
        assert_eq!(outcome.ambiguous, 1);
        assert_eq!(outcome.linked, 0);
        assert_eq!(model.association_count(), 0);

        link_record(&mut model, &record, true, true, &mut outcome).unwrap();
        assert_eq!(outcome.linked, 1);
        assert!(model.has_association(AssociationKind::Invocation, caller, first));
    }
}
