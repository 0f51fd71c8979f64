//! Tree-sitter front end lowering Java source into the extractor AST.
//!
//! Bindings are attached only where syntax alone settles them: primitives,
//! literals, types declared in the unit, single-type imports and a handful of
//! `java.lang` types. Method bindings are never produced, so every call is
//! either linked through a declared method later or resolved by the deferred
//! engine.

use factgraph::Modifiers;
use factgraph_parser_api::{
    AnonymousClassDeclaration, CastExpression, CharIndex, ClassInstanceCreation, CompilationUnit,
    ConstructorInvocation, ExtractError, ExtractorConfig, Expression, FieldAccess,
    FieldDeclaration, FormalParameter, Initializer, InstanceOfExpression, MethodDeclaration,
    MethodInvocation, NameBinding, Node, NodeKind, QualifiedName, SimpleName, Span,
    SuperConstructorInvocation, SuperFieldAccess, SuperMethodInvocation, ThisExpression,
    TypeBinding, TypeBindingKind, TypeDeclaration, TypeDeclarationKind, TypeNode, TypeRef,
    VariableBinding, VariableDeclaration, VariableFragment,
};
use log::{debug, trace};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tree_sitter::{Node as TsNode, Parser};

const JAVA_LANG_CLASSES: &[&str] = &[
    "Object",
    "String",
    "StringBuilder",
    "Integer",
    "Long",
    "Short",
    "Byte",
    "Character",
    "Boolean",
    "Double",
    "Float",
    "Number",
    "Math",
    "System",
    "Thread",
    "Throwable",
    "Exception",
    "RuntimeException",
    "Error",
    "IllegalArgumentException",
    "IllegalStateException",
    "NullPointerException",
    "UnsupportedOperationException",
];

const JAVA_LANG_INTERFACES: &[&str] = &[
    "Runnable",
    "Iterable",
    "Comparable",
    "CharSequence",
    "Cloneable",
    "AutoCloseable",
];

const JAVA_LANG_GENERICS: &[(&str, &str)] = &[
    ("Comparable", "T"),
    ("Class", "T"),
    ("Iterable", "T"),
    ("Enum", "E"),
];

const TYPE_KINDS: &[&str] = &[
    "type_identifier",
    "scoped_type_identifier",
    "generic_type",
    "array_type",
    "integral_type",
    "floating_point_type",
    "boolean_type",
    "void_type",
    "annotated_type",
];

/// Lower Java source into a compilation unit.
///
/// Sources with syntax errors are rejected as a whole; the position of the
/// first error is reported.
pub fn lower(
    source: &str,
    path: &Path,
    config: &ExtractorConfig,
) -> Result<CompilationUnit, ExtractError> {
    if source.len() > config.max_file_size {
        return Err(ExtractError::FileTooLarge(path.to_path_buf(), source.len()));
    }

    let mut parser = Parser::new();
    let language = tree_sitter_java::language();
    parser
        .set_language(&language)
        .map_err(|e| ExtractError::ParseError(path.to_path_buf(), e.to_string()))?;

    let tree = parser.parse(source, None).ok_or_else(|| {
        ExtractError::ParseError(path.to_path_buf(), "Failed to parse".to_string())
    })?;

    let root = tree.root_node();
    if root.has_error() {
        let (line, column) = first_error(root)
            .map(|n| (n.start_position().row + 1, n.start_position().column + 1))
            .unwrap_or((0, 0));
        return Err(ExtractError::SyntaxError(
            path.to_path_buf(),
            line,
            column,
            "Syntax error".to_string(),
        ));
    }

    let bytes = source.as_bytes();
    let mut unit = CompilationUnit::new(path.display().to_string(), source);
    let mut table = TypeTable {
        chars: CharIndex::new(source),
        ..TypeTable::default()
    };
    let top = named_children(root);

    for node in &top {
        match node.kind() {
            "package_declaration" => {
                unit.package = named_children(*node)
                    .into_iter()
                    .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
                    .map(|c| dotted_name(c, bytes));
            }
            "import_declaration" => {
                let is_static = children(*node).iter().any(|c| c.kind() == "static");
                let is_wildcard = children(*node).iter().any(|c| c.kind() == "asterisk");
                let Some(name) = named_children(*node)
                    .into_iter()
                    .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
                    .map(|c| dotted_name(c, bytes))
                else {
                    continue;
                };
                if is_wildcard {
                    unit.imports.push(format!("{name}.*"));
                    continue;
                }
                if !is_static {
                    let simple = name.rsplit('.').next().unwrap_or(&name).to_string();
                    table.imports.insert(simple, name.clone());
                }
                unit.imports.push(name);
            }
            _ => {}
        }
    }
    table.package = unit.package.clone();

    let mut declared = Vec::new();
    for node in top.iter().filter(|n| is_type_declaration(n.kind())) {
        table.collect(*node, &[], bytes, &mut declared);
    }
    table.resolve_members(&declared, bytes);
    trace!("{} declares {} types", path.display(), table.declared.len());

    let mut lowerer = Lowerer::new(bytes, &table);
    unit.types = top
        .iter()
        .filter(|n| is_type_declaration(n.kind()))
        .map(|n| lowerer.type_declaration(*n, Placement::TopLevel))
        .collect();

    debug!(
        "Lowered {}: {} top-level types, {} imports",
        unit.path,
        unit.types.len(),
        unit.imports.len()
    );
    Ok(unit)
}

/// Where a type declaration sits; only top-level and member types get bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    TopLevel,
    Member,
    Local,
}

/// A type parameter in scope and its first bound.
#[derive(Debug, Clone)]
struct TypeVariable {
    name: String,
    bound: Option<TypeBinding>,
}

#[derive(Debug)]
struct DeclaredType {
    binding: TypeBinding,
    /// Binary names of the enclosing types and the type itself, outermost first
    chain: Vec<String>,
    /// Superclass, when it is declared in the same unit
    superclass: Option<String>,
    fields: Vec<(String, Option<TypeBinding>)>,
}

/// Types a unit can name without a compiler.
#[derive(Debug, Default)]
struct TypeTable {
    package: Option<String>,
    /// Simple name to qualified name of single-type imports
    imports: HashMap<String, String>,
    /// Top-level and member types declared in the unit, by binary name
    declared: HashMap<String, DeclaredType>,
    chars: CharIndex,
}

impl TypeTable {
    /// Character span of a syntax node.
    fn span(&self, node: TsNode<'_>) -> Span {
        self.chars.span(node.start_byte(), node.end_byte())
    }

    fn qualify(&self, name: &str) -> String {
        match self.package.as_deref() {
            Some(package) if !package.is_empty() => format!("{package}.{name}"),
            _ => name.to_string(),
        }
    }

    fn collect<'t>(
        &mut self,
        node: TsNode<'t>,
        outer: &[String],
        source: &[u8],
        out: &mut Vec<(String, TsNode<'t>)>,
    ) {
        let name = field_text(node, "name", source);
        let binary = match outer.last() {
            Some(outer) => format!("{outer}${name}"),
            None => self.qualify(&name),
        };
        let binding = match node.kind() {
            "interface_declaration" | "annotation_type_declaration" => {
                TypeBinding::interface(&binary)
            }
            "enum_declaration" => TypeBinding::enumeration(&binary),
            _ => TypeBinding::class(&binary),
        }
        .with_type_parameters(type_parameter_names(node, source));

        let mut chain = outer.to_vec();
        chain.push(binary.clone());
        self.declared.insert(
            binary.clone(),
            DeclaredType {
                binding,
                chain: chain.clone(),
                superclass: None,
                fields: Vec::new(),
            },
        );
        out.push((binary, node));

        if let Some(body) = node.child_by_field_name("body") {
            for member in body_members(body) {
                if is_type_declaration(member.kind()) {
                    self.collect(member, &chain, source, out);
                }
            }
        }
    }

    /// Resolve superclasses and field types once every declared type is known.
    fn resolve_members(&mut self, declared: &[(String, TsNode<'_>)], source: &[u8]) {
        let mut resolved = Vec::with_capacity(declared.len());
        for (binary, node) in declared {
            let Some(entry) = self.declared.get(binary) else {
                continue;
            };
            let chain = entry.chain.as_slice();
            let vars = self.type_variables(*node, source, chain, &[]);
            let vars = vars.as_slice();

            let superclass = node
                .child_by_field_name("superclass")
                .and_then(type_child)
                .and_then(|t| self.type_ref(t, source, chain, vars).binding)
                .map(|b| b.binary_name)
                .filter(|name| self.declared.contains_key(name));

            let mut fields = Vec::new();
            if let Some(components) = node.child_by_field_name("parameters") {
                for param in named_children(components) {
                    if let Some(type_node) = param.child_by_field_name("type") {
                        let binding = self.type_ref(type_node, source, chain, vars).binding;
                        fields.push((field_text(param, "name", source), binding));
                    }
                }
            }
            if let Some(body) = node.child_by_field_name("body") {
                for member in body_members(body) {
                    match member.kind() {
                        "field_declaration" | "constant_declaration" => {
                            let Some(type_node) = member.child_by_field_name("type") else {
                                continue;
                            };
                            let base = self.type_ref(type_node, source, chain, vars);
                            for declarator in declarators(member) {
                                let dims = dimension_count(
                                    declarator.child_by_field_name("dimensions"),
                                );
                                let typed = with_dimensions(base.clone(), dims);
                                fields
                                    .push((field_text(declarator, "name", source), typed.binding));
                            }
                        }
                        "enum_constant" => {
                            fields.push((
                                field_text(member, "name", source),
                                Some(entry.binding.clone()),
                            ));
                        }
                        _ => {}
                    }
                }
            }
            resolved.push((binary.clone(), superclass, fields));
        }

        for (binary, superclass, fields) in resolved {
            if let Some(entry) = self.declared.get_mut(&binary) {
                entry.superclass = superclass;
                entry.fields = fields;
            }
        }
    }

    /// Type parameters declared by `node`, each bound resolved in the scope
    /// of `outer` and the parameters before it.
    fn type_variables(
        &self,
        node: TsNode<'_>,
        source: &[u8],
        chain: &[String],
        outer: &[TypeVariable],
    ) -> Vec<TypeVariable> {
        let Some(parameters) = node.child_by_field_name("type_parameters") else {
            return Vec::new();
        };
        let mut scope = outer.to_vec();
        let mut declared = Vec::new();
        for parameter in named_children(parameters)
            .into_iter()
            .filter(|p| p.kind() == "type_parameter")
        {
            let parts = named_children(parameter);
            let Some(name) = parts
                .iter()
                .find(|c| matches!(c.kind(), "type_identifier" | "identifier"))
                .map(|n| text(*n, source).to_string())
            else {
                continue;
            };
            let bound = parts
                .iter()
                .find(|c| c.kind() == "type_bound")
                .and_then(|b| named_children(*b).into_iter().next())
                .and_then(|t| self.type_node(t, source, chain, &scope).1);
            let variable = TypeVariable { name, bound };
            scope.push(variable.clone());
            declared.push(variable);
        }
        declared
    }

    /// A type reference with whatever binding the unit can provide.
    fn type_ref(
        &self,
        node: TsNode<'_>,
        source: &[u8],
        chain: &[String],
        vars: &[TypeVariable],
    ) -> TypeRef {
        let (type_node, binding) = self.type_node(node, source, chain, vars);
        TypeRef {
            span: self.span(node),
            node: type_node,
            binding,
        }
    }

    fn type_node(
        &self,
        node: TsNode<'_>,
        source: &[u8],
        chain: &[String],
        vars: &[TypeVariable],
    ) -> (TypeNode, Option<TypeBinding>) {
        match node.kind() {
            "integral_type" | "floating_point_type" | "boolean_type" | "void_type" => {
                let keyword = text(node, source).trim().to_string();
                let binding = TypeBinding::primitive(&keyword);
                (TypeNode::Primitive(keyword), Some(binding))
            }
            "type_identifier" | "identifier" => {
                let name = text(node, source).to_string();
                let binding = self.resolve_name(&name, chain, vars);
                (TypeNode::Simple(name), binding)
            }
            "scoped_type_identifier" => {
                let name = dotted_name(node, source);
                let binding = self.resolve_qualified(&name, chain, vars);
                (TypeNode::Qualified(name), binding)
            }
            "generic_type" => {
                let parts = named_children(node);
                let Some(base) = parts.first() else {
                    return (TypeNode::Wildcard, None);
                };
                let (base, binding) = self.type_node(*base, source, chain, vars);
                let arguments = parts
                    .iter()
                    .filter(|p| p.kind() == "type_arguments")
                    .flat_map(|p| named_children(*p))
                    .map(|a| self.type_node(a, source, chain, vars).0)
                    .collect();
                (
                    TypeNode::Parameterized {
                        base: Box::new(base),
                        arguments,
                    },
                    binding,
                )
            }
            "array_type" => {
                let dims = dimension_count(node.child_by_field_name("dimensions"));
                let Some(element) = node.child_by_field_name("element") else {
                    return (TypeNode::Wildcard, None);
                };
                let element = self.type_ref(element, source, chain, vars);
                let typed = with_dimensions(element, dims);
                (typed.node, typed.binding)
            }
            "annotated_type" => match type_child(node) {
                Some(inner) => self.type_node(inner, source, chain, vars),
                None => (TypeNode::Wildcard, None),
            },
            _ => (TypeNode::Wildcard, None),
        }
    }

    /// Binding of a simple type name, innermost declaration first.
    fn resolve_name(
        &self,
        name: &str,
        chain: &[String],
        vars: &[TypeVariable],
    ) -> Option<TypeBinding> {
        if let Some(var) = vars.iter().rev().find(|v| v.name == name) {
            return Some(TypeBinding::type_variable(name).with_bound(var.bound.clone()));
        }
        for outer in chain.iter().rev() {
            if let Some(member) = self.declared.get(&format!("{outer}${name}")) {
                return Some(member.binding.clone());
            }
        }
        if let Some(top) = self.declared.get(&self.qualify(name)) {
            return Some(top.binding.clone());
        }
        if let Some(imported) = self.imports.get(name) {
            return Some(match self.declared.get(imported) {
                Some(declared) => declared.binding.clone(),
                None => TypeBinding::class(imported),
            });
        }
        java_lang(name)
    }

    /// Binding of a dotted type name such as `Outer.Inner` or `p.Outer`.
    fn resolve_qualified(
        &self,
        name: &str,
        chain: &[String],
        vars: &[TypeVariable],
    ) -> Option<TypeBinding> {
        if let Some(declared) = self.declared.get(name) {
            return Some(declared.binding.clone());
        }
        let (first, rest) = name.split_once('.')?;
        let outer = self.resolve_name(first, chain, vars)?;
        let binary = format!("{}${}", outer.binary_name, rest.replace('.', "$"));
        self.declared.get(&binary).map(|d| d.binding.clone())
    }

    /// A field of a declared type or of one of its declared superclasses.
    fn field(&self, class: &str, name: &str) -> Option<VariableBinding> {
        let mut seen = HashSet::new();
        let mut current = Some(class);
        while let Some(binary) = current {
            if !seen.insert(binary) {
                break;
            }
            let entry = self.declared.get(binary)?;
            if let Some((_, type_binding)) = entry.fields.iter().find(|(n, _)| n == name) {
                return Some(VariableBinding {
                    name: name.to_string(),
                    is_field: true,
                    declaring_class: Some(entry.binding.clone()),
                    type_binding: type_binding.clone(),
                    modifiers: Modifiers::empty(),
                });
            }
            current = entry.superclass.as_deref();
        }
        None
    }

    /// Every field visible by simple name inside a declared type.
    fn visible_fields(&self, class: &str) -> HashMap<String, Option<VariableBinding>> {
        let mut visible = HashMap::new();
        let mut seen = HashSet::new();
        let mut current = Some(class);
        while let Some(binary) = current {
            if !seen.insert(binary) {
                break;
            }
            let Some(entry) = self.declared.get(binary) else {
                break;
            };
            for (name, _) in &entry.fields {
                if !visible.contains_key(name) {
                    visible.insert(name.clone(), self.field(binary, name));
                }
            }
            current = entry.superclass.as_deref();
        }
        visible
    }
}

fn java_lang(name: &str) -> Option<TypeBinding> {
    let parameters: Vec<String> = JAVA_LANG_GENERICS
        .iter()
        .filter(|(generic, _)| *generic == name)
        .map(|(_, parameter)| parameter.to_string())
        .collect();
    let binary = format!("java.lang.{name}");
    let binding = if JAVA_LANG_INTERFACES.contains(&name) {
        TypeBinding::interface(binary)
    } else if JAVA_LANG_CLASSES.contains(&name) || !parameters.is_empty() {
        TypeBinding::class(binary)
    } else {
        return None;
    };
    Some(binding.with_type_parameters(parameters))
}

type VariableLevel = HashMap<String, Option<VariableBinding>>;

/// Walks the syntax tree once, tracking just enough scope to bind names.
struct Lowerer<'s> {
    source: &'s [u8],
    table: &'s TypeTable,
    /// Enclosing declared types, outermost first
    chain: Vec<String>,
    type_vars: Vec<TypeVariable>,
    /// Type of `this`; `None` inside local and anonymous classes
    this_types: Vec<Option<TypeBinding>>,
    /// Variables by scope level; a `None` entry shadows without binding
    variables: Vec<VariableLevel>,
    record_components: Vec<FormalParameter>,
}

impl<'s> Lowerer<'s> {
    fn new(source: &'s [u8], table: &'s TypeTable) -> Self {
        Self {
            source,
            table,
            chain: Vec::new(),
            type_vars: Vec::new(),
            this_types: Vec::new(),
            variables: Vec::new(),
            record_components: Vec::new(),
        }
    }

    fn text(&self, node: TsNode<'_>) -> &'s str {
        text(node, self.source)
    }

    fn span(&self, node: TsNode<'_>) -> Span {
        self.table.span(node)
    }

    fn type_ref(&self, node: TsNode<'_>) -> TypeRef {
        self.table
            .type_ref(node, self.source, &self.chain, &self.type_vars)
    }

    /// Type of a field of `node`, or an unnamed type when the field is absent.
    fn type_field(&self, node: TsNode<'_>, field: &str) -> TypeRef {
        match node.child_by_field_name(field) {
            Some(type_node) => self.type_ref(type_node),
            None => TypeRef::unbound(self.span(node), TypeNode::Wildcard),
        }
    }

    fn this_type(&self) -> Option<TypeBinding> {
        self.this_types.last().cloned().flatten()
    }

    fn declare(&mut self, name: &str, binding: Option<VariableBinding>) {
        if let Some(level) = self.variables.last_mut() {
            level.insert(name.to_string(), binding);
        }
    }

    fn declare_local(&mut self, name: &str, type_ref: &TypeRef) {
        let binding = VariableBinding {
            name: name.to_string(),
            is_field: false,
            declaring_class: None,
            type_binding: type_ref.binding.clone(),
            modifiers: Modifiers::empty(),
        };
        self.declare(name, Some(binding));
    }

    fn variable(&self, name: &str) -> Option<Option<VariableBinding>> {
        self.variables
            .iter()
            .rev()
            .find_map(|level| level.get(name))
            .cloned()
    }

    fn field_of(&self, owner: Option<&TypeBinding>, name: &str) -> Option<VariableBinding> {
        let owner = owner?;
        match owner.kind {
            TypeBindingKind::Class | TypeBindingKind::Interface | TypeBindingKind::Enum => {
                self.table.field(&owner.binary_name, name)
            }
            _ => None,
        }
    }

    fn type_declaration(&mut self, node: TsNode<'_>, placement: Placement) -> Node {
        let name_node = node.child_by_field_name("name");
        let name = name_node.map(|n| self.text(n).to_string()).unwrap_or_default();
        let binary = match placement {
            Placement::TopLevel => Some(self.table.qualify(&name)),
            Placement::Member => match self.this_types.last() {
                Some(Some(outer)) => Some(format!("{}${name}", outer.binary_name)),
                _ => None,
            },
            Placement::Local => None,
        };
        let binding = binary
            .as_deref()
            .and_then(|b| self.table.declared.get(b))
            .map(|d| d.binding.clone());

        let kind = match node.kind() {
            "interface_declaration" | "annotation_type_declaration" => {
                TypeDeclarationKind::Interface
            }
            "enum_declaration" => TypeDeclarationKind::Enum,
            _ => TypeDeclarationKind::Class,
        };
        let type_parameters = type_parameter_names(node, self.source);
        let vars_depth = self.type_vars.len();
        let vars = self
            .table
            .type_variables(node, self.source, &self.chain, &self.type_vars);
        self.type_vars.extend(vars);

        let superclass = node
            .child_by_field_name("superclass")
            .and_then(type_child)
            .map(|t| self.type_ref(t));
        let interfaces = children(node)
            .into_iter()
            .filter(|c| matches!(c.kind(), "super_interfaces" | "extends_interfaces"))
            .flat_map(named_children)
            .filter(|c| c.kind() == "type_list")
            .flat_map(named_children)
            .map(|t| self.type_ref(t))
            .collect();

        let pushed_chain = match &binding {
            Some(b) => {
                self.chain.push(b.binary_name.clone());
                true
            }
            None => false,
        };
        self.this_types.push(binding.clone());
        let body_node = node.child_by_field_name("body");
        let level = match &binding {
            Some(b) => self.table.visible_fields(&b.binary_name),
            None => body_node
                .map(|b| own_field_names(b, self.source))
                .unwrap_or_default()
                .into_iter()
                .map(|f| (f, None))
                .collect(),
        };
        self.variables.push(level);

        let mut body = Vec::new();
        let components = if node.kind() == "record_declaration" {
            let components = self.formal_parameters(node.child_by_field_name("parameters"));
            for component in &components {
                body.push(component_field(component));
            }
            components
        } else {
            Vec::new()
        };
        let saved_components = std::mem::replace(&mut self.record_components, components);

        let enum_type = (kind == TypeDeclarationKind::Enum).then(|| TypeRef {
            span: name_node.map_or_else(|| self.span(node), |n| self.span(n)),
            node: TypeNode::Simple(name.clone()),
            binding: binding.clone(),
        });
        if let Some(body_node) = body_node {
            body.extend(self.members(body_node, enum_type.as_ref()));
        }

        self.record_components = saved_components;
        self.variables.pop();
        self.this_types.pop();
        if pushed_chain {
            self.chain.pop();
        }
        self.type_vars.truncate(vars_depth);

        Node::new(
            self.span(node),
            NodeKind::TypeDeclaration(TypeDeclaration {
                kind,
                name,
                modifiers: modifiers(node),
                binding,
                type_parameters,
                superclass,
                interfaces,
                body,
            }),
        )
    }

    fn members(&mut self, body: TsNode<'_>, enum_type: Option<&TypeRef>) -> Vec<Node> {
        body_members(body)
            .into_iter()
            .filter_map(|member| self.member(member, enum_type))
            .collect()
    }

    fn member(&mut self, node: TsNode<'_>, enum_type: Option<&TypeRef>) -> Option<Node> {
        let kind = match node.kind() {
            "field_declaration" | "constant_declaration" => {
                NodeKind::FieldDeclaration(self.field_declaration(node))
            }
            "method_declaration" => NodeKind::MethodDeclaration(self.method_declaration(node, false)),
            "constructor_declaration" | "compact_constructor_declaration" => {
                NodeKind::MethodDeclaration(self.method_declaration(node, true))
            }
            "block" => NodeKind::Initializer(Initializer {
                is_static: false,
                body: Box::new(self.block(node)),
            }),
            "static_initializer" => {
                let block = named_children(node)
                    .into_iter()
                    .find(|c| c.kind() == "block")?;
                NodeKind::Initializer(Initializer {
                    is_static: true,
                    body: Box::new(self.block(block)),
                })
            }
            "enum_constant" => NodeKind::FieldDeclaration(self.enum_constant(node, enum_type?)),
            kind if is_type_declaration(kind) => {
                return Some(self.type_declaration(node, Placement::Member));
            }
            _ => return None,
        };
        Some(Node::new(self.span(node), kind))
    }

    fn field_declaration(&mut self, node: TsNode<'_>) -> FieldDeclaration {
        let type_ref = self.type_field(node, "type");
        let fragments = declarators(node)
            .into_iter()
            .map(|d| self.fragment(d))
            .collect();
        FieldDeclaration {
            modifiers: modifiers(node),
            type_ref,
            fragments,
        }
    }

    /// An enum constant is a static final field initialized by a creation.
    fn enum_constant(&mut self, node: TsNode<'_>, enum_type: &TypeRef) -> FieldDeclaration {
        let span = self.span(node);
        let arguments = self.arguments(node.child_by_field_name("arguments"));
        let anonymous = node
            .child_by_field_name("body")
            .map(|b| self.anonymous_body(b));
        let creation = Node::new(
            span,
            NodeKind::ClassInstanceCreation(ClassInstanceCreation {
                type_ref: enum_type.clone(),
                receiver: None,
                arguments,
                binding: None,
                anonymous,
            }),
        );
        FieldDeclaration {
            modifiers: Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL,
            type_ref: enum_type.clone(),
            fragments: vec![VariableFragment {
                span,
                name: field_text(node, "name", self.source),
                extra_dimensions: 0,
                binding: None,
                initializer: Some(Box::new(creation)),
            }],
        }
    }

    fn anonymous_body(&mut self, body: TsNode<'_>) -> AnonymousClassDeclaration {
        self.this_types.push(None);
        self.variables.push(
            own_field_names(body, self.source)
                .into_iter()
                .map(|f| (f, None))
                .collect(),
        );
        let members = self.members(body, None);
        self.variables.pop();
        self.this_types.pop();
        AnonymousClassDeclaration {
            span: self.span(body),
            binding: None,
            body: members,
        }
    }

    fn method_declaration(&mut self, node: TsNode<'_>, is_constructor: bool) -> MethodDeclaration {
        let vars_depth = self.type_vars.len();
        let vars = self
            .table
            .type_variables(node, self.source, &self.chain, &self.type_vars);
        self.type_vars.extend(vars);

        let parameters = if node.kind() == "compact_constructor_declaration" {
            self.record_components.clone()
        } else {
            self.formal_parameters(node.child_by_field_name("parameters"))
        };
        let return_type = (!is_constructor).then(|| {
            let dims = dimension_count(node.child_by_field_name("dimensions"));
            with_dimensions(self.type_field(node, "type"), dims)
        });

        self.variables.push(HashMap::new());
        for parameter in &parameters {
            self.declare_local(&parameter.name, &parameter.type_ref);
        }
        let body = node
            .child_by_field_name("body")
            .map(|b| Box::new(self.block(b)));
        self.variables.pop();
        self.type_vars.truncate(vars_depth);

        MethodDeclaration {
            name: field_text(node, "name", self.source),
            is_constructor,
            modifiers: modifiers(node),
            binding: None,
            parameters,
            return_type,
            body,
        }
    }

    fn formal_parameters(&self, node: Option<TsNode<'_>>) -> Vec<FormalParameter> {
        let Some(node) = node else {
            return Vec::new();
        };
        named_children(node)
            .into_iter()
            .filter_map(|param| match param.kind() {
                "formal_parameter" => {
                    let dims = dimension_count(param.child_by_field_name("dimensions"));
                    Some(FormalParameter {
                        span: self.span(param),
                        name: field_text(param, "name", self.source),
                        type_ref: with_dimensions(self.type_field(param, "type"), dims),
                        modifiers: modifiers(param),
                        binding: None,
                    })
                }
                "spread_parameter" => {
                    let declarator = named_children(param)
                        .into_iter()
                        .find(|c| c.kind() == "variable_declarator")?;
                    let dims = dimension_count(declarator.child_by_field_name("dimensions"));
                    let type_ref = match type_child(param) {
                        Some(t) => self.type_ref(t),
                        None => TypeRef::unbound(self.span(param), TypeNode::Wildcard),
                    };
                    Some(FormalParameter {
                        span: self.span(param),
                        name: field_text(declarator, "name", self.source),
                        type_ref: with_dimensions(type_ref, dims + 1),
                        modifiers: modifiers(param),
                        binding: None,
                    })
                }
                _ => None,
            })
            .collect()
    }

    fn fragment(&mut self, node: TsNode<'_>) -> VariableFragment {
        VariableFragment {
            span: self.span(node),
            name: field_text(node, "name", self.source),
            extra_dimensions: dimension_count(node.child_by_field_name("dimensions")),
            binding: None,
            initializer: node
                .child_by_field_name("value")
                .and_then(|v| self.lower(v))
                .map(Box::new),
        }
    }

    /// Method bodies, constructor bodies and nested blocks.
    fn block(&mut self, node: TsNode<'_>) -> Node {
        self.variables.push(HashMap::new());
        let statements = named_children(node)
            .into_iter()
            .filter_map(|s| self.lower(s))
            .collect();
        self.variables.pop();
        Node::block(self.span(node), statements)
    }

    fn local_variables(&mut self, node: TsNode<'_>) -> VariableDeclaration {
        let mut type_ref = self.type_field(node, "type");
        let fragments: Vec<VariableFragment> = declarators(node)
            .into_iter()
            .map(|d| self.fragment(d))
            .collect();

        // `var` takes the type of its initializer when that is known
        if type_ref.binding.is_none() && type_ref.node == TypeNode::Simple("var".into()) {
            type_ref.binding = fragments
                .first()
                .and_then(|f| f.initializer.as_deref())
                .and_then(Node::type_binding)
                .cloned();
        }
        for fragment in &fragments {
            let typed = with_dimensions(type_ref.clone(), fragment.extra_dimensions);
            self.declare_local(&fragment.name, &typed);
        }
        VariableDeclaration {
            modifiers: modifiers(node),
            type_ref,
            fragments,
        }
    }

    /// Lower a statement or expression; `None` for nodes with nothing to extract.
    fn lower(&mut self, node: TsNode<'_>) -> Option<Node> {
        let span = self.span(node);
        if let Some(binding) = literal_type(node, self.source) {
            return Some(Node::typed_expression(span, binding));
        }
        let kind = match node.kind() {
            "block" | "constructor_body" => return Some(self.block(node)),
            "expression_statement" | "parenthesized_expression" => {
                return first_named(node).and_then(|c| self.lower(c));
            }
            "labeled_statement" => {
                return named_children(node)
                    .into_iter()
                    .last()
                    .and_then(|c| self.lower(c));
            }
            "break_statement" | "continue_statement" | "line_comment" | "block_comment"
            | "annotation" | "marker_annotation" | "modifiers" | "type_arguments"
            | "dimensions" | "throws" => return None,
            kind if TYPE_KINDS.contains(&kind) => return None,
            kind if is_type_declaration(kind) => {
                return Some(self.type_declaration(node, Placement::Local));
            }
            "local_variable_declaration" => {
                NodeKind::LocalVariableDeclaration(self.local_variables(node))
            }
            "explicit_constructor_invocation" => self.constructor_call(node),
            "method_invocation" => self.method_invocation(node),
            "object_creation_expression" => self.instance_creation(node),
            "field_access" => self.field_access(node),
            "identifier" => NodeKind::SimpleName(self.simple_name(node)),
            "this" => NodeKind::This(ThisExpression {
                qualifier: None,
                binding: self.this_type(),
            }),
            "cast_expression" => NodeKind::Cast(CastExpression {
                type_ref: self.type_field(node, "type"),
                expression: Box::new(self.operand(node.child_by_field_name("value"), span)),
            }),
            "instanceof_expression" => return self.instance_of(node),
            "lambda_expression" => return Some(self.lambda(node)),
            "enhanced_for_statement" => return Some(self.enhanced_for(node)),
            "catch_clause" => return Some(self.catch_clause(node)),
            "resource" => return self.resource(node),
            "array_creation_expression" => return self.array_creation(node),
            "for_statement" | "try_with_resources_statement" | "switch_block" => {
                self.variables.push(HashMap::new());
                let lowered = self.generic(node);
                self.variables.pop();
                return lowered;
            }
            _ => return self.generic(node),
        };
        Some(Node::new(span, kind))
    }

    /// Any other node: its type when operators settle it, plus its children.
    fn generic(&mut self, node: TsNode<'_>) -> Option<Node> {
        let type_binding = operator_type(node, self.source);
        let children: Vec<Node> = named_children(node)
            .into_iter()
            .filter_map(|c| self.lower(c))
            .collect();
        if children.is_empty() && type_binding.is_none() {
            return None;
        }
        Some(Node::new(
            self.span(node),
            NodeKind::Expression(Expression {
                type_binding,
                declares: None,
                children,
            }),
        ))
    }

    /// An expression in a position that must not disappear, such as an argument.
    fn operand(&mut self, node: Option<TsNode<'_>>, fallback: Span) -> Node {
        match node {
            Some(node) => self.lower(node).unwrap_or_else(|| {
                Node::new(self.span(node), NodeKind::Expression(Expression::default()))
            }),
            None => Node::new(fallback, NodeKind::Expression(Expression::default())),
        }
    }

    fn arguments(&mut self, node: Option<TsNode<'_>>) -> Vec<Node> {
        let Some(node) = node else {
            return Vec::new();
        };
        named_children(node)
            .into_iter()
            .filter(|c| !matches!(c.kind(), "line_comment" | "block_comment"))
            .map(|c| self.operand(Some(c), self.span(c)))
            .collect()
    }

    fn method_invocation(&mut self, node: TsNode<'_>) -> NodeKind {
        let name = field_text(node, "name", self.source);
        let object = node.child_by_field_name("object");
        let arguments = self.arguments(node.child_by_field_name("arguments"));
        let qualified_super = children(node)
            .iter()
            .any(|c| c.kind() == "super" && Some(c.id()) != object.map(|o| o.id()));

        match object {
            Some(o) if o.kind() == "super" => {
                NodeKind::SuperMethodInvocation(SuperMethodInvocation {
                    name,
                    qualifier: None,
                    arguments,
                    binding: None,
                    type_binding: None,
                })
            }
            Some(o) if qualified_super => NodeKind::SuperMethodInvocation(SuperMethodInvocation {
                name,
                qualifier: Some(dotted_name(o, self.source)),
                arguments,
                binding: None,
                type_binding: None,
            }),
            _ => NodeKind::MethodInvocation(MethodInvocation {
                name,
                receiver: object.map(|o| Box::new(self.operand(Some(o), self.span(o)))),
                arguments,
                binding: None,
                type_binding: None,
            }),
        }
    }

    fn constructor_call(&mut self, node: TsNode<'_>) -> NodeKind {
        let arguments = self.arguments(node.child_by_field_name("arguments"));
        let is_this = node
            .child_by_field_name("constructor")
            .is_some_and(|c| c.kind() == "this");
        if is_this {
            return NodeKind::ConstructorInvocation(ConstructorInvocation {
                arguments,
                binding: None,
            });
        }
        let receiver = node
            .child_by_field_name("object")
            .map(|o| Box::new(self.operand(Some(o), self.span(o))));
        NodeKind::SuperConstructorInvocation(SuperConstructorInvocation {
            receiver,
            arguments,
            binding: None,
        })
    }

    fn instance_creation(&mut self, node: TsNode<'_>) -> NodeKind {
        let mut outer = None;
        for child in children(node) {
            if child.kind() == "new" {
                break;
            }
            if child.is_named() {
                outer = Some(child);
            }
        }
        let receiver = outer.map(|o| Box::new(self.operand(Some(o), self.span(o))));
        let type_ref = self.type_field(node, "type");
        let arguments = self.arguments(node.child_by_field_name("arguments"));
        let anonymous = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "class_body")
            .map(|b| self.anonymous_body(b));
        NodeKind::ClassInstanceCreation(ClassInstanceCreation {
            type_ref,
            receiver,
            arguments,
            binding: None,
            anonymous,
        })
    }

    fn field_access(&mut self, node: TsNode<'_>) -> NodeKind {
        let span = self.span(node);
        let object = node.child_by_field_name("object");
        let field = node.child_by_field_name("field");
        let name = field.map(|f| self.text(f).to_string()).unwrap_or_default();

        if let (Some(object), Some(field)) = (object, field) {
            if field.kind() == "this" {
                let qualifier = dotted_name(object, self.source);
                let binding = self
                    .table
                    .resolve_qualified(&qualifier, &self.chain, &self.type_vars)
                    .or_else(|| {
                        self.table
                            .resolve_name(&qualifier, &self.chain, &self.type_vars)
                    });
                return NodeKind::This(ThisExpression {
                    qualifier: Some(qualifier),
                    binding,
                });
            }
        }

        let qualified_super = children(node)
            .iter()
            .any(|c| c.kind() == "super" && Some(c.id()) != object.map(|o| o.id()));
        match object {
            Some(o) if o.kind() == "super" => NodeKind::SuperFieldAccess(SuperFieldAccess {
                qualifier: None,
                name,
                binding: None,
            }),
            Some(o) if qualified_super => NodeKind::SuperFieldAccess(SuperFieldAccess {
                qualifier: Some(dotted_name(o, self.source)),
                name,
                binding: None,
            }),
            Some(o) if is_name_chain(o) => {
                let qualifier = self.operand(Some(o), self.span(o));
                let binding = match self.field_of(qualifier.type_binding(), &name) {
                    Some(field) => Some(NameBinding::Variable(field)),
                    None => {
                        let dotted = dotted_name(node, self.source);
                        self.table
                            .resolve_qualified(&dotted, &self.chain, &self.type_vars)
                            .map(NameBinding::Type)
                    }
                };
                NodeKind::QualifiedName(QualifiedName {
                    qualifier: Box::new(qualifier),
                    name,
                    binding,
                })
            }
            _ => {
                let receiver = self.operand(object, span);
                let binding = self.field_of(receiver.type_binding(), &name);
                NodeKind::FieldAccess(FieldAccess {
                    receiver: Box::new(receiver),
                    name,
                    binding,
                })
            }
        }
    }

    fn simple_name(&self, node: TsNode<'_>) -> SimpleName {
        let identifier = self.text(node).to_string();
        let binding = match self.variable(&identifier) {
            Some(variable) => variable.map(NameBinding::Variable),
            None => self
                .table
                .resolve_name(&identifier, &self.chain, &self.type_vars)
                .filter(|b| b.kind != TypeBindingKind::TypeVariable)
                .map(NameBinding::Type),
        };
        SimpleName {
            identifier,
            binding,
        }
    }

    /// `x instanceof T`; a pattern variable is declared by a wrapping node.
    fn instance_of(&mut self, node: TsNode<'_>) -> Option<Node> {
        let span = self.span(node);
        let Some(right) = node.child_by_field_name("right") else {
            return self.generic(node);
        };
        let type_ref = self.type_ref(right);
        let check = Node::new(
            span,
            NodeKind::InstanceOf(InstanceOfExpression {
                expression: Box::new(self.operand(node.child_by_field_name("left"), span)),
                type_ref: type_ref.clone(),
                type_binding: Some(TypeBinding::primitive("boolean")),
            }),
        );
        let Some(name) = node.child_by_field_name("name") else {
            return Some(check);
        };
        let name = self.text(name).to_string();
        self.declare_local(&name, &type_ref);
        Some(Node::new(
            span,
            NodeKind::Expression(Expression {
                type_binding: Some(TypeBinding::primitive("boolean")),
                declares: Some((name, type_ref)),
                children: vec![check],
            }),
        ))
    }

    /// Only the body of a lambda is extracted, inside the enclosing method.
    fn lambda(&mut self, node: TsNode<'_>) -> Node {
        self.variables.push(HashMap::new());
        if let Some(parameters) = node.child_by_field_name("parameters") {
            match parameters.kind() {
                "identifier" => {
                    let name = self.text(parameters).to_string();
                    self.declare(&name, None);
                }
                _ => {
                    for param in named_children(parameters) {
                        match param.kind() {
                            "identifier" => {
                                let name = self.text(param).to_string();
                                self.declare(&name, None);
                            }
                            "formal_parameter" => {
                                let name = field_text(param, "name", self.source);
                                let type_ref = self.type_field(param, "type");
                                self.declare_local(&name, &type_ref);
                            }
                            _ => {}
                        }
                    }
                }
            }
        }
        let body = node
            .child_by_field_name("body")
            .and_then(|b| self.lower(b));
        self.variables.pop();
        Node::new(
            self.span(node),
            NodeKind::Expression(Expression {
                children: body.into_iter().collect(),
                ..Default::default()
            }),
        )
    }

    fn enhanced_for(&mut self, node: TsNode<'_>) -> Node {
        let dims = dimension_count(node.child_by_field_name("dimensions"));
        let type_ref = with_dimensions(self.type_field(node, "type"), dims);
        let name = field_text(node, "name", self.source);
        let mut children: Vec<Node> = node
            .child_by_field_name("value")
            .and_then(|v| self.lower(v))
            .into_iter()
            .collect();

        self.variables.push(HashMap::new());
        self.declare_local(&name, &type_ref);
        children.extend(node.child_by_field_name("body").and_then(|b| self.lower(b)));
        self.variables.pop();

        Node::new(
            self.span(node),
            NodeKind::Expression(Expression {
                type_binding: None,
                declares: Some((name, type_ref)),
                children,
            }),
        )
    }

    fn catch_clause(&mut self, node: TsNode<'_>) -> Node {
        let parameter = named_children(node)
            .into_iter()
            .find(|c| c.kind() == "catch_formal_parameter");
        let name = parameter
            .map(|p| field_text(p, "name", self.source))
            .unwrap_or_default();
        // A multi-catch parameter is typed by its first alternative
        let type_ref = parameter
            .and_then(|p| named_children(p).into_iter().find(|c| c.kind() == "catch_type"))
            .and_then(type_child)
            .map(|t| self.type_ref(t))
            .unwrap_or_else(|| TypeRef::unbound(self.span(node), TypeNode::Wildcard));

        self.variables.push(HashMap::new());
        self.declare_local(&name, &type_ref);
        let body = node.child_by_field_name("body").map(|b| self.block(b));
        self.variables.pop();

        Node::new(
            self.span(node),
            NodeKind::Expression(Expression {
                type_binding: None,
                declares: Some((name, type_ref)),
                children: body.into_iter().collect(),
            }),
        )
    }

    fn resource(&mut self, node: TsNode<'_>) -> Option<Node> {
        let Some(name) = node.child_by_field_name("name") else {
            return first_named(node).and_then(|c| self.lower(c));
        };
        let name = self.text(name).to_string();
        let type_ref = self.type_field(node, "type");
        let value = node
            .child_by_field_name("value")
            .and_then(|v| self.lower(v));
        self.declare_local(&name, &type_ref);
        Some(Node::new(
            self.span(node),
            NodeKind::Expression(Expression {
                type_binding: None,
                declares: Some((name, type_ref)),
                children: value.into_iter().collect(),
            }),
        ))
    }

    fn array_creation(&mut self, node: TsNode<'_>) -> Option<Node> {
        let dims: usize = children(node)
            .into_iter()
            .map(|c| match c.kind() {
                "dimensions_expr" => 1,
                "dimensions" => dimension_count(Some(c)),
                _ => 0,
            })
            .sum();
        let type_binding = node
            .child_by_field_name("type")
            .and_then(|t| self.type_ref(t).binding)
            .map(|element| TypeBinding::array(element, dims.max(1)));
        let children = named_children(node)
            .into_iter()
            .filter_map(|c| self.lower(c))
            .collect();
        Some(Node::new(
            self.span(node),
            NodeKind::Expression(Expression {
                type_binding,
                declares: None,
                children,
            }),
        ))
    }
}

/// Field holding a record component.
fn component_field(component: &FormalParameter) -> Node {
    Node::new(
        component.span,
        NodeKind::FieldDeclaration(FieldDeclaration {
            modifiers: Modifiers::PRIVATE | Modifiers::FINAL,
            type_ref: component.type_ref.clone(),
            fragments: vec![VariableFragment {
                span: component.span,
                name: component.name.clone(),
                extra_dimensions: 0,
                binding: None,
                initializer: None,
            }],
        }),
    )
}

fn literal_type(node: TsNode<'_>, source: &[u8]) -> Option<TypeBinding> {
    let binding = match node.kind() {
        "decimal_integer_literal"
        | "hex_integer_literal"
        | "octal_integer_literal"
        | "binary_integer_literal" => {
            if text(node, source).ends_with(['l', 'L']) {
                TypeBinding::primitive("long")
            } else {
                TypeBinding::primitive("int")
            }
        }
        "decimal_floating_point_literal" | "hex_floating_point_literal" => {
            if text(node, source).ends_with(['f', 'F']) {
                TypeBinding::primitive("float")
            } else {
                TypeBinding::primitive("double")
            }
        }
        "true" | "false" => TypeBinding::primitive("boolean"),
        "character_literal" => TypeBinding::primitive("char"),
        "string_literal" | "text_block" => TypeBinding::class("java.lang.String"),
        "null_literal" => TypeBinding::null(),
        "class_literal" => java_lang("Class")?,
        _ => return None,
    };
    Some(binding)
}

/// Comparisons, logical operators and negation are `boolean`.
fn operator_type(node: TsNode<'_>, source: &[u8]) -> Option<TypeBinding> {
    let operator = node.child_by_field_name("operator")?;
    let op = text(operator, source);
    let boolean = match node.kind() {
        "binary_expression" => {
            matches!(op, ">" | "<" | ">=" | "<=" | "==" | "!=" | "&&" | "||")
        }
        "unary_expression" => op == "!",
        _ => false,
    };
    boolean.then(|| TypeBinding::primitive("boolean"))
}

fn with_dimensions(type_ref: TypeRef, dimensions: usize) -> TypeRef {
    if dimensions == 0 {
        return type_ref;
    }
    TypeRef {
        span: type_ref.span,
        node: type_ref.node.with_dimensions(dimensions),
        binding: type_ref
            .binding
            .map(|b| TypeBinding::array(b, dimensions)),
    }
}

fn is_type_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration"
    )
}

/// `a`, `a.b` or `a.b.c` built from identifiers only.
fn is_name_chain(node: TsNode<'_>) -> bool {
    match node.kind() {
        "identifier" => true,
        "field_access" => {
            node.child_by_field_name("field")
                .is_some_and(|f| f.kind() == "identifier")
                && node.child_by_field_name("object").is_some_and(is_name_chain)
                && !children(node).iter().any(|c| c.kind() == "super")
        }
        _ => false,
    }
}

/// Members of a class, interface, enum or annotation body in source order.
fn body_members(body: TsNode<'_>) -> Vec<TsNode<'_>> {
    named_children(body)
        .into_iter()
        .flat_map(|member| {
            if member.kind() == "enum_body_declarations" {
                named_children(member)
            } else {
                vec![member]
            }
        })
        .collect()
}

fn own_field_names(body: TsNode<'_>, source: &[u8]) -> Vec<String> {
    body_members(body)
        .into_iter()
        .filter(|m| matches!(m.kind(), "field_declaration" | "constant_declaration"))
        .flat_map(declarators)
        .map(|d| field_text(d, "name", source))
        .collect()
}

fn declarators(node: TsNode<'_>) -> Vec<TsNode<'_>> {
    let mut cursor = node.walk();
    node.children_by_field_name("declarator", &mut cursor)
        .collect()
}

fn type_parameter_names(node: TsNode<'_>, source: &[u8]) -> Vec<String> {
    let Some(parameters) = node.child_by_field_name("type_parameters") else {
        return Vec::new();
    };
    named_children(parameters)
        .into_iter()
        .filter(|p| p.kind() == "type_parameter")
        .filter_map(|p| {
            named_children(p)
                .into_iter()
                .find(|c| matches!(c.kind(), "type_identifier" | "identifier"))
        })
        .map(|n| text(n, source).to_string())
        .collect()
}

/// First child that is a type, skipping keywords and annotations.
fn type_child(node: TsNode<'_>) -> Option<TsNode<'_>> {
    named_children(node)
        .into_iter()
        .find(|c| TYPE_KINDS.contains(&c.kind()))
}

fn modifiers(node: TsNode<'_>) -> Modifiers {
    let Some(list) = children(node).into_iter().find(|c| c.kind() == "modifiers") else {
        return Modifiers::empty();
    };
    Modifiers::from_keywords(children(list).iter().map(|c| c.kind()))
}

fn dimension_count(node: Option<TsNode<'_>>) -> usize {
    node.map(|n| children(n).iter().filter(|c| c.kind() == "[").count())
        .unwrap_or(0)
}

/// Dotted rendering of a name node without whitespace, annotations or type arguments.
fn dotted_name(node: TsNode<'_>, source: &[u8]) -> String {
    match node.kind() {
        "identifier" | "type_identifier" => text(node, source).to_string(),
        "scoped_identifier" | "scoped_type_identifier" | "field_access" => named_children(node)
            .into_iter()
            .filter(|c| {
                matches!(
                    c.kind(),
                    "identifier"
                        | "type_identifier"
                        | "scoped_identifier"
                        | "scoped_type_identifier"
                        | "generic_type"
                        | "field_access"
                )
            })
            .map(|c| dotted_name(c, source))
            .collect::<Vec<_>>()
            .join("."),
        "generic_type" => first_named(node)
            .map(|c| dotted_name(c, source))
            .unwrap_or_default(),
        _ => text(node, source).split_whitespace().collect(),
    }
}

fn first_error(node: TsNode<'_>) -> Option<TsNode<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    children(node)
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error)
}

fn first_named(node: TsNode<'_>) -> Option<TsNode<'_>> {
    named_children(node)
        .into_iter()
        .find(|c| !matches!(c.kind(), "line_comment" | "block_comment"))
}

fn named_children(node: TsNode<'_>) -> Vec<TsNode<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn children(node: TsNode<'_>) -> Vec<TsNode<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn field_text(node: TsNode<'_>, field: &str, source: &[u8]) -> String {
    node.child_by_field_name(field)
        .map(|n| text(n, source).to_string())
        .unwrap_or_default()
}

fn text<'s>(node: TsNode<'_>, source: &'s [u8]) -> &'s str {
    node.utf8_text(source).unwrap_or("")
}
