//! Canonical unique names for types and methods.
//!
//! Names come from compiler bindings when they are usable and from the
//! syntactic type node otherwise. Conversion never fails: when nothing can be
//! named, [`UNDEFINED`] is returned and callers use it as an ordinary key.

use factgraph_parser_api::{MethodBinding, TypeBinding, TypeBindingKind, TypeNode};
use log::debug;

/// Name shared by every array type outside method signatures.
pub const ARRAY_MARKER: &str = "<Array>";

/// Name of a type that could not be determined at all.
pub const UNDEFINED: &str = "<undef>";

/// Prefix of simple type names whose qualification is unknown.
pub const UNDEFINED_PREFIX: &str = "<undef>.";

/// Separator between an enclosing type and an anonymous class ordinal.
pub const ANONYMOUS_SEPARATOR: char = '$';

/// Suffix marking a name fabricated because the binding was unusable.
pub const ERROR_SIGN: char = '!';

/// Erasure of an unbounded type variable.
pub const OBJECT: &str = "java.lang.Object";

/// Method name used for constructors.
pub const CONSTRUCTOR_MARKER: &str = "<init>";

/// Synthetic method hosting instance field initializers and initializer blocks.
pub const OBJECT_INITIALIZER: &str = "<oinit>";

/// Synthetic method hosting static field initializers and static blocks.
pub const CLASS_INITIALIZER: &str = "<clinit>";

/// Package owning types declared in the unnamed package.
pub const DEFAULT_PACKAGE: &str = "<default>";

/// Package owning primitive types and the array marker.
pub const PRIMITIVE_PACKAGE: &str = "<primitive>";

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

/// Whether a keyword names a primitive type.
pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// Whether a converted type name carries no usable qualification.
pub fn is_undefined(name: &str) -> bool {
    name == UNDEFINED || name.starts_with(UNDEFINED_PREFIX)
}

/// Drop a trailing generic parameter list (`a.Vector<E>` becomes `a.Vector`).
pub fn strip_generics(name: &str) -> &str {
    match name.find('<') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}

/// Package part of a qualified type name; nested `$` segments stay with the type.
pub fn package_of(type_name: &str) -> &str {
    if is_primitive(type_name) || type_name == ARRAY_MARKER {
        return PRIMITIVE_PACKAGE;
    }
    if type_name == UNDEFINED {
        return UNDEFINED;
    }
    let plain = strip_generics(type_name);
    match plain.rfind('.') {
        Some(pos) => &plain[..pos],
        None => DEFAULT_PACKAGE,
    }
}

/// Name of a type from its binding alone.
///
/// Returns `None` when the binding carries no usable name, which is the case
/// for anonymous classes the compiler could not name.
pub fn convert_binding(binding: &TypeBinding) -> Option<String> {
    match binding.kind {
        TypeBindingKind::Array => Some(ARRAY_MARKER.to_string()),
        TypeBindingKind::Primitive | TypeBindingKind::Null => {
            (!binding.binary_name.is_empty()).then(|| binding.binary_name.clone())
        }
        // Type variables are named by their erasure
        TypeBindingKind::TypeVariable => Some(
            binding
                .bound
                .as_deref()
                .and_then(convert_binding)
                .unwrap_or_else(|| OBJECT.to_string()),
        ),
        TypeBindingKind::Class | TypeBindingKind::Interface | TypeBindingKind::Enum => {
            let unusable = binding.binary_name.is_empty()
                || (binding.is_anonymous && !is_anonymous_name(&binding.binary_name));
            if unusable {
                return None;
            }
            if binding.type_parameters.is_empty() {
                Some(binding.binary_name.clone())
            } else {
                Some(format!(
                    "{}<{}>",
                    binding.binary_name,
                    binding.type_parameters.join(",")
                ))
            }
        }
    }
}

/// Whether a compiler-provided binary name looks like `Outer$1`.
fn is_anonymous_name(name: &str) -> bool {
    name.rsplit_once(ANONYMOUS_SEPARATOR)
        .map(|(outer, ordinal)| {
            !outer.is_empty() && !ordinal.is_empty() && ordinal.chars().all(|c| c.is_ascii_digit())
        })
        .unwrap_or(false)
}

/// Name of a type from syntax alone.
pub fn convert_type_node(node: &TypeNode) -> String {
    match node {
        TypeNode::Primitive(name) => name.clone(),
        TypeNode::Array { .. } => ARRAY_MARKER.to_string(),
        TypeNode::Simple(name) => format!("{UNDEFINED_PREFIX}{name}"),
        TypeNode::Qualified(name) => name.clone(),
        TypeNode::Parameterized { base, arguments } => {
            let base = convert_type_node(base);
            let placeholders = vec!["?"; arguments.len()].join(",");
            format!("{base}<{placeholders}>")
        }
        TypeNode::Wildcard => UNDEFINED.to_string(),
    }
}

/// Canonical name of a type: binding first, syntax as fallback.
pub fn convert(binding: Option<&TypeBinding>, node: Option<&TypeNode>) -> String {
    if let Some(name) = binding.and_then(convert_binding) {
        return name;
    }
    match node {
        Some(node) => convert_type_node(node),
        None => {
            debug!("No binding or syntax to name a type, using {UNDEFINED}");
            UNDEFINED.to_string()
        }
    }
}

/// Name of a type as it appears in a method signature.
///
/// Unlike [`convert`], arrays keep their element type and one `[]` per
/// dimension, so that `int[]` and `int[][]` stay distinct.
pub fn convert_for_signature(binding: Option<&TypeBinding>, node: Option<&TypeNode>) -> String {
    if let Some(binding) = binding {
        if binding.is_array() {
            let element = binding
                .element
                .as_deref()
                .and_then(convert_binding)
                .unwrap_or_else(|| match node {
                    Some(TypeNode::Array { element, .. }) => convert_type_node(element),
                    _ => UNDEFINED.to_string(),
                });
            return format!("{element}{}", "[]".repeat(binding.dimensions));
        }
        if let Some(name) = convert_binding(binding) {
            return name;
        }
    }
    match node {
        Some(TypeNode::Array {
            element,
            dimensions,
        }) => format!("{}{}", convert_type_node(element), "[]".repeat(*dimensions)),
        Some(node) => convert_type_node(node),
        None => {
            debug!("No binding or syntax to name a signature type, using {UNDEFINED}");
            UNDEFINED.to_string()
        }
    }
}

/// Fabricated name of an anonymous class without a usable binding.
pub fn anonymous_name(enclosing_type: &str, ordinal: usize) -> String {
    format!(
        "{}{ANONYMOUS_SEPARATOR}{ordinal}{ERROR_SIGN}",
        strip_generics(enclosing_type)
    )
}

/// Unique name of a method or constructor.
pub fn method_name(
    declaring_class: &str,
    simple_name: &str,
    is_constructor: bool,
    parameter_types: &[String],
) -> String {
    let name = if is_constructor {
        CONSTRUCTOR_MARKER
    } else {
        simple_name
    };
    format!("{declaring_class}.{name}({})", parameter_types.join(","))
}

/// Prefix shared by every constructor of a class.
pub fn constructor_prefix(class_name: &str) -> String {
    format!("{class_name}.{CONSTRUCTOR_MARKER}(")
}

/// Unique name of a synthetic initializer method (`<oinit>` or `<clinit>`).
pub fn initializer_name(class_name: &str, marker: &str) -> String {
    format!("{class_name}.{marker}()")
}

/// Signature-form parameter types of a method binding.
pub fn binding_parameter_types(binding: &MethodBinding) -> Vec<String> {
    binding
        .parameter_types
        .iter()
        .map(|p| convert_for_signature(Some(p), None))
        .collect()
}

/// Declaring class and unique name of a bound method.
///
/// Returns `None` when the declaring class has no usable name.
pub fn convert_method_binding(binding: &MethodBinding) -> Option<(String, String)> {
    let class = convert_binding(&binding.declaring_class)?;
    let name = method_name(
        &class,
        &binding.name,
        binding.is_constructor,
        &binding_parameter_types(binding),
    );
    Some((class, name))
}

/// Unique name of a field.
pub fn attribute_name(class_name: &str, field: &str) -> String {
    format!("{class_name}.{field}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_array(dims: usize) -> TypeBinding {
        TypeBinding::array(TypeBinding::primitive("int"), dims)
    }

    #[test]
    fn test_array_signatures_are_distinct() {
        let one = convert_for_signature(Some(&int_array(1)), None);
        let two = convert_for_signature(Some(&int_array(2)), None);
        let marker = convert(Some(&int_array(1)), None);

        assert_eq!(one, "int[]");
        assert_eq!(two, "int[][]");
        assert_ne!(one, two);
        assert_eq!(marker, ARRAY_MARKER);
        assert_eq!(convert(Some(&int_array(2)), None), ARRAY_MARKER);
        assert_ne!(one, marker);
        assert_ne!(two, marker);
    }

    #[test]
    fn test_signature_arrays_from_syntax() {
        let node = TypeNode::Simple("Foo".into()).with_dimensions(2);
        assert_eq!(convert_for_signature(None, Some(&node)), "<undef>.Foo[][]");
        assert_eq!(convert(None, Some(&node)), ARRAY_MARKER);
    }

    #[test]
    fn test_generic_binding_lists_parameters() {
        let vector = TypeBinding::class("java.util.Vector").with_type_parameters(vec!["E".into()]);
        assert_eq!(convert(Some(&vector), None), "java.util.Vector<E>");

        let map = TypeBinding::interface("java.util.Map")
            .with_type_parameters(vec!["K".into(), "V".into()]);
        assert_eq!(convert(Some(&map), None), "java.util.Map<K,V>");
    }

    #[test]
    fn test_type_variables_erase_to_bound() {
        let unbounded = TypeBinding::type_variable("T");
        assert_eq!(convert(Some(&unbounded), None), OBJECT);

        let bounded = TypeBinding::type_variable("N")
            .with_bound(Some(TypeBinding::class("java.lang.Number")));
        assert_eq!(convert(Some(&bounded), None), "java.lang.Number");

        // `U extends N` erases through `N`
        let chained = TypeBinding::type_variable("U").with_bound(Some(bounded));
        assert_eq!(convert(Some(&chained), None), "java.lang.Number");

        let array = TypeBinding::array(TypeBinding::type_variable("T"), 1);
        assert_eq!(convert_for_signature(Some(&array), None), "java.lang.Object[]");
    }

    #[test]
    fn test_syntactic_fallback() {
        assert_eq!(
            convert(None, Some(&TypeNode::Primitive("long".into()))),
            "long"
        );
        assert_eq!(
            convert(None, Some(&TypeNode::Simple("Widget".into()))),
            "<undef>.Widget"
        );
        assert_eq!(
            convert(None, Some(&TypeNode::Qualified("java.io.File".into()))),
            "java.io.File"
        );
        let generic = TypeNode::Parameterized {
            base: Box::new(TypeNode::Simple("Map".into())),
            arguments: vec![TypeNode::Simple("K".into()), TypeNode::Wildcard],
        };
        assert_eq!(convert(None, Some(&generic)), "<undef>.Map<?,?>");
        assert_eq!(convert(None, None), UNDEFINED);
    }

    #[test]
    fn test_undefined_detection() {
        assert!(is_undefined(UNDEFINED));
        assert!(is_undefined("<undef>.Foo"));
        assert!(!is_undefined("a.Foo"));
        assert!(!is_undefined("int"));
    }

    #[test]
    fn test_anonymous_binding_without_name() {
        let anon = TypeBinding::anonymous("");
        assert_eq!(convert_binding(&anon), None);

        let named = TypeBinding::anonymous("a.Outer$1");
        assert_eq!(convert_binding(&named).as_deref(), Some("a.Outer$1"));

        assert_eq!(anonymous_name("a.Outer<T>", 3), "a.Outer$3!");
    }

    #[test]
    fn test_method_names() {
        let binding = MethodBinding::method(
            TypeBinding::class("a.Sum"),
            "add",
            vec![
                TypeBinding::primitive("int"),
                TypeBinding::array(TypeBinding::class("java.lang.String"), 1),
            ],
            TypeBinding::primitive("void"),
        );
        let (class, name) = convert_method_binding(&binding).unwrap();
        assert_eq!(class, "a.Sum");
        assert_eq!(name, "a.Sum.add(int,java.lang.String[])");

        let ctor = MethodBinding::constructor(TypeBinding::class("a.Sum"), vec![]);
        assert_eq!(convert_method_binding(&ctor).unwrap().1, "a.Sum.<init>()");
        assert!(convert_method_binding(&ctor)
            .unwrap()
            .1
            .starts_with(&constructor_prefix("a.Sum")));
    }

    #[test]
    fn test_package_of() {
        assert_eq!(package_of("a.b.Outer$Inner"), "a.b");
        assert_eq!(package_of("java.util.Vector<E>"), "java.util");
        assert_eq!(package_of("Main"), DEFAULT_PACKAGE);
        assert_eq!(package_of("int"), PRIMITIVE_PACKAGE);
        assert_eq!(package_of(ARRAY_MARKER), PRIMITIVE_PACKAGE);
        assert_eq!(package_of("<undef>.Foo"), "<undef>");
    }
}
