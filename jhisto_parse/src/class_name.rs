//! Class descriptor normalization.
//!
//! `jcmd GC.class_histogram` prints classes by their JVM binary name, which
//! encodes arrays as descriptors (`[I`, `[[Ljava.lang.String;`) and may carry
//! a module suffix such as ` (java.base@17.0.2)`. Histograms are keyed by the
//! readable form instead: `int[]`, `String[][]`.

/// Start of the module qualifier that follows a class name.
const MODULE_DELIMITER: &str = " (";

/// The only namespace that gets abbreviated.
const ROOT_NAMESPACE: &str = "java.lang.";

fn primitive_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "J" => "long",
        "I" => "int",
        "B" => "byte",
        "C" => "char",
        "S" => "short",
        "F" => "float",
        "D" => "double",
        "Z" => "boolean",
        _ => return None,
    };
    Some(name)
}

/// Convert a raw class descriptor into its canonical display name.
///
/// ```
/// use jhisto_parse::class_name::normalize;
///
/// assert_eq!(normalize("[I"), "int[]");
/// assert_eq!(normalize("[[Lcom.example.Node;"), "com.example.Node[][]");
/// assert_eq!(normalize("java.lang.String (java.base@17.0.2)"), "String");
/// assert_eq!(normalize("java.lang.Thread$State"), "java.lang.Thread$State");
/// ```
pub fn normalize(raw: &str) -> String {
    let name = strip_module(raw);
    match decode_array(name) {
        Some(decoded) => reduce(&decoded).to_string(),
        None => reduce(name).to_string(),
    }
}

/// Drop a trailing ` (module@version)` qualifier.
fn strip_module(name: &str) -> &str {
    match name.find(MODULE_DELIMITER) {
        Some(idx) if idx > 0 && name.ends_with(')') => &name[..idx],
        _ => name,
    }
}

/// Decode `[`-prefixed array descriptors.
///
/// Returns `None` for anything that is not a primitive or `L...;` array, so
/// unknown element codes pass through untouched.
fn decode_array(name: &str) -> Option<String> {
    let element = name.trim_start_matches('[');
    let dimensions = name.len() - element.len();
    if dimensions == 0 {
        return None;
    }

    let element = match primitive_name(element) {
        Some(primitive) => primitive,
        None => element
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
            .filter(|inner| !inner.is_empty())?,
    };

    let mut decoded = String::with_capacity(element.len() + 2 * dimensions);
    decoded.push_str(element);
    for _ in 0..dimensions {
        decoded.push_str("[]");
    }
    Some(decoded)
}

/// Abbreviate `java.lang.X` to `X` when `X` is a top-level class.
fn reduce(name: &str) -> &str {
    match name.strip_prefix(ROOT_NAMESPACE) {
        Some(rest) if !rest.contains(['.', '$']) => rest,
        _ => name,
    }
}
