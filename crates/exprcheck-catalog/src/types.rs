//! Type tokens and the compatibility rule

/// Types that are mutually compatible for arithmetic and argument matching.
pub const NUMERIC_TYPES: &[&str] = &["number", "int", "byte", "short", "long", "double", "decimal", "float"];

/// Parameter types that accept integer literals.
pub const INTEGER_TYPES: &[&str] = &["int", "byte", "short", "long"];

/// Parameter types that accept fractional literals.
pub const FLOAT_TYPES: &[&str] = &["float", "double", "decimal", "number"];

/// Valid `CAST(... AS <type>)` targets. Matched case-sensitively.
pub const CAST_TARGET_TYPES: &[&str] = &["int", "bigint", "date", "timestamp", "double", "decimal", "float", "string"];

/// Return type marking a function whose result type is opaque.
pub const FIELD_TYPE: &str = "field";

/// Parameter type that disables argument checking.
pub const ANY_TYPE: &str = "any";

fn contains_ignore_case(set: &[&str], ty: &str) -> bool {
    set.iter().any(|t| t.eq_ignore_ascii_case(ty))
}

pub fn is_numeric_type(ty: &str) -> bool {
    contains_ignore_case(NUMERIC_TYPES, ty)
}

pub fn is_integer_type(ty: &str) -> bool {
    contains_ignore_case(INTEGER_TYPES, ty)
}

pub fn is_float_type(ty: &str) -> bool {
    contains_ignore_case(FLOAT_TYPES, ty)
}

pub fn is_valid_cast_target(ty: &str) -> bool {
    CAST_TARGET_TYPES.contains(&ty)
}

/// Identical (case-sensitive) or both numeric.
pub fn is_type_compatible(a: &str, b: &str) -> bool {
    a == b || (is_numeric_type(a) && is_numeric_type(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_types_case_insensitive() {
        assert!(is_numeric_type("int"));
        assert!(is_numeric_type("DECIMAL"));
        assert!(is_numeric_type("Number"));
        assert!(!is_numeric_type("bigint"));
        assert!(!is_numeric_type("string"));
    }

    #[test]
    fn test_type_compatibility() {
        assert!(is_type_compatible("int", "decimal"));
        assert!(!is_type_compatible("int", "string"));
        assert!(is_type_compatible("string", "string"));
        assert!(!is_type_compatible("String", "string"));
        assert!(!is_type_compatible("date", "timestamp"));
    }

    #[test]
    fn test_cast_targets() {
        assert!(is_valid_cast_target("bigint"));
        assert!(!is_valid_cast_target("INT"));
        assert!(!is_valid_cast_target("foo"));
    }
}
