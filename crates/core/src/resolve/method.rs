//! HTTP method names as written in request expressions.

const METHOD_ALIASES: &[(&str, &str)] = &[
    ("get", "GET"),
    ("post", "POST"),
    ("patch", "PATCH"),
    ("put", "PUT"),
    ("delete", "DELETE"),
    ("methodGet", "GET"),
    ("methodPost", "POST"),
    ("methodPatch", "PATCH"),
    ("methodPut", "PUT"),
    ("methodDelete", "DELETE"),
    ("methodHead", "HEAD"),
    ("methodOptions", "OPTIONS"),
];

/// Map a method token to its canonical upper-case name. Tokens missing from
/// the alias table are upper-cased verbatim.
pub fn resolve_method(token: &str) -> String {
    METHOD_ALIASES
        .iter()
        .find(|(alias, _)| *alias == token)
        .map_or_else(|| token.to_uppercase(), |(_, canonical)| (*canonical).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonic_and_constant_agree() {
        assert_eq!(resolve_method("patch"), "PATCH");
        assert_eq!(resolve_method("methodPatch"), "PATCH");
        assert_eq!(resolve_method("methodOptions"), "OPTIONS");
    }

    #[test]
    fn unknown_token_is_upper_cased() {
        assert_eq!(resolve_method("trace"), "TRACE");
        assert_eq!(resolve_method("methodTrace"), "METHODTRACE");
    }
}
