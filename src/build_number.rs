//! Syntax checking for host build numbers.
//!
//! A compatibility range refers to host builds such as `131`, `IU-131.69`
//! or `145.*`. Only well-formedness matters here; ordering between build
//! numbers is out of scope.

/// Check whether a string is a syntactically valid build number.
///
/// Accepted shape: an optional product code prefix (uppercase ASCII
/// letters followed by `-`), then one or more dot-separated components.
/// The leading component must be numeric; every later component must be
/// numeric except the last, which may also be `*` or `SNAPSHOT`.
pub fn is_valid_build_number(s: &str) -> bool {
    let s = s.trim();
    let body = match s.split_once('-') {
        Some((code, rest)) => {
            if code.is_empty() || !code.chars().all(|c| c.is_ascii_uppercase()) {
                return false;
            }
            rest
        }
        None => s,
    };
    if body.is_empty() {
        return false;
    }

    let components: Vec<&str> = body.split('.').collect();
    for (idx, component) in components.iter().enumerate() {
        let last = idx == components.len() - 1;
        if last && idx > 0 && (*component == "*" || *component == "SNAPSHOT") {
            continue;
        }
        if component.is_empty() || component.parse::<u32>().is_err() {
            return false;
        }
    }
    true
}
