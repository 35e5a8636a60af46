mod macros;

pub use macros::*;

/// Converts a `camelCase`, `PascalCase` or `snake_case` name to
/// `kebab-case`.
pub fn kebab_case(name: &str) -> String {
    let mut output = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for ch in name.chars() {
        match ch {
            '_' => output.push('-'),
            c if c.is_ascii_uppercase() => {
                if prev.map_or(false, |p| p.is_ascii_lowercase() || p.is_ascii_digit()) {
                    output.push('-');
                }

                output.push(c.to_ascii_lowercase());
            }
            c => output.push(c),
        }

        prev = Some(ch);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case() {
        assert_eq!(kebab_case("TwoColumnLayout"), "two-column-layout");
        assert_eq!(kebab_case("defaultExpanded"), "default-expanded");
        assert_eq!(kebab_case("repo_url"), "repo-url");
        assert_eq!(kebab_case("already-kebab"), "already-kebab");
        assert_eq!(kebab_case("H2O"), "h2-o");
        assert_eq!(kebab_case("HTML"), "html");
    }

    #[test]
    fn test_dict_macro() {
        let dict: crate::value::Dict = crate::dict!["b" => 2i64, "a" => "x"];
        let keys: Vec<_> = dict.keys().map(|k| &**k).collect();
        assert_eq!(keys, ["a", "b"]);
    }
}
