use std::env;

/// Application-level constants
pub const APP_NAME: &str = "Carelog";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Placeholder value shipped in example env files; treated as absent.
const PLACEHOLDER_KEY: &str = "your_groq_api_key_here";

/// Resolve the primary (Groq) provider credential.
///
/// Checks `GROQ_API_KEY` first, then `CARELOG_GROQ_API_KEY` as a
/// runtime-injected override for local debugging. Empty and placeholder
/// values count as absent — absence is a routing decision (straight to the
/// local heuristic), not an error.
pub fn groq_api_key() -> Option<String> {
    resolve_key(&["GROQ_API_KEY", "CARELOG_GROQ_API_KEY"])
}

/// Credential for the alternate provider (not on the default chain).
pub fn openrouter_api_key() -> Option<String> {
    resolve_key(&["OPENROUTER_API_KEY"])
}

/// Credential for the secondary inference provider (not on the default chain).
pub fn hf_api_token() -> Option<String> {
    resolve_key(&["HF_API_TOKEN"])
}

fn resolve_key(vars: &[&str]) -> Option<String> {
    for var in vars {
        if let Ok(value) = env::var(var) {
            let trimmed = value.trim();
            if !trimmed.is_empty() && trimmed != PLACEHOLDER_KEY {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// Default log filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "carelog=info"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_carelog() {
        assert_eq!(APP_NAME, "Carelog");
    }

    #[test]
    fn placeholder_key_counts_as_absent() {
        env::set_var("CARELOG_TEST_KEY_A", PLACEHOLDER_KEY);
        assert_eq!(resolve_key(&["CARELOG_TEST_KEY_A"]), None);
        env::remove_var("CARELOG_TEST_KEY_A");
    }

    #[test]
    fn empty_key_counts_as_absent() {
        env::set_var("CARELOG_TEST_KEY_B", "   ");
        assert_eq!(resolve_key(&["CARELOG_TEST_KEY_B"]), None);
        env::remove_var("CARELOG_TEST_KEY_B");
    }

    #[test]
    fn later_variable_used_as_fallback() {
        env::remove_var("CARELOG_TEST_KEY_C");
        env::set_var("CARELOG_TEST_KEY_D", "gsk_live_example");
        assert_eq!(
            resolve_key(&["CARELOG_TEST_KEY_C", "CARELOG_TEST_KEY_D"]),
            Some("gsk_live_example".to_string())
        );
        env::remove_var("CARELOG_TEST_KEY_D");
    }
}
