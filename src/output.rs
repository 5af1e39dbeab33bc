use std::sync::OnceLock;

static QUIET: OnceLock<bool> = OnceLock::new();

/// `TOKENLINT_QUIET=1` suppresses banners, progress and summaries
pub fn is_quiet() -> bool {
    *QUIET.get_or_init(|| {
        std::env::var("TOKENLINT_QUIET")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    })
}
