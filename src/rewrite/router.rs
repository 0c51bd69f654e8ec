//! Router history-base rewriting.
//!
//! Single-page apps built for `/` break once served from `/<member>/<project>/`.
//! The router base is pointed at the page's own location instead:
//!
//! ```text
//! history: createWebHistory('/'), routes: [...]
//!                           ───
//!          createWebHistory(window.location.pathname), routes: [...]
//! ```

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// Literal every candidate script must contain
const HISTORY_KEY: &str = "history";

/// `history: <callee>(<base>), routes:` where the callee may be a member chain
/// such as `VueRouter.createWebHistory`. The key must not be the tail of a
/// longer identifier; the preceding byte stays in group 1.
static HISTORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"((?:^|[^\w$])history\s*:\s*",
        r"[A-Za-z_$][\w$]*(?:\s*\.\s*[A-Za-z_$][\w$]*)*\s*\(\s*)",
        r#"(?:'/'|"/"|import\.meta\.env\.BASE_URL|process\.env\.BASE_URL)"#,
        r"(\s*\)\s*,\s*routes\s*:)",
    ))
    .unwrap()
});

/// Replacement base expression
const PAGE_BASE: &str = "window.location.pathname";

/// Rewrite router history bases in a script.
///
/// Returns `Cow::Borrowed` when nothing matched.
pub fn rewrite_router(content: &str) -> Cow<'_, str> {
    if !content.contains(HISTORY_KEY) {
        return Cow::Borrowed(content);
    }
    HISTORY_RE.replace_all(content, format!("${{1}}{PAGE_BASE}${{2}}"))
}
