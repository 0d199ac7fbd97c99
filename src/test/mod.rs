mod command_parse;
mod router;

use crate::router::{Router, RouterConfig};

fn router(n: usize, incremental: bool) -> Router {
    Router::new(RouterConfig {
        size: n,
        incremental,
        ..RouterConfig::default()
    })
}

fn apply_all(router: &mut Router, lines: &[&str]) {
    for (idx, line) in lines.iter().enumerate() {
        if let Err(e) = router.apply_line(idx + 1, line) {
            panic!("line {line:?} failed: {e}");
        }
    }
}
