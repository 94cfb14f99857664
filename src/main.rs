use std::io::{self, BufRead, Write};

use akademikd::api::HttpBackend;
use akademikd::ipc::{self, AppState, Request};

fn main() {
    // Keep the sidecar dependency-light. One JSON request per line on stdin,
    // one JSON response per line on stdout; errors never kill the loop.
    let mut state = match std::env::var("AKADEMIK_BASE_URL") {
        Ok(base_url) => {
            let token = std::env::var("AKADEMIK_TOKEN").ok();
            AppState::with_backend(Box::new(HttpBackend::new(base_url, token)))
        }
        // The UI shell can still connect later via backend.connect.
        Err(_) => AppState::new(),
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id; ignore.
                let _ = writeln!(
                    stdout,
                    "{{\"ok\":false,\"error\":{{\"code\":\"bad_json\",\"message\":\"{}\"}}}}",
                    e
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
