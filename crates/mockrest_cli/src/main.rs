/* 📖 # Why is the CLI minimal and hardcoded?

The CLI exists to poke at a seed file by hand, so it keeps to positional arguments and a fixed
config location:

    mockrest <seed.json> [METHOD URL [BODY]]

- The seed file is a JSON object mapping collection names to arrays of records
- `mockrest.toml` in the current directory, if present, supplies the backend configuration
- With a request on the command line, that one request is answered
- Otherwise every stdin line of the form `METHOD URL [BODY]` is answered in order, against the
  same backend, so writes made by earlier lines are visible to later ones

Exit codes:
- 0: Success
- 1: Error (bad usage, seed or config could not be loaded)
*/

use std::env;
use std::io::{self, BufRead};
use std::path::Path;
use std::process;

use mockrest_base::tracing::init_tracing;
use mockrest_base::{HttpBody, HttpMethod, HttpRequest, HttpResponse};
use mockrest_engine::{BackendConfig, InMemoryBackend, JsonSeed, load_config};
use tracing::{info, warn};

const CONFIG_FILE: &str = "mockrest.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(seed_path) = args.first() else {
        eprintln!("Usage: mockrest <seed.json> [METHOD URL [BODY]]");
        process::exit(1);
    };

    let config = if Path::new(CONFIG_FILE).exists() {
        match load_config(Path::new(CONFIG_FILE)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: Failed to load config from {}: {}", CONFIG_FILE, e);
                process::exit(1);
            }
        }
    } else {
        BackendConfig::default()
    };

    let seed = match JsonSeed::load(Path::new(seed_path)) {
        Ok(seed) => seed,
        Err(e) => {
            eprintln!("Error: Failed to load seed from {}: {}", seed_path, e);
            process::exit(1);
        }
    };

    let backend = match InMemoryBackend::new(seed, config) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    info!(seed = %seed_path, "backend ready");

    if args.len() > 1 {
        match parse_request(&args[1..].join(" ")) {
            Some(request) => print_response(&backend.handle(request).await),
            None => {
                eprintln!("Usage: mockrest <seed.json> [METHOD URL [BODY]]");
                process::exit(1);
            }
        }
        process::exit(0);
    }

    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Error: Failed to read stdin: {}", e);
                process::exit(1);
            }
        };
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        match parse_request(&line) {
            Some(request) => print_response(&backend.handle(request).await),
            None => warn!(line = %line, "skipping line, expected METHOD URL [BODY]"),
        }
    }
}

/// Parse `METHOD URL [BODY]`; everything after the URL is the body.
fn parse_request(line: &str) -> Option<HttpRequest> {
    let mut parts = line.trim().splitn(3, char::is_whitespace);
    let method = HttpMethod::parse(parts.next()?)?;
    let url = parts.next().filter(|url| !url.is_empty())?;
    let request = HttpRequest::new(method, url);
    Some(match parts.next().map(str::trim) {
        Some(body) if !body.is_empty() => request.with_body(body),
        _ => request,
    })
}

fn print_response(response: &HttpResponse) {
    println!("{} {}", response.status(), response.status_text());
    for (name, value) in response.headers().iter() {
        println!("{}: {}", name, value);
    }
    match response.body() {
        HttpBody::Empty => {}
        HttpBody::Json(value) => match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", value),
        },
        body => println!("{}", body.as_string().unwrap_or_default()),
    }
    println!();
}
