//! Route API spec CLI
//!
//! Assembles API documents from route manifests and validates sample
//! requests against them.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use route_apispec::{
    default_name_resolver, load_manifest, load_text, ApiSpec, ManifestParts, Request,
    ValidationMiddleware,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "route-apispec")]
#[command(about = "Assemble OpenAPI documents and validate requests from a route manifest")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the API document for a manifest
    Assemble {
        /// Route manifest (JSON)
        manifest: PathBuf,

        /// Override the manifest's OpenAPI version (2.0, 3.0.0 - 3.0.3)
        #[arg(long)]
        openapi_version: Option<String>,

        /// Override the path prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Override the document title
        #[arg(long)]
        title: Option<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Run request validation for the route matching a path and method
    Validate {
        /// Route manifest (JSON)
        manifest: PathBuf,

        /// Request path, e.g. /users/42
        #[arg(long)]
        path: String,

        /// Request method
        #[arg(long, short)]
        method: String,

        /// Query parameter as key=value (repeatable)
        #[arg(long = "query", value_parser = parse_pair)]
        query: Vec<(String, String)>,

        /// Header as key=value (repeatable)
        #[arg(long = "header", value_parser = parse_pair)]
        headers: Vec<(String, String)>,

        /// Path parameter as key=value, overriding values taken from --path
        #[arg(long = "match", value_parser = parse_pair)]
        match_info: Vec<(String, String)>,

        /// Cookie as key=value (repeatable)
        #[arg(long = "cookie", value_parser = parse_pair)]
        cookies: Vec<(String, String)>,

        /// Form field as key=value (repeatable)
        #[arg(long = "form", value_parser = parse_pair)]
        form: Vec<(String, String)>,

        /// File holding the raw request body
        #[arg(long)]
        body: Option<PathBuf>,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Assemble {
            manifest,
            openapi_version,
            prefix,
            title,
            pretty,
            output,
        } => run_assemble(AssembleArgs {
            manifest,
            openapi_version,
            prefix,
            title,
            pretty,
            output,
        }),

        Commands::Validate {
            manifest,
            path,
            method,
            query,
            headers,
            match_info,
            cookies,
            form,
            body,
            json,
        } => run_validate(ValidateArgs {
            manifest,
            path,
            method,
            query,
            headers,
            match_info,
            cookies,
            form,
            body,
            json_output: json,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {s:?}"))
}

fn load_parts(path: &Path) -> Result<ManifestParts, u8> {
    load_manifest(path)
        .and_then(|manifest| manifest.into_parts())
        .map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })
}

struct AssembleArgs {
    manifest: PathBuf,
    openapi_version: Option<String>,
    prefix: Option<String>,
    title: Option<String>,
    pretty: bool,
    output: Option<PathBuf>,
}

fn run_assemble(args: AssembleArgs) -> Result<(), u8> {
    let ManifestParts {
        mut config,
        handlers,
        routes,
    } = load_parts(&args.manifest)?;

    if let Some(version) = &args.openapi_version {
        config = config.openapi_version(version).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })?;
    }
    if let Some(prefix) = args.prefix {
        config.prefix = prefix;
    }
    if let Some(title) = args.title {
        config.title = title;
    }

    let mut spec = ApiSpec::new(config, default_name_resolver());
    let document = spec.register(&routes, &handlers).to_json();

    let json_output = if args.pretty {
        serde_json::to_string_pretty(&document)
    } else {
        serde_json::to_string(&document)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}

struct ValidateArgs {
    manifest: PathBuf,
    path: String,
    method: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    match_info: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    form: Vec<(String, String)>,
    body: Option<PathBuf>,
    json_output: bool,
}

fn run_validate(args: ValidateArgs) -> Result<(), u8> {
    let json_output = args.json_output;
    let ManifestParts {
        config,
        handlers,
        routes,
    } = load_parts(&args.manifest).map_err(|code| {
        if json_output {
            println!(r#"{{"valid":false,"error":"cannot load manifest"}}"#);
        }
        code
    })?;

    let matched = routes.iter().find_map(|route| {
        if !route.serves(&args.method) {
            return None;
        }
        route.match_path(&args.path).map(|captures| (route, captures))
    });
    let Some((route, captures)) = matched else {
        report_error(
            json_output,
            &format!("no route matches {} {}", args.method, args.path),
        );
        return Err(2);
    };

    let mut request = Request::new(args.method.to_uppercase());
    request.match_info = captures;
    request.match_info.extend(args.match_info);
    request.query = args.query;
    request.headers = args.headers;
    request.cookies.extend(args.cookies);
    request.form = args.form;
    if let Some(path) = &args.body {
        let body = load_text(path).map_err(|e| {
            report_error(json_output, &format!("loading body: {}", e));
            e.exit_code() as u8
        })?;
        request.body = Some(body);
    }

    let middleware = ValidationMiddleware::from_config(Arc::new(handlers), &config);
    match middleware.handle(&route.endpoint, &mut request) {
        Ok(()) => {
            let data = serde_json::Value::Object(request.slots().clone());
            if json_output {
                let output = serde_json::json!({ "valid": true, "data": data });
                println!("{}", output);
            } else {
                println!("Valid");
                println!("{}", data);
            }
            Ok(())
        }
        Err(rejection) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "status": rejection.status,
                    "errors": rejection.body
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed ({}):", rejection.status);
                eprintln!("  {}", rejection.body);
            }
            if rejection.status >= 500 {
                Err(2)
            } else {
                Err(1)
            }
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}
