// This file is part of the product Plinth.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.
use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger};
use log::info;
use plinth::app::{AppBuilder, configure, spawn_session_sweeper, start_services};
use plinth::config::{Config, ValidatedConfig};
use plinth::{features, headers, logging};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

const HELP_TEXT: &str = "Usage: plinth [-C <root>] [-h]

  -C <root>   Runtime directory holding config.yaml, templates/ and features/
              (default: current directory)
  -h, --help  Show this help
";

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    if parsed_args.help {
        print!("{}", HELP_TEXT);
        return 0;
    }

    let config = match Config::load_and_validate(&parsed_args.runtime_root) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("❌ {}", error);
            eprintln!("❌ Application cannot start with invalid configuration.");
            return 1;
        }
    };

    if let Err(error) = logging::init_logging(&config.logging.level) {
        eprintln!("❌ Failed to initialize logger: {}", error);
        return 1;
    }

    match System::new().block_on(run_server(config)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("❌ Server failed to start: {}", error);
            1
        }
    }
}

async fn run_server(config: ValidatedConfig) -> std::io::Result<()> {
    let config = Arc::new(config);
    log_startup_info(&config);

    let (auth, db) = start_services(&config)
        .await
        .map_err(|error| std::io::Error::other(error.to_string()))?;

    let mut builder = AppBuilder::new(config.clone(), auth, db);
    for feature in features::all() {
        builder
            .register_feature(feature)
            .map_err(|error| std::io::Error::other(error.to_string()))?;
    }
    let application = builder
        .build()
        .map_err(|error| std::io::Error::other(error.to_string()))?;
    spawn_session_sweeper(application.auth_handle(), SESSION_SWEEP_INTERVAL);

    let dev_mode = config.dev_mode;
    let server = HttpServer::new(move || {
        let application = application.clone();
        App::new()
            .wrap(headers::security_headers(dev_mode))
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#,
            ))
            .configure(move |cfg| configure(&application, cfg))
    })
    .workers(config.server.workers)
    .bind(config.server.address_tuple())?;

    info!(
        "Listening on http://{}:{}",
        config.server.host, config.server.port
    );
    server.run().await
}

fn log_startup_info(config: &ValidatedConfig) {
    info!("Starting {}", config.app.name);
    info!("Runtime root: {}", config.root.display());
    info!(
        "Mode: {}",
        if config.dev_mode { "development" } else { "production" }
    );
    info!("Auth store: {}", config.auth_database_path().display());
    info!("Base layout: {}", config.base_layout_path().display());
}

#[derive(Debug)]
struct ParsedArgs {
    runtime_root: PathBuf,
    help: bool,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut runtime_root = PathBuf::from(".");
    let mut help = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--" => continue,
            "-h" | "--help" => help = true,
            "-C" => {
                let value = args
                    .next()
                    .ok_or_else(|| "Missing value for -C".to_string())?;
                runtime_root = PathBuf::from(value);
            }
            other => return Err(format!("Unexpected argument '{}'", other)),
        }
    }

    Ok(ParsedArgs {
        runtime_root: make_runtime_root_absolute(runtime_root)?,
        help,
    })
}

fn make_runtime_root_absolute(runtime_root: PathBuf) -> Result<PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}

#[cfg(test)]
mod tests {
    use super::parse_args_from;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parse_args_defaults_to_current_directory() {
        let parsed = parse_args_from(args(&[])).expect("parse");
        assert!(parsed.runtime_root.is_absolute());
        assert!(!parsed.help);
    }

    #[test]
    fn parse_args_accepts_runtime_root() {
        let parsed = parse_args_from(args(&["-C", "/srv/site"])).expect("parse");
        assert_eq!(parsed.runtime_root, std::path::PathBuf::from("/srv/site"));
    }

    #[test]
    fn parse_args_accepts_help_flag() {
        assert!(parse_args_from(args(&["--help"])).expect("parse").help);
        assert!(parse_args_from(args(&["-C", "/srv", "-h"])).expect("parse").help);
    }

    #[test]
    fn parse_args_rejects_missing_root_value() {
        assert!(parse_args_from(args(&["-C"])).is_err());
    }

    #[test]
    fn parse_args_rejects_unknown_arguments() {
        assert!(parse_args_from(args(&["serve"])).is_err());
    }
}
