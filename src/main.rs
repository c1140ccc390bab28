use std::path::PathBuf;
use std::str::SplitWhitespace;

use authflow::config::{AppConfig, parse_token_binding};
use authflow::error::ConfigError;
use authflow::routing::{Route, resolve_route, should_redirect};
use authflow::services::auth::{Latency, LoginCredentials};
use authflow::services::registry::NewUser;
use authflow::session::SessionController;
use authflow::validation::form::FormState;
use authflow::validation::schemas::{
    FIELD_CONFIRM_PASSWORD, FIELD_EMAIL, FIELD_FULL_NAME, FIELD_PASSWORD, login_schema, signup_schema,
};
use authflow::validation::Schema;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("stdin read failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "authflow", about = "Signup/login/session shell over a mock auth authority")]
struct Cli {
    /// JSON file holding the persisted session; in-memory when absent.
    #[arg(long, env = "AUTH_STORE_PATH")]
    store_path: Option<PathBuf>,

    /// `unbound` or `bound`.
    #[arg(long, env = "AUTH_TOKEN_BINDING")]
    token_binding: Option<String>,

    /// Answer authority calls immediately.
    #[arg(long, env = "AUTH_NO_LATENCY")]
    no_latency: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Help,
    Signup { email: String, password: String, confirm: String, full_name: String },
    Login { email: String, password: String },
    WhoAmI,
    Open { path: String },
    Logout,
    Quit,
}

const HELP: &str = "\
commands:
  signup <email> <password> <confirm> <full name...>
  login <email> <password>
  whoami
  open <path>
  logout
  help
  quit";

fn next_arg(words: &mut SplitWhitespace<'_>) -> String {
    words.next().unwrap_or_default().to_owned()
}

fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("empty command".to_owned());
    };

    let command = match verb {
        "help" | "?" => ShellCommand::Help,
        "signup" => {
            let (email, password, confirm) = (next_arg(&mut words), next_arg(&mut words), next_arg(&mut words));
            let full_name = words.collect::<Vec<_>>().join(" ");
            ShellCommand::Signup { email, password, confirm, full_name }
        }
        "login" => {
            let (email, password) = (next_arg(&mut words), next_arg(&mut words));
            ShellCommand::Login { email, password }
        }
        "whoami" => ShellCommand::WhoAmI,
        "open" => ShellCommand::Open { path: words.next().unwrap_or("/").to_owned() },
        "logout" => ShellCommand::Logout,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command `{other}` (try `help`)")),
    };
    Ok(command)
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.store_path {
        config.store_path = Some(path);
    }
    if let Some(raw) = cli.token_binding.as_deref() {
        config.token_binding = parse_token_binding(Some(raw))?;
    }
    if cli.no_latency {
        config.latency = Latency::NONE;
    }

    let session = authflow::build_session(&config);
    let snapshot = session.restore_session().await;
    match snapshot.user {
        Some(user) => println!("restored session for {} <{}>", user.full_name, user.email),
        None => println!("not signed in (type `help`)"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(ShellCommand::Quit) => break,
            Ok(command) => run_command(&session, command).await,
            Err(message) => println!("{message}"),
        }
    }
    Ok(())
}

async fn run_command(session: &SessionController, command: ShellCommand) {
    match command {
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Signup { email, password, confirm, full_name } => {
            let schema = signup_schema();
            let mut form = FormState::for_schema(&schema);
            form.set_value(FIELD_FULL_NAME, full_name);
            form.set_value(FIELD_EMAIL, email);
            form.set_value(FIELD_PASSWORD, password);
            form.set_value(FIELD_CONFIRM_PASSWORD, confirm);
            if !submit(&mut form, &schema) {
                return;
            }
            let outcome = session
                .signup(NewUser {
                    full_name: form.value(FIELD_FULL_NAME).to_owned(),
                    email: form.value(FIELD_EMAIL).to_owned(),
                    password: form.value(FIELD_PASSWORD).to_owned(),
                })
                .await;
            println!("{}", outcome.message);
            if outcome.success {
                println!("now `login` with your new account");
            }
        }
        ShellCommand::Login { email, password } => {
            let schema = login_schema();
            let mut form = FormState::for_schema(&schema);
            form.set_value(FIELD_EMAIL, email);
            form.set_value(FIELD_PASSWORD, password);
            if !submit(&mut form, &schema) {
                return;
            }
            let outcome = session
                .login(LoginCredentials {
                    email: form.value(FIELD_EMAIL).to_owned(),
                    password: form.value(FIELD_PASSWORD).to_owned(),
                })
                .await;
            println!("{}", outcome.message);
        }
        ShellCommand::WhoAmI => {
            let snapshot = session.snapshot();
            match snapshot.user {
                Some(user) => println!("#{} {} <{}>", user.id, user.full_name, user.email),
                None => println!("anonymous"),
            }
            if let Some(error) = snapshot.error {
                println!("last error: {error}");
            }
        }
        ShellCommand::Open { path } => {
            let authenticated = session.is_authenticated();
            let route = resolve_route(&path, authenticated);
            if should_redirect(&path, authenticated) {
                println!("redirect {path} -> {}", route.path());
            }
            render(session, route);
        }
        ShellCommand::Logout => {
            session.logout();
            println!("signed out");
            render(session, Route::Login);
        }
        ShellCommand::Quit => {}
    }
}

/// Validate the form; print every failing field and return false if any.
fn submit(form: &mut FormState, schema: &Schema) -> bool {
    if form.validate(schema) {
        return true;
    }
    for field in schema.field_names() {
        if let Some(error) = form.visible_error(field) {
            println!("  {field}: {error}");
        }
    }
    false
}

fn render(session: &SessionController, route: Route) {
    match route {
        Route::Login => println!("[login] sign in, or `signup` to create an account"),
        Route::Signup => println!("[signup] create your account"),
        Route::Dashboard => match session.user() {
            Some(user) => println!("[dashboard] Welcome, {} (id {}, {})", user.full_name, user.id, user.email),
            None => println!("[dashboard] Welcome, User"),
        },
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
