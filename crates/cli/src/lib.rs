//! # Contact CLI
//!
//! Orchestration for the contact manager: the [`ContactApp`] event loop that
//! sits between the backend and the view model, the add/edit [`ContactForm`],
//! configuration, and the `contacts` command line built on top of them.

pub mod app;
pub mod config;
pub mod form;

pub use app::{event_queue, ContactApp, UiEvent};
pub use config::ContactsConfig;
pub use form::{ContactForm, FormMethod};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use contact_api::{ContactBackend, HttpBackend, MemoryBackend};
use contact_presentation::{MemoryTree, Renderer, TemplateSet, NO_CONTACTS_TEMPLATE};
use contact_protocol::ContactId;
use serde_json::json;
use std::io;
use std::path::PathBuf;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "contacts")]
#[command(about = "Manage contacts stored behind a JSON API", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Config file (default: ./contacts.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config and CONTACTS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Use an empty in-process backend instead of HTTP
    #[arg(long, global = true)]
    in_memory: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show contacts passing the given filters
    List(ListArgs),

    /// Show the tag vocabulary
    Tags(JsonArgs),

    /// Create a contact
    Add(AddArgs),

    /// Change fields or tags of a contact
    Edit(EditArgs),

    /// Delete a contact
    Delete(DeleteArgs),
}

#[derive(Args)]
struct JsonArgs {
    /// Output JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ListArgs {
    /// Only contacts carrying this tag (repeatable, all must match)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Case-insensitive prefix of the full name
    #[arg(long)]
    search: Option<String>,

    #[command(flatten)]
    output: JsonArgs,
}

#[derive(Args)]
struct AddArgs {
    #[arg(long)]
    name: String,

    #[arg(long, default_value = "")]
    email: String,

    #[arg(long, default_value = "")]
    phone: String,

    #[arg(long = "tag")]
    tags: Vec<String>,

    #[command(flatten)]
    output: JsonArgs,
}

#[derive(Args)]
struct EditArgs {
    id: ContactId,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    phone: Option<String>,

    /// Tag to add (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Tag to remove (repeatable)
    #[arg(long = "untag")]
    untags: Vec<String>,

    #[command(flatten)]
    output: JsonArgs,
}

#[derive(Args)]
struct DeleteArgs {
    id: ContactId,

    /// Confirm the deletion
    #[arg(long)]
    yes: bool,
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Commands::List(args) => args.output.json,
            Commands::Tags(args) => args.json,
            Commands::Add(args) => args.output.json,
            Commands::Edit(args) => args.output.json,
            Commands::Delete(_) => false,
        }
    }
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers.
    if cli.command.json() {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let mut config = ContactsConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url.take() {
        config.api_url = url;
    }
    config.validate().context("Invalid configuration")?;
    let templates = config.load_templates()?;

    if cli.in_memory {
        run_command(MemoryBackend::new(), cli.command, templates, &config).await
    } else {
        let backend = HttpBackend::new(&config.api_url, config.timeout())
            .context("Failed to build HTTP client")?
            .with_contacts_path(&config.contacts_path);
        run_command(backend, cli.command, templates, &config).await
    }
}

async fn run_command<B: ContactBackend>(
    backend: B,
    command: Commands,
    templates: TemplateSet,
    config: &ContactsConfig,
) -> Result<()> {
    let mut app = ContactApp::new(backend, MemoryTree::new(), templates, &config.contacts_path);
    app.load().await?;

    match command {
        Commands::List(args) => run_list(&mut app, args).await,
        Commands::Tags(args) => run_tags(&app, args),
        Commands::Add(args) => run_add(&mut app, args).await,
        Commands::Edit(args) => run_edit(&mut app, args).await,
        Commands::Delete(args) => run_delete(&mut app, args).await,
    }
}

type App<B> = ContactApp<B, MemoryTree>;

async fn run_list<B: ContactBackend>(app: &mut App<B>, args: ListArgs) -> Result<()> {
    for name in args.tags {
        app.dispatch(UiEvent::ToggleTag {
            name,
            checked: true,
        })
        .await?;
    }
    if let Some(search) = args.search {
        app.dispatch(UiEvent::Search(search)).await?;
    }

    if args.output.json {
        return print_stdout(&serde_json::to_string_pretty(&app.visible_contacts())?);
    }
    if app.view().registry().is_empty() {
        let empty = app.view().renderer().render(NO_CONTACTS_TEMPLATE, &json!({}))?;
        return print_stdout(&empty);
    }
    for markup in app.rendered_visible() {
        print_stdout(markup)?;
    }
    Ok(())
}

fn run_tags<B: ContactBackend>(app: &App<B>, args: JsonArgs) -> Result<()> {
    let names: Vec<&str> = app
        .view()
        .registry()
        .tags()
        .map(|tag| tag.name.as_str())
        .collect();
    if args.json {
        return print_stdout(&serde_json::to_string_pretty(&names)?);
    }
    for name in names {
        print_stdout(name)?;
    }
    Ok(())
}

async fn run_add<B: ContactBackend>(app: &mut App<B>, args: AddArgs) -> Result<()> {
    app.dispatch(UiEvent::ShowContactForm).await?;
    let inputs = [
        ("full_name", args.name),
        ("email", args.email),
        ("phone_number", args.phone),
    ];
    for (field, value) in inputs {
        app.dispatch(UiEvent::FormInput {
            field: field.to_string(),
            value,
        })
        .await?;
    }
    for name in args.tags {
        app.dispatch(UiEvent::NewTag(name.clone())).await?;
        app.dispatch(UiEvent::FormTag {
            name,
            checked: true,
        })
        .await?;
    }
    app.dispatch(UiEvent::SubmitForm).await?;
    print_saved(app, args.output.json)
}

async fn run_edit<B: ContactBackend>(app: &mut App<B>, args: EditArgs) -> Result<()> {
    app.dispatch(UiEvent::EditContact(args.id)).await?;
    let inputs = [
        ("full_name", args.name),
        ("email", args.email),
        ("phone_number", args.phone),
    ];
    for (field, value) in inputs {
        if let Some(value) = value {
            app.dispatch(UiEvent::FormInput {
                field: field.to_string(),
                value,
            })
            .await?;
        }
    }
    for name in args.tags {
        app.dispatch(UiEvent::NewTag(name.clone())).await?;
        app.dispatch(UiEvent::FormTag {
            name,
            checked: true,
        })
        .await?;
    }
    for name in args.untags {
        app.dispatch(UiEvent::FormTag {
            name,
            checked: false,
        })
        .await?;
    }
    app.dispatch(UiEvent::SubmitForm).await?;
    print_saved(app, args.output.json)
}

async fn run_delete<B: ContactBackend>(app: &mut App<B>, args: DeleteArgs) -> Result<()> {
    if !args.yes {
        return print_stdout(&format!(
            "Contact {} not deleted (pass --yes to confirm)",
            args.id
        ));
    }
    app.dispatch(UiEvent::DeleteContact {
        id: args.id,
        confirmed: true,
    })
    .await?;
    print_stdout(&format!("Deleted contact {}", args.id))
}

fn print_saved<B: ContactBackend>(app: &App<B>, json: bool) -> Result<()> {
    let id = app
        .last_saved()
        .context("Backend accepted the form but returned no contact")?;
    let record = app.view().contact(id)?;
    if json {
        return print_stdout(&serde_json::to_string_pretty(record)?);
    }
    print_stdout(&format!("Saved contact {} ({})", record.id, record.full_name))
}
