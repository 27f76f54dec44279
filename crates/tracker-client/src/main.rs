use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use tracker_client::{ClientError, Session, TrackerClient, render};
use tracker_core::FileStorage;
use tracker_core::filter::active_filter_count;
use tracker_types::api::{FilterState, SortDirection, TimelineDraft, TimelinePatch};

/// Browse, claim and update immigration timelines.
#[derive(Debug, Parser)]
#[command(name = "tracker-cli", version)]
struct Cli {
    /// Tracker server URL
    #[arg(long, env = "TRACKER_URL", default_value = "http://127.0.0.1:3000")]
    url: String,

    /// File holding this device's identity
    #[arg(long, env = "TRACKER_STORAGE_PATH")]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show one page of the timeline table
    List(ListArgs),

    /// List the streams and visa offices available as filters
    Facets,

    /// Show a timeline and its comments
    Show {
        id: i64,
    },

    /// Attach your email to an unclaimed timeline
    Claim {
        id: i64,
        email: String,
    },

    /// Submit a new timeline
    Submit {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: Option<String>,
        /// Field values, e.g. `ita_date=2024-01-05` or `stream=CEC`
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        fields: Vec<String>,
    },

    /// Update a timeline you own. An empty value clears the field.
    Update {
        id: i64,
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        fields: Vec<String>,
    },

    /// Comment on a timeline
    Comment {
        id: i64,
        text: String,
        /// Reply to this top-level comment
        #[arg(long)]
        reply_to: Option<i64>,
        /// Post as this email instead of the saved one
        #[arg(long)]
        email: Option<String>,
    },

    /// List comments you have posted
    MyComments {
        #[arg(long)]
        email: Option<String>,
    },

    /// Show the identity saved on this device
    Whoami,

    /// Forget the identity saved on this device
    Reset,
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Matches username, stream, visa offices and application type
    #[arg(short, long, default_value = "")]
    search: String,
    #[arg(long, default_value = "")]
    stream: String,
    #[arg(long, default_value = "")]
    visa_office: String,
    #[arg(long = "type", default_value = "")]
    application_type: String,
    #[arg(long, default_value = "")]
    complexity: String,
    /// active, ecopr or pr-card
    #[arg(long, default_value = "")]
    status: String,
    /// Column to sort by
    #[arg(long, default_value = "ita_date")]
    sort: String,
    #[arg(long)]
    desc: bool,
    #[arg(short, long, default_value = "1")]
    page: usize,
}

const DEFAULT_LOG_FILTER: &str = "tracker_cli=info,tracker_client=info,tracker_core=warn";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let url = cli.url.clone();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(client_err) = e.downcast_ref::<ClientError>() {
                match client_err {
                    ClientError::Transport(_) => {
                        eprintln!("Could not reach {url}. Check that the server is running and try again.")
                    }
                    ClientError::Rejected { status, .. } if *status >= 500 => {
                        eprintln!("The server had a problem. Please try again.")
                    }
                    _ => {}
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn storage_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("timeline-tracker")
            .join("storage.json")
    })
}

async fn run(cli: Cli) -> Result<()> {
    let storage = FileStorage::new(storage_path(cli.storage));
    let session = Session::new(TrackerClient::new(&cli.url), storage);
    let now = Utc::now();

    match cli.command {
        Command::List(args) => {
            let view = list_view(&args);
            let count = active_filter_count(&view.filters);
            let page = session.view(&view).await?;
            println!("{}", render::page_table(&page, now));
            if count > 0 {
                println!("{count} filter(s) active");
            }
        }
        Command::Facets => {
            let facets = session.client().facets().await?;
            print!("{}", render::facets(&facets));
        }
        Command::Show { id } => {
            let record = session.client().get_timeline(id).await?;
            let unread = session.unread_comments(id).await?;
            print!("{}", render::timeline_detail(&record, session.can_edit(&record), now));

            let threads = session.open_comments(id).await?;
            println!("\nComments ({unread} new)");
            print!("{}", render::comment_threads(&threads, now));
        }
        Command::Claim { id, email } => {
            let resp = session.claim(id, &email).await?;
            println!("{}", resp.message);
        }
        Command::Submit {
            username,
            email,
            fields,
        } => {
            let mut object = parse_fields(&fields)?;
            object.insert("username".into(), Value::String(username));
            if let Some(email) = email {
                object.insert("email".into(), Value::String(email));
            }
            let draft: TimelineDraft = from_object(object)?;
            let resp = session.submit(&draft).await?;
            println!("{} (#{})", resp.message, resp.timeline.id);
        }
        Command::Update { id, fields } => {
            let patch: TimelinePatch = from_object(parse_fields(&fields)?)?;
            let resp = session.update(id, &patch).await?;
            println!("{}", resp.message);
        }
        Command::Comment {
            id,
            text,
            reply_to,
            email,
        } => {
            let comment = session
                .post_comment(id, email.as_deref(), &text, reply_to)
                .await?;
            println!("Posted comment #{} as {}", comment.id, comment.commenter_username);
        }
        Command::MyComments { email } => {
            let email = match email {
                Some(email) => email,
                None => session.identity().user_email().ok_or(ClientError::NoIdentity)?,
            };
            let history = session.client().user_comments(&email).await?;
            print!("{}", render::user_comments(&history, now));
        }
        Command::Whoami => match session.whoami() {
            Some(identity) => {
                println!("Email:    {}", identity.email.as_deref().unwrap_or("-"));
                println!("Username: {}", identity.username.as_deref().unwrap_or("-"));
                let ids: Vec<String> = identity
                    .claimed_timeline_ids
                    .iter()
                    .map(|id| format!("#{id}"))
                    .collect();
                println!("Claimed:  {}", if ids.is_empty() { "-".into() } else { ids.join(", ") });
            }
            None => println!("No identity saved on this device."),
        },
        Command::Reset => {
            session.identity().clear();
            println!("Identity cleared.");
        }
    }
    Ok(())
}

fn list_view(args: &ListArgs) -> tracker_core::ViewState {
    let mut view = tracker_core::ViewState::new();
    view.set_filters(FilterState {
        stream: args.stream.clone(),
        visa_office: args.visa_office.clone(),
        application_type: args.application_type.clone(),
        complexity: args.complexity.clone(),
        completion_status: args.status.clone(),
    });
    view.set_search(&args.search);
    view.sort.key = args.sort.clone();
    view.sort.direction = if args.desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };
    // clamped against the real row count when rendered
    view.set_page(args.page, usize::MAX);
    view
}

/// `FIELD=VALUE` pairs as a JSON object keyed by field name.
fn parse_fields(fields: &[String]) -> Result<Map<String, Value>> {
    let mut object = Map::new();
    for field in fields {
        let Some((name, value)) = field.split_once('=') else {
            bail!("Expected FIELD=VALUE, got '{field}'");
        };
        object.insert(name.trim().to_string(), Value::String(value.to_string()));
    }
    Ok(object)
}

fn from_object<T: DeserializeOwned>(object: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(object)).context("Invalid field value")
}
