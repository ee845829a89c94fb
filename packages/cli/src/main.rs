//! `sns`, the command-line client for the SNS posting API.
//!
//! One subcommand per API operation, plus `format-date`:
//!
//! - **`signup`**, **`login`**, **`logout`** manage the account session.
//! - **`view`**, **`timeline`**, **`like`** read posts (anonymous).
//! - **`post`**, **`edit`**, **`delete`** write posts (needs `login`).
//!
//! The session cookie is kept in a small file between invocations so that
//! `sns login` followed by `sns post` works as expected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::Value;
use sns_api::{CreatedPost, ErrorResponse, LikeResponse, MessageResponse, Post, PostId};
use sns_client::{
    format_date, format_date_in, ClientConfig, Session, SnsClient, DEFAULT_API_SERVER,
};

/// sns: SNS posting API client
#[derive(Parser)]
#[command(name = "sns", version, about, long_about = None)]
struct Cli {
    /// Server origin, e.g. `https://sns.example.com`.
    #[arg(long, env = "SNS_API_SERVER", default_value = DEFAULT_API_SERVER, global = true)]
    server: String,

    /// File holding the session cookie between invocations.
    #[arg(long, env = "SNS_SESSION_FILE", default_value = ".sns-session", global = true)]
    session_file: PathBuf,

    /// Print the raw JSON response instead of a text rendering.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account.
    Signup {
        username: String,
        #[arg(short, long, env = "SNS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log in and store the session cookie.
    Login {
        username: String,
        #[arg(short, long, env = "SNS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the current session.
    Logout,

    /// Show a single post.
    View { id: PostId },

    /// Show the most recent posts, newest first.
    Timeline {
        #[arg(default_value_t = 10)]
        count: u32,
    },

    /// Like a post.
    Like { id: PostId },

    /// Publish a post, optionally as a reply to another one.
    Post {
        content: String,
        #[arg(short, long, value_name = "ID")]
        related: Option<PostId>,
    },

    /// Replace the content of one of your posts.
    Edit {
        id: PostId,
        content: String,
        #[arg(short, long, value_name = "ID")]
        related: Option<PostId>,
    },

    /// Delete one of your posts.
    Delete { id: PostId },

    /// Render Unix epoch seconds as `YYYY-MM-DD HH:MM:SS`.
    FormatDate {
        seconds: i64,
        /// Use UTC instead of the local time zone.
        #[arg(long)]
        utc: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sns=warn,sns_client=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Command::FormatDate { seconds, utc } = cli.command {
        let rendered = if utc {
            format_date_in(seconds, &Utc)
        } else {
            format_date(seconds)
        };
        match rendered {
            Some(s) => println!("{s}"),
            None => fatal(&format!("timestamp {seconds} is out of range")),
        }
        return;
    }

    let session = Session::new();
    let client = SnsClient::with_session(&ClientConfig::new(&cli.server), session)
        .unwrap_or_else(|e| fatal(&e.to_string()));
    if let Err(e) = load_session(&client, &cli.session_file) {
        fatal(&format!("failed to read {}: {}", cli.session_file.display(), e));
    }

    let (result, credentialed) = match cli.command {
        Command::Signup { username, password } => {
            (client.signup(&username, &password).await, false)
        }
        Command::Login { username, password } => {
            (client.login(&username, &password).await, true)
        }
        Command::Logout => (client.logout().await, true),
        Command::View { id } => (client.view_post(id).await, false),
        Command::Timeline { count } => (client.get_timeline(count).await, false),
        Command::Like { id } => (client.like_post(id).await, false),
        Command::Post { content, related } => {
            (client.create_post(&content, related).await, true)
        }
        Command::Edit {
            id,
            content,
            related,
        } => (client.edit_post(id, &content, related).await, true),
        Command::Delete { id } => (client.delete_post(id).await, true),
        Command::FormatDate { .. } => unreachable!("handled above"),
    };

    let body = result.unwrap_or_else(|e| fatal(&e.to_string()));
    if credentialed {
        if let Err(e) = save_session(&client, &cli.session_file) {
            fatal(&format!("failed to update {}: {}", cli.session_file.display(), e));
        }
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_else(|e| fatal(&e.to_string()))
        );
    }

    if let Some(err) = ErrorResponse::from_value(&body) {
        if !cli.json {
            eprintln!("error: {}", err.error);
        }
        process::exit(1);
    }

    if !cli.json {
        print!("{}", render(&body));
    }
}

/// Restore a previously saved session cookie, if any. A missing file is an
/// empty session.
fn load_session(client: &SnsClient, path: &Path) -> io::Result<()> {
    match fs::read_to_string(path) {
        Ok(saved) => {
            client.session().import(client.origin(), saved.trim());
            tracing::debug!("session: loaded from {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Persist the session cookie, or remove the file once the session is empty.
fn save_session(client: &SnsClient, path: &Path) -> io::Result<()> {
    match client.session().export(client.origin()) {
        Some(cookies) => fs::write(path, cookies),
        None => match fs::remove_file(path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        },
    }
}

/// Text rendering of a response body.
///
/// Tries the known response shapes in turn and falls back to pretty JSON.
fn render(body: &Value) -> String {
    if let Ok(posts) = serde_json::from_value::<Vec<Post>>(body.clone()) {
        if posts.is_empty() {
            return "no posts\n".into();
        }
        return posts.iter().map(render_post).collect::<Vec<_>>().join("\n");
    }
    if let Ok(post) = serde_json::from_value::<Post>(body.clone()) {
        return render_post(&post);
    }
    if let Ok(created) = serde_json::from_value::<CreatedPost>(body.clone()) {
        return format!("created {}\n", created.id);
    }
    if let Ok(like) = serde_json::from_value::<LikeResponse>(body.clone()) {
        return format!("likes: {}\n", like.liked);
    }
    if let Ok(msg) = serde_json::from_value::<MessageResponse>(body.clone()) {
        return format!("{}\n", msg.message);
    }
    if body.as_object().is_some_and(|o| o.is_empty()) {
        return "ok\n".into();
    }
    format!("{}\n", serde_json::to_string_pretty(body).unwrap_or_default())
}

/// ```text
/// 9f86d081884c  alice  2023-11-14 22:13:20  likes: 3
///   hello world
///   (reply to 1b4f0e9851971998)
/// ```
fn render_post(post: &Post) -> String {
    let id = post.id.to_string();
    let short_id: String = id.chars().take(12).collect();
    let when = format_date(post.time).unwrap_or_else(|| post.time.to_string());
    let mut out = format!(
        "{short_id}  {}  {when}  likes: {}\n  {}\n",
        post.account, post.liked, post.content
    );
    if let Some(related) = &post.related {
        let related = related.to_string();
        let short: String = related.chars().take(12).collect();
        out.push_str(&format!("  (reply to {short})\n"));
    }
    out
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("sns: {}", msg);
    process::exit(2);
}
