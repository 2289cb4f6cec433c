//! edith – terminal client.
//!
//! Signs in against the identity service, keeps chats in the local document
//! store and talks to edith-server for replies. The signed-in session is kept
//! in the local cache between runs.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use edith_types::ChatId;

#[derive(Debug, Parser)]
#[command(name = "edith", version, about = "Chat with EDITH from the terminal")]
pub struct Cli {
    /// Origin of edith-server.
    #[arg(long, env = "EDITH_SERVER_URL", global = true)]
    pub server_url: Option<String>,

    /// sqlx SQLite URL of the chat store.
    #[arg(long, env = "EDITH_DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account.
    SignUp {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        /// Prompted for when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in with email and password.
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in with a Google ID token.
    GoogleSignIn {
        #[arg(long)]
        id_token: String,
    },
    SignOut,
    /// Email a password-reset link.
    ForgotPassword { email: String },
    /// Check a password-reset code.
    VerifyReset { code: String },
    /// Set a new password with a reset code.
    ResetPassword {
        code: String,
        #[arg(long)]
        new_password: Option<String>,
    },
    /// Show the signed-in user's profile.
    Profile,
    /// Manage saved chats.
    Chats {
        #[command(subcommand)]
        command: ChatsCommand,
    },
    /// Send one message and print the reply.
    Ask {
        /// Continue this chat instead of starting a new one.
        #[arg(long)]
        chat: Option<ChatId>,
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Interactive chat. `/new` starts a new chat, `/quit` exits.
    Chat {
        #[arg(long)]
        chat: Option<ChatId>,
    },
    /// Report a problem.
    Report {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        description: String,
    },
    /// Delete the account and every chat. Requires fresh credentials.
    DeleteAccount {
        #[arg(long, conflicts_with = "google_id_token")]
        password: Option<String>,
        #[arg(long)]
        google_id_token: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ChatsCommand {
    List,
    Show { id: ChatId },
    Rename { id: ChatId, title: String },
    Delete { id: ChatId },
    /// Write chats to `edith_chats_<date>.json`.
    Export {
        /// Chat ids to export.
        ids: Vec<ChatId>,
        /// Export every chat.
        #[arg(long, conflicts_with = "ids")]
        all: bool,
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    commands::run(cli).await
}
