use std::sync::Arc;

use anyhow::Context;
use edith_app_core::auth::GOOGLE_PROVIDER;
use edith_app_core::{
    AccountService, ChatController, ClientConfig, CoreError, FirebaseIdentity, HttpProxyClient,
    LocalCache, Reauth, SignInOutcome, SignUpForm, SqliteStore,
};
use edith_types::{ChatSession, truncate_title};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::{ChatsCommand, Cli, Command};

struct App {
    config: ClientConfig,
    store: Arc<SqliteStore>,
    cache: LocalCache,
    account: AccountService<SqliteStore>,
}

impl App {
    async fn open(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = ClientConfig::from_env();
        if let Some(url) = &cli.server_url {
            config.server_url = url.clone();
        }
        if let Some(url) = &cli.database_url {
            config.database_url = url.clone();
        }
        debug!(server_url = %config.server_url, database_url = %config.database_url, "client configuration");

        let store = Arc::new(
            SqliteStore::connect(&config.database_url)
                .await
                .with_context(|| format!("failed to open {}", config.database_url))?,
        );
        let identity = Arc::new(
            FirebaseIdentity::new(config.firebase_api_key.clone())
                .set_base_url(config.identity_base_url.clone()),
        );
        let cache = LocalCache::new(config.cache_path.clone());
        let account = AccountService::new(identity, store.clone(), cache.clone())
            .with_reset_continue_url(config.reset_continue_url.clone());
        account.restore().await;

        Ok(Self {
            config,
            store,
            cache,
            account,
        })
    }

    /// Controller for the signed-in user, with their chats loaded.
    async fn chats(&self) -> anyhow::Result<ChatController<SqliteStore>> {
        let user = self.account.current_user().ok_or(CoreError::NotSignedIn)?;
        let proxy = Arc::new(HttpProxyClient::new(
            &self.config.server_url,
            self.config.request_timeout,
        )?);
        let controller = ChatController::new(self.store.clone(), proxy, Some(user.uid))
            .with_cache(self.cache.clone());
        controller.load_chats().await;
        Ok(controller)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let app = App::open(&cli).await?;

    match cli.command {
        Command::SignUp {
            email,
            first_name,
            last_name,
            password,
        } => {
            let password = secret_or_prompt(password, "Password").await?;
            let outcome = app
                .account
                .sign_up(SignUpForm {
                    first_name,
                    last_name,
                    email,
                    password,
                })
                .await?;
            print_sign_in(&outcome);
        }
        Command::SignIn { email, password } => {
            let password = secret_or_prompt(password, "Password").await?;
            print_sign_in(&app.account.sign_in(&email, &password).await?);
        }
        Command::GoogleSignIn { id_token } => {
            print_sign_in(&app.account.sign_in_with_google(&id_token).await?);
        }
        Command::SignOut => {
            app.account.sign_out().await?;
            println!("Signed out.");
        }
        Command::ForgotPassword { email } => {
            println!("{}", app.account.request_password_reset(&email).await?);
        }
        Command::VerifyReset { code } => {
            let email = app.account.verify_reset_code(&code).await?;
            println!("Reset code is valid for {email}.");
        }
        Command::ResetPassword { code, new_password } => {
            let new_password = secret_or_prompt(new_password, "New password").await?;
            println!(
                "{}",
                app.account.confirm_password_reset(&code, &new_password).await?
            );
        }
        Command::Profile => match app.account.profile().await? {
            Some(profile) => println!("{}", serde_json::to_string_pretty(&profile)?),
            None => return Err(CoreError::NotSignedIn.into()),
        },
        Command::Chats { command } => chats(&app, command).await?,
        Command::Ask { chat, query } => {
            let controller = app.chats().await?;
            if let Some(id) = chat {
                controller.select(id).await?;
            }
            if let Some(outcome) = controller.submit(&query.join(" ")).await? {
                println!("{}", outcome.reply);
            }
        }
        Command::Chat { chat } => repl(&app, chat).await?,
        Command::Report {
            subject,
            description,
        } => {
            app.account.submit_report(&subject, &description).await?;
            println!("Thank you! Your report has been submitted.");
        }
        Command::DeleteAccount {
            password,
            google_id_token,
        } => {
            let user = app.account.current_user().ok_or(CoreError::NotSignedIn)?;
            let reauth = match google_id_token {
                Some(id_token) => Reauth::Google { id_token },
                None if user.provider_id == GOOGLE_PROVIDER => {
                    anyhow::bail!("Pass --google-id-token to confirm with your Google account.")
                }
                None => Reauth::Password(secret_or_prompt(password, "Password").await?),
            };
            app.account.delete_account(reauth).await?;
            println!("Your account has been deleted.");
        }
    }
    Ok(())
}

async fn chats(app: &App, command: ChatsCommand) -> anyhow::Result<()> {
    let controller = app.chats().await?;
    match command {
        ChatsCommand::List => {
            let chats = controller.chats().await;
            if chats.is_empty() {
                println!("No chats yet.");
            }
            for chat in chats {
                print_summary(&chat);
            }
        }
        ChatsCommand::Show { id } => {
            let chat = controller.select(id).await?;
            println!("# {}", chat.title);
            for turn in &chat.messages {
                println!("{}> {}", turn.role, turn.text());
            }
        }
        ChatsCommand::Rename { id, title } => {
            if controller.rename(id, &title).await? {
                println!("Renamed.");
            } else {
                println!("Title unchanged.");
            }
        }
        ChatsCommand::Delete { id } => {
            controller.delete(id).await?;
            println!("Deleted.");
        }
        ChatsCommand::Export { ids, all, dir } => {
            let chats = controller.chats().await;
            let ids = if all {
                chats.iter().map(|c| c.id).collect()
            } else {
                if ids.is_empty() {
                    eprintln!("Pick chats by id, or pass --all:");
                    for chat in &chats {
                        eprintln!("{:>15}  {}", chat.id, truncate_title(&chat.title, 25));
                    }
                }
                ids
            };
            let today = chrono::Local::now().date_naive();
            let path = controller.export(&ids, &dir, today).await?;
            println!("Exported to {}", path.display());
        }
    }
    Ok(())
}

async fn repl(app: &App, chat: Option<edith_types::ChatId>) -> anyhow::Result<()> {
    let controller = app.chats().await?;
    if let Some(id) = chat {
        let chat = controller.select(id).await?;
        println!("Continuing \"{}\".", chat.display_title());
    }
    let name = app.account.username().await.unwrap_or_else(|| "User".to_owned());
    println!("Hello, {name}. Type /new for a new chat, /quit to leave.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match line.trim() {
            "/quit" | "/exit" => break,
            "/new" => {
                controller.start_new_chat().await;
                println!("Started a new chat.");
            }
            query => match controller.submit(query).await {
                Ok(Some(outcome)) => println!("edith> {}", outcome.reply),
                Ok(None) => {}
                Err(e) => eprintln!("error: {e}"),
            },
        }
    }
    Ok(())
}

fn print_sign_in(outcome: &SignInOutcome) {
    println!("{} Welcome, {}.", outcome.message, outcome.username);
}

fn print_summary(chat: &ChatSession) {
    let created = chat
        .created_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    println!(
        "{:>15}  {:<20}  {:>16}  {} messages",
        chat.id,
        chat.display_title(),
        created,
        chat.messages.len()
    );
}

/// `value`, or a line read from stdin after printing `label`.
async fn secret_or_prompt(value: Option<String>, label: &str) -> anyhow::Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    let mut stderr = tokio::io::stderr();
    stderr.write_all(format!("{label}: ").as_bytes()).await?;
    stderr.flush().await?;
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
