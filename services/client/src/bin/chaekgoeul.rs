//! services/client/src/bin/chaekgoeul.rs

use chaekgoeul_core::{
    domain::{Book, Difficulty, QuizAnswer, QuizType},
    ports::SystemClock,
    token::TokenStatus,
};
use clap::{Parser, Subcommand, ValueEnum};
use client_lib::{
    adapters::{MemoryStore, SqliteStore},
    app::{AppState, Navigation},
    config::Config,
    error::ClientError,
    oauth_callback::CallbackListener,
};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chaekgoeul")]
#[command(about = "책고을 client - books, illustrated summaries and quizzes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with a username and password
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Wait for the OAuth provider to redirect back with tokens
    Oauth,
    /// Log out (local session is cleared even if the server call fails)
    Logout,
    /// Delete the account and clear the local session
    DeleteAccount,
    /// Show the current user
    Me,
    /// Show the local session status
    Status,
    /// Open a route, applying the login redirect rules
    Open { path: String },
    /// List popular books
    Popular,
    /// List recently added books
    Recent,
    /// Show the banner book
    Banner,
    /// Search books by title or author
    Search { query: String },
    /// Show recent search queries
    RecentSearches {
        /// Remove one query from the list
        #[arg(long, conflicts_with = "clear")]
        forget: Option<String>,
        /// Remove every query
        #[arg(long)]
        clear: bool,
    },
    /// Toggle the like on a book
    Like { book_id: i64 },
    /// List liked books
    Likes,
    /// Generate (or fetch) the illustrated summary of a book
    Summary { book_id: i64 },
    /// Quizzes
    #[command(subcommand)]
    Quiz(QuizCommands),
    /// Book applications
    #[command(subcommand)]
    Applications(ApplicationCommands),
}

#[derive(Subcommand)]
enum QuizCommands {
    /// Generate a quiz for a book
    Generate {
        book_id: i64,
        #[arg(long, value_enum, default_value = "multiple-choice")]
        r#type: QuizTypeArg,
        #[arg(long, value_enum, default_value = "medium")]
        difficulty: DifficultyArg,
    },
    /// Submit answers as QUIZ_ID=ANSWER pairs
    Submit {
        #[arg(required = true)]
        answers: Vec<String>,
    },
}

#[derive(Subcommand)]
enum ApplicationCommands {
    /// List all applications
    List,
    /// Approve an application
    Approve { id: i64 },
    /// Reject an application with a reason
    Reject {
        id: i64,
        #[arg(long)]
        reason: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum QuizTypeArg {
    MultipleChoice,
    Ox,
    ShortAnswer,
}

impl From<QuizTypeArg> for QuizType {
    fn from(arg: QuizTypeArg) -> Self {
        match arg {
            QuizTypeArg::MultipleChoice => QuizType::MultipleChoice,
            QuizTypeArg::Ox => QuizType::Ox,
            QuizTypeArg::ShortAnswer => QuizType::ShortAnswer,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DifficultyArg {
    Easy,
    Medium,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(arg: DifficultyArg) -> Self {
        match arg {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Medium => Difficulty::Medium,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded.");

    // --- 2. Open Durable Storage ---
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await?;
    let durable = Arc::new(SqliteStore::new(pool));
    durable.run_migrations().await?;

    // --- 3. Build the Client State ---
    let state = AppState::build(
        config.clone(),
        durable,
        Arc::new(MemoryStore::new()),
        Arc::new(SystemClock),
    )?;
    let watch = state.start().await?;

    // --- 4. Run the Command (Ctrl-C cancels long operations) ---
    let lifetime = state.lifetime();
    let interrupt = lifetime.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let outcome = run(&state, cli.command, &lifetime).await;

    state.shutdown();
    let _ = watch.await;
    outcome
}

async fn run(
    state: &AppState,
    command: Commands,
    lifetime: &tokio_util::sync::CancellationToken,
) -> Result<(), ClientError> {
    match command {
        Commands::Login { username, password } => {
            let target = state.auth.login(&username, &password).await?;
            println!("로그인되었습니다. → {}", target);
        }
        Commands::Register { username, password } => {
            state.auth.register(&username, &password).await?;
            println!("회원가입이 완료되었습니다.");
        }
        Commands::Oauth => {
            let listener = CallbackListener::bind(state.config.oauth_callback_address).await?;
            println!("OAuth redirect URL: {}", listener.callback_url()?);
            let tokens = listener.wait_for_tokens(lifetime).await?;
            let target = state
                .auth
                .complete_oauth(&tokens.access_token, tokens.refresh_token.as_deref())
                .await?;
            println!("로그인되었습니다. → {}", target);
        }
        Commands::Logout => {
            if let Err(e) = state.auth.logout().await {
                eprintln!("서버 로그아웃 실패 ({}), 로컬 세션은 삭제되었습니다.", e);
            } else {
                println!("로그아웃되었습니다.");
            }
        }
        Commands::DeleteAccount => {
            state.auth.delete_account().await?;
            println!("계정이 삭제되었습니다.");
        }
        Commands::Me => {
            let me = state.auth.me().await?;
            println!("{} ({})", me.nickname.as_deref().unwrap_or(&me.username), me.username);
        }
        Commands::Status => {
            let status = state.guard.check().await?;
            let label = match status {
                TokenStatus::Valid => "valid",
                TokenStatus::Expired => "expired",
                TokenStatus::Missing => "missing",
                TokenStatus::Invalid => "invalid",
            };
            println!("session: {} (authenticated: {})", label, status.is_authenticated());
        }
        Commands::Open { path } => match state.navigator.navigate(&path).await? {
            Navigation::Allowed { path } => println!("→ {}", path),
            Navigation::Redirected { to, notice } => println!("{} → {}", notice.message(), to),
        },
        Commands::Popular => print_books(&state.catalog.popular().await?),
        Commands::Recent => print_books(&state.catalog.recent().await?),
        Commands::Banner => print_books(&[state.catalog.banner().await?]),
        Commands::Search { query } => print_books(&state.catalog.search(&query).await?),
        Commands::RecentSearches { forget, clear } => {
            if clear {
                state.catalog.clear_recent_searches().await?;
            } else if let Some(query) = forget {
                state.catalog.forget_search(&query).await?;
            }
            for query in state.catalog.recent_searches().await? {
                println!("{}", query);
            }
        }
        Commands::Like { book_id } => {
            let liked = state.likes.toggle(book_id).await?;
            println!("{} {}", book_id, if liked { "♥" } else { "♡" });
        }
        Commands::Likes => {
            let liked = state.likes.liked_books().await?;
            print_books(&liked.books);
            for id in liked.ids.iter().filter(|id| !liked.books.iter().any(|b| b.id == **id)) {
                println!("#{}", id);
            }
        }
        Commands::Summary { book_id } => {
            let scenes = state.summaries.summary(book_id, lifetime).await?;
            for scene in scenes {
                println!("[{}] {}", scene.page, scene.content);
                if let Some(image) = scene.image_url {
                    println!("    {}", image);
                }
            }
        }
        Commands::Quiz(QuizCommands::Generate {
            book_id,
            r#type,
            difficulty,
        }) => {
            let questions = state
                .quiz
                .generate(book_id, r#type.into(), difficulty.into())
                .await?;
            for q in questions {
                println!("#{} {}", q.quiz_id, q.question);
                for (i, option) in q.options.iter().enumerate() {
                    println!("    {}. {}", i + 1, option);
                }
            }
        }
        Commands::Quiz(QuizCommands::Submit { answers }) => {
            let answers = answers
                .iter()
                .map(|pair| parse_answer(pair))
                .collect::<Result<Vec<_>, _>>()?;
            let result = state.quiz.submit(&answers).await?;
            match result.total {
                Some(total) => println!("점수: {}/{}", result.score, total),
                None => println!("점수: {}", result.score),
            }
            for grade in result.results {
                println!("#{} {}", grade.quiz_id, if grade.correct { "O" } else { "X" });
            }
        }
        Commands::Applications(ApplicationCommands::List) => {
            for app in state.applications.list().await? {
                println!("#{} {} [{:?}]", app.id, app.title, app.status);
            }
        }
        Commands::Applications(ApplicationCommands::Approve { id }) => {
            let app = state.applications.approve(id).await?;
            println!("#{} {:?}", app.id, app.status);
        }
        Commands::Applications(ApplicationCommands::Reject { id, reason }) => {
            let app = state.applications.reject(id, &reason).await?;
            println!("#{} {:?}", app.id, app.status);
        }
    }
    Ok(())
}

fn parse_answer(pair: &str) -> Result<QuizAnswer, ClientError> {
    let (id, answer) = pair
        .split_once('=')
        .ok_or_else(|| ClientError::Internal(format!("expected QUIZ_ID=ANSWER, got '{}'", pair)))?;
    let quiz_id = id
        .trim()
        .parse::<i64>()
        .map_err(|e| ClientError::Internal(format!("invalid quiz id '{}': {}", id, e)))?;
    Ok(QuizAnswer {
        quiz_id,
        answer: answer.trim().to_string(),
    })
}

fn print_books(books: &[Book]) {
    if books.is_empty() {
        println!("(없음)");
    }
    for book in books {
        match &book.author {
            Some(author) => println!("#{} {} - {}", book.id, book.title, author),
            None => println!("#{} {}", book.id, book.title),
        }
    }
}
