// src/main.rs

use clap::{Parser, Subcommand};
use quiz_client::{
    ApiClient,
    config::Config,
    error::AppError,
    models::{
        answer::AnswerValue,
        user::{ConfirmEmailRequest, LoginRequest, RegisterRequest, ResendConfirmationRequest},
    },
    quiz::{LoadOutcome, Phase, QuizFlow, SessionSnapshot},
    state::AppState,
    utils::html::plain_text,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Take quizzes from the terminal.
#[derive(Parser, Debug)]
#[command(name = "quiz-client", about = "Terminal client for the quiz service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and store the token.
    Login {
        username: String,
        /// Read from stdin when omitted.
        #[arg(long)]
        password: Option<String>,
        /// Keep the token across restarts.
        #[arg(long)]
        remember: bool,
    },
    /// Forget the stored token.
    Logout,
    /// Create an account.
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Confirm an email address with the token from the confirmation mail.
    Confirm { token: String },
    /// Send the confirmation mail again.
    ResendConfirmation { email: String },
    /// Show the signed-in user.
    Whoami,
    /// Show the high-score table.
    Leaderboard,
    /// Take a quiz.
    Take { quiz_id: i64 },
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "quiz-client.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    let state = match AppState::init(config) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    };

    let mut input = BufReader::new(tokio::io::stdin()).lines();

    if let Err(e) = run(cli.command, &state, &mut input).await {
        tracing::debug!("Command failed: {}", e);
        eprintln!("{}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(command: Commands, state: &AppState, input: &mut Input) -> Result<(), AppError> {
    match command {
        Commands::Login {
            username,
            password,
            remember,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt(input, "Password: ").await?,
            };
            let session = state
                .api
                .login(&LoginRequest { username, password }, remember)
                .await?;
            println!("Login successful! Welcome, {}.", session.claims.username);
        }
        Commands::Logout => {
            state.api.logout()?;
            println!("Logged out.");
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt(input, "Password: ").await?,
            };
            state
                .api
                .register(&RegisterRequest {
                    username,
                    email: email.clone(),
                    password,
                })
                .await?;
            println!("Registration successful! Check {} for a confirmation link.", email);
        }
        Commands::Confirm { token } => {
            state.api.confirm_email(&ConfirmEmailRequest { token }).await?;
            println!("Email confirmed successfully!");
        }
        Commands::ResendConfirmation { email } => {
            let message = state
                .api
                .resend_confirmation(&ResendConfirmationRequest { email })
                .await?;
            if message.is_empty() {
                println!("Confirmation email sent.");
            } else {
                println!("{}", message);
            }
        }
        Commands::Whoami => match state.auth.current() {
            Some(session) => println!(
                "{} (id {}, roles: {})",
                session.claims.username,
                session.claims.id,
                session.claims.roles.join(", ")
            ),
            None => println!("Not logged in."),
        },
        Commands::Leaderboard => {
            let entries = state.api.leaderboard().await?;
            println!("{:<6}{:<24}{}", "Rank", "Username", "High Score");
            for (rank, entry) in entries.iter().enumerate() {
                println!("{:<6}{:<24}{}", rank + 1, entry.username, entry.high_score);
            }
        }
        Commands::Take { quiz_id } => {
            if !state.auth.is_authenticated() {
                return Err(AppError::AuthError("Please log in to access quizzes.".to_string()));
            }
            take_quiz(state.quiz_flow(), quiz_id, input).await?;
        }
    }
    Ok(())
}

async fn prompt(input: &mut Input, label: &str) -> Result<String, AppError> {
    eprint!("{}", label);
    Ok(input.next_line().await?.unwrap_or_default().trim().to_string())
}

async fn take_quiz(flow: QuizFlow<ApiClient>, quiz_id: i64, input: &mut Input) -> Result<(), AppError> {
    println!("Loading Quiz...");
    if let LoadOutcome::Failed(message) = flow.select_quiz(quiz_id).await? {
        return Err(AppError::NetworkError(message));
    }

    let mut expiry = flow.session().expiry();

    loop {
        let snapshot = flow.session().snapshot();
        if snapshot.phase != Phase::InProgress {
            break;
        }
        render(&snapshot);

        let line = match expiry.as_mut() {
            Some(rx) => tokio::select! {
                line = input.next_line() => line?,
                _ = rx.wait_for(|done| *done) => {
                    println!("\nTime is up!");
                    break;
                }
            },
            None => input.next_line().await?,
        };
        let Some(line) = line else { break };

        if let Err(e) = handle_line(&flow, line.trim()) {
            println!("{}", e.user_message());
        }
        if line.trim() == "s" {
            break;
        }
    }

    let result = flow.submit().await?;
    println!("\nQuiz Results");
    println!("Your Score: {} / {}", result.points_earned, result.score.total);
    println!("Correct: {}", result.score);
    println!("{}", result.feedback.headline);
    for item in &result.feedback.items {
        let mark = if item.correct { "✔" } else { "✘" };
        let yours = item.user_answer.as_deref().unwrap_or("(no answer)");
        match (&item.correct_answer, item.correct) {
            (Some(correct), false) => println!(
                "{} Q{}: {} | Your Answer: {} | Correct Answer: {}",
                mark,
                item.question_id,
                plain_text(&item.prompt),
                yours,
                correct
            ),
            _ => println!(
                "{} Q{}: {} | Your Answer: {}",
                mark,
                item.question_id,
                plain_text(&item.prompt),
                yours
            ),
        }
    }
    Ok(())
}

/// `1,3` answers with options 1 and 3, `n`/`p` navigate, `g <k>` jumps,
/// `s` submits.
fn handle_line(flow: &QuizFlow<ApiClient>, line: &str) -> Result<(), AppError> {
    let mut session = flow.session();
    match line {
        "" => Ok(()),
        "n" => session.next().map(|_| ()),
        "p" => session.previous().map(|_| ()),
        "s" => session.finalize().map(|_| ()),
        _ if line.starts_with("g ") => {
            let k: usize = line[2..]
                .trim()
                .parse()
                .map_err(|_| AppError::ValidationError("Usage: g <question number>".to_string()))?;
            session.go_to(k.saturating_sub(1))
        }
        _ => {
            let snapshot = session.snapshot();
            let question = snapshot
                .current_question
                .ok_or_else(|| AppError::StateViolation("no current question".to_string()))?;
            let picked = line
                .split(',')
                .map(|part| {
                    part.trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| i.checked_sub(1))
                        .and_then(|i| question.options.get(i).cloned())
                        .ok_or_else(|| AppError::ValidationError(format!("'{}' is not an option number", part.trim())))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let selected = if question.is_multi_select() {
                AnswerValue::multiple(picked)
            } else if let [only] = picked.as_slice() {
                AnswerValue::single(only.clone())
            } else {
                return Err(AppError::ValidationError("Pick exactly one option".to_string()));
            };

            let answer = session.answer_current(selected)?;
            println!("{}", if answer.is_correct { "Correct!" } else { "Recorded." });
            session.next().map(|_| ())
        }
    }
}

fn render(snapshot: &SessionSnapshot) {
    let Some(question) = &snapshot.current_question else {
        return;
    };
    println!();
    println!("Question {} of {}", snapshot.position + 1, snapshot.total);
    if !question.subject.is_empty() {
        println!("Subject: {}", question.subject);
    }
    if let Some(remaining) = snapshot.remaining_seconds {
        println!("Time Left: {}:{:02}", remaining / 60, remaining % 60);
    }
    println!("{}", plain_text(&question.prompt));
    let chosen = snapshot
        .current_answer
        .as_ref()
        .map(|a| a.selected.values().into_iter().map(str::to_string).collect::<Vec<_>>())
        .unwrap_or_default();
    for (i, option) in question.options.iter().enumerate() {
        let mark = if chosen.contains(option) { "x" } else { " " };
        println!("  [{}] {}. {}", mark, i + 1, plain_text(option));
    }
    let hint = if question.is_multi_select() {
        "Select all that apply (e.g. 1,3)"
    } else {
        "Select one option"
    };
    println!("{}; n = next, p = previous, g <k> = go to, s = submit", hint);
}
