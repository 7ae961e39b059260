use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_appender::rolling::RollingFileAppender;

use inbox_triage::cli::{self, Command};
use inbox_triage::config::TriageConfig;
use inbox_triage::gateway::{Gateway, LlmGateway, StubGateway, is_sentinel};
use inbox_triage::llm::create_provider;
use inbox_triage::mail::JsonInboxSource;
use inbox_triage::state::{AppDeps, AppState, ChatScope, ProcessOutcome};
use inbox_triage::store::{EmailStore, PromptStore};
use inbox_triage::triage::TemplateKind;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let config = TriageConfig::from_env().context(
        "invalid configuration (set the backend's API key, or TRIAGE_LLM_BACKEND=stub to run offline)",
    )?;

    // Logs go to a daily file so the REPL stays readable
    let file_appender = log_appender(&config.log_dir())?;
    let (log_writer, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(log_writer)
        .with_ansi(false)
        .with_target(false)
        .init();

    eprintln!("📬 Inbox Triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Data: {}", config.data_dir().display());

    let gateway: Arc<dyn Gateway> = match &config.llm {
        Some(llm_config) => {
            let llm = create_provider(llm_config)?;
            eprintln!("   Model: {}", llm.model_name());
            Arc::new(LlmGateway::new(llm).with_timeout(config.call_timeout))
        }
        None => {
            eprintln!("   Model: none (stub responses)");
            Arc::new(StubGateway::new())
        }
    };

    let mut app = AppState::new(AppDeps {
        gateway,
        source: Arc::new(JsonInboxSource::new(config.mock_inbox_path())),
        emails: EmailStore::new(config.inbox_path()),
        prompts: PromptStore::new(config.prompts_path()),
        fetch_limit: config.fetch_limit,
        inbox_limits: config.inbox_limits,
    });

    let restored = app.restore().await;
    if restored > 0 {
        eprintln!("   Restored {} processed emails", restored);
    }
    eprintln!("   Type /help for commands. /quit to exit.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprint!("> ");
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            eprint!("> ");
            continue;
        }

        match cli::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => {
                if let Err(e) = run(&mut app, command).await {
                    tracing::warn!(error = %e, "Command failed");
                    eprintln!("❌ {}", e);
                }
            }
            Err(usage) => eprintln!("{}", usage),
        }
        eprint!("> ");
    }

    tracing::info!("Session ended");
    Ok(())
}

/// Daily rolling log file under `log_dir`, creating the directory first.
fn log_appender(log_dir: &Path) -> anyhow::Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;
    Ok(tracing_appender::rolling::daily(log_dir, "inbox-triage.log"))
}

async fn run(app: &mut AppState, command: Command) -> inbox_triage::error::Result<()> {
    match command {
        Command::Fetch => {
            let count = app.fetch().await?;
            println!("Fetched {} emails.", count);
        }
        Command::List => {
            if app.emails().is_empty() {
                println!("Inbox is empty. Use /fetch first.");
            }
            for email in app.emails() {
                let marker = if email.read { ' ' } else { '*' };
                println!(
                    "{}[{}] {} | {} | {} | {} action item(s)",
                    marker,
                    email.id,
                    email.sender,
                    email.subject,
                    email.category_label(),
                    email.action_items.len()
                );
            }
        }
        Command::Show { id } => {
            let email = app.open(&id).await?;
            println!("From:     {}", email.sender);
            println!("Subject:  {}", email.subject);
            println!("Date:     {}", email.timestamp);
            println!("Category: {}", email.category_label());
            if !email.action_items.is_empty() {
                println!("Action items:");
                for item in &email.action_items {
                    println!("  - {}", item);
                }
            }
            println!("\n{}", email.body);
        }
        Command::Process { id: None } => match app.process_inbox().await? {
            ProcessOutcome::EmptyInbox => println!("Inbox is empty. Use /fetch first."),
            ProcessOutcome::Processed(report) => println!(
                "Processed {} emails: {} categorized, {} left uncategorized, {} action items.",
                report.processed,
                report.categorized,
                report.rejected_categories,
                report.action_items
            ),
        },
        Command::Process { id: Some(id) } => {
            let categorized = app.process_email(&id).await?;
            let email = app.email(&id)?;
            if categorized {
                println!("[{}] {}", email.id, email.category_label());
            } else {
                println!("[{}] could not be categorized", email.id);
            }
            for item in &email.action_items {
                println!("  - {}", item);
            }
        }
        Command::Draft { id, instructions } => {
            let draft = app.draft_reply(&id, &instructions).await?;
            println!("Subject: {}\n\n{}", draft.subject, draft.body);
            if !is_sentinel(&draft.body) {
                println!("\n(/save-draft to keep it)");
            }
        }
        Command::SaveDraft => match app.save_draft() {
            Some(draft) => println!("Saved draft for [{}].", draft.email_id),
            None => println!("No draft to save."),
        },
        Command::Drafts => {
            if app.drafts().is_empty() {
                println!("No saved drafts.");
            }
            for draft in app.drafts() {
                println!(
                    "[{}] {} ({})",
                    draft.email_id,
                    draft.subject,
                    draft.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Ask { question } => {
            let answer = app.chat(ChatScope::Inbox, &question).await?;
            println!("\n{}\n", answer);
        }
        Command::Chat { id, question } => {
            let answer = app.chat(ChatScope::Email(id), &question).await?;
            println!("\n{}\n", answer);
        }
        Command::Prompts => {
            let templates = app.templates().await;
            for kind in TemplateKind::ALL {
                println!("── {} ──\n{}\n", kind.name(), templates.get(kind));
            }
        }
        Command::SetPrompt { kind, text } => {
            app.set_template(kind, &text).await?;
            println!("Updated {} template.", kind.name());
        }
        Command::Help => println!("{}", cli::HELP),
        Command::Quit => {}
    }
    Ok(())
}
