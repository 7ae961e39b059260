//! REPL command parsing.

use crate::triage::TemplateKind;

pub const HELP: &str = "\
Commands:
  /fetch                      Fetch emails from the inbox source
  /list                       List emails with category and action items
  /show <id>                  Show one email
  /process [id]               Categorize and extract action items (all, or one email)
  /draft <id> [instructions]  Draft a reply
  /save-draft                 Keep the last draft
  /drafts                     List saved drafts
  /ask <question>             Ask about the whole inbox
  /chat <id> <question>       Ask about one email
  /prompts                    Show the prompt templates
  /prompt <name> <text>       Replace a template (categorization, action_extraction, auto_reply)
  /help                       Show this help
  /quit                       Exit
Plain text without a leading slash is treated as /ask.";

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fetch,
    List,
    Show { id: String },
    Process { id: Option<String> },
    Draft { id: String, instructions: String },
    SaveDraft,
    Drafts,
    Ask { question: String },
    Chat { id: String, question: String },
    Prompts,
    SetPrompt { kind: TemplateKind, text: String },
    Help,
    Quit,
}

/// Parse a REPL line. Returns a usage message on bad input.
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Err("Empty input. Type /help for commands.".to_string());
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Ask {
            question: line.to_string(),
        });
    };

    let (name, args) = split_word(rest);
    match name.to_lowercase().as_str() {
        "fetch" => Ok(Command::Fetch),
        "list" | "ls" => Ok(Command::List),
        "show" => required_word(args, "/show <id>").map(|id| Command::Show { id }),
        "process" => Ok(Command::Process {
            id: Some(args.to_string()).filter(|a| !a.is_empty()),
        }),
        "draft" => {
            let (id, instructions) = split_word(args);
            if id.is_empty() {
                return Err("Usage: /draft <id> [instructions]".to_string());
            }
            Ok(Command::Draft {
                id: id.to_string(),
                instructions: instructions.to_string(),
            })
        }
        "save-draft" | "save" => Ok(Command::SaveDraft),
        "drafts" => Ok(Command::Drafts),
        "ask" => {
            if args.is_empty() {
                return Err("Usage: /ask <question>".to_string());
            }
            Ok(Command::Ask {
                question: args.to_string(),
            })
        }
        "chat" => {
            let (id, question) = split_word(args);
            if id.is_empty() || question.is_empty() {
                return Err("Usage: /chat <id> <question>".to_string());
            }
            Ok(Command::Chat {
                id: id.to_string(),
                question: question.to_string(),
            })
        }
        "prompts" => Ok(Command::Prompts),
        "prompt" => {
            let (name, text) = split_word(args);
            let kind = TemplateKind::parse(name).ok_or_else(|| {
                format!(
                    "Unknown template '{name}'. Expected one of: {}",
                    TemplateKind::ALL.map(|k| k.name()).join(", ")
                )
            })?;
            if text.is_empty() {
                return Err("Usage: /prompt <name> <text>".to_string());
            }
            Ok(Command::SetPrompt {
                kind,
                text: text.to_string(),
            })
        }
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" | "q" => Ok(Command::Quit),
        other => Err(format!("Unknown command '/{other}'. Type /help for commands.")),
    }
}

/// Split off the first whitespace-delimited word.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim();
    match s.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (s, ""),
    }
}

fn required_word(args: &str, usage: &str) -> Result<String, String> {
    let (word, _) = split_word(args);
    if word.is_empty() {
        Err(format!("Usage: {usage}"))
    } else {
        Ok(word.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_commands() {
        assert_eq!(parse("/fetch"), Ok(Command::Fetch));
        assert_eq!(parse("  /LIST "), Ok(Command::List));
        assert_eq!(parse("/save-draft"), Ok(Command::SaveDraft));
        assert_eq!(parse("/drafts"), Ok(Command::Drafts));
        assert_eq!(parse("/prompts"), Ok(Command::Prompts));
        assert_eq!(parse("/help"), Ok(Command::Help));
        assert_eq!(parse("/quit"), Ok(Command::Quit));
        assert_eq!(parse("/exit"), Ok(Command::Quit));
    }

    #[test]
    fn process_with_and_without_id() {
        assert_eq!(parse("/process"), Ok(Command::Process { id: None }));
        assert_eq!(
            parse("/process  m1 "),
            Ok(Command::Process {
                id: Some("m1".into())
            })
        );
    }

    #[test]
    fn draft_keeps_instructions_verbatim() {
        assert_eq!(
            parse("/draft m2 Decline politely, offer next week"),
            Ok(Command::Draft {
                id: "m2".into(),
                instructions: "Decline politely, offer next week".into()
            })
        );
        assert_eq!(
            parse("/draft m2"),
            Ok(Command::Draft {
                id: "m2".into(),
                instructions: String::new()
            })
        );
        assert!(parse("/draft").is_err());
    }

    #[test]
    fn chat_needs_id_and_question() {
        assert_eq!(
            parse("/chat m1 When is it due?"),
            Ok(Command::Chat {
                id: "m1".into(),
                question: "When is it due?".into()
            })
        );
        assert!(parse("/chat m1").is_err());
        assert!(parse("/show").is_err());
    }

    #[test]
    fn plain_text_is_an_inbox_question() {
        assert_eq!(
            parse("anything urgent?"),
            Ok(Command::Ask {
                question: "anything urgent?".into()
            })
        );
        assert!(parse("/ask").is_err());
        assert!(parse("   ").is_err());
    }

    #[test]
    fn prompt_edit() {
        assert_eq!(
            parse("/prompt categorization Label: {subject}"),
            Ok(Command::SetPrompt {
                kind: TemplateKind::Categorization,
                text: "Label: {subject}".into()
            })
        );
        assert!(parse("/prompt nonsense text").is_err());
        assert!(parse("/prompt auto_reply").is_err());
    }

    #[test]
    fn unknown_command() {
        let err = parse("/frobnicate").unwrap_err();
        assert!(err.contains("/frobnicate"));
    }
}
