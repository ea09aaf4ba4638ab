//! Terminal front-end for the `analyze` and `chat` subcommands.

use colored::*;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::analysis::AnalysisView;
use crate::chat::{ChatView, SendRejected, Sender};
use crate::config::AppConfig;
use crate::dataset::ProblemSet;
use crate::dispatch::Dispatcher;
use crate::error::CoachError;
use crate::languages::find_language;
use crate::render::markdown_to_terminal;

/// Analyze `file` (or the language's starter snippet) against `problem_id`.
///
/// An unknown problem or language is reported before anything is sent.
pub async fn run_analyze<W: Write>(
    config: &AppConfig,
    dispatcher: &Dispatcher,
    problem_id: &str,
    file: Option<&Path>,
    language: &str,
    out: &mut W,
) -> Result<AnalysisView, CoachError> {
    if find_language(language).is_none() {
        return Err(CoachError::UnknownLanguage(language.to_string()));
    }
    let problems = ProblemSet::load(&config.dataset.source).await?;
    let mut view = AnalysisView::mount(problem_id, config.inference.analysis_model.clone(), &problems);
    let problem = view
        .problem()
        .cloned()
        .ok_or_else(|| CoachError::ProblemNotFound(problem_id.to_string()))?;

    view.select_language(language);
    match file {
        Some(path) => view.set_source(tokio::fs::read_to_string(path).await?),
        None => view.reset_to_snippet(),
    }

    writeln!(out, "{}", problem.title.bold())?;
    writeln!(out, "{}", problem.problem_description.dimmed())?;
    writeln!(out)?;
    writeln!(out, "{}", format!("Analyzing {} solution...", view.draft().language.name).bright_blue())?;
    out.flush()?;

    let pending = view
        .begin_analysis()
        .map_err(|_| CoachError::ProblemNotFound(problem_id.to_string()))?;
    let outcome = dispatcher.send(&pending).await;
    view.complete_analysis(outcome);

    if view.error() {
        writeln!(out, "{}", view.output().red())?;
    } else {
        writeln!(out, "{}", markdown_to_terminal(view.output()))?;
    }
    Ok(view)
}

fn print_history<W: Write>(view: &ChatView, out: &mut W) -> std::io::Result<()> {
    if view.transcript().is_empty() {
        return writeln!(out, "{}", "(no messages yet)".dimmed());
    }
    for message in view.transcript() {
        print_message(message.sender, &message.text, out)?;
    }
    Ok(())
}

fn print_message<W: Write>(sender: Sender, text: &str, out: &mut W) -> std::io::Result<()> {
    match sender {
        Sender::User => writeln!(out, "{} {}", format!("{}:", sender.label()).bright_cyan().bold(), text),
        Sender::Assistant => writeln!(
            out,
            "{}\n{}",
            format!("{}:", sender.label()).bright_magenta().bold(),
            markdown_to_terminal(text)
        ),
    }
}

/// Line-oriented chat loop. `/history` prints the transcript; `/quit` or end
/// of input closes the widget.
pub async fn run_chat<R, W>(
    view: &mut ChatView,
    dispatcher: &Dispatcher,
    input: R,
    out: &mut W,
) -> Result<(), CoachError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    view.open();
    writeln!(out, "{}", "Chat Support (type /history or /quit)".bright_green().bold())?;

    let mut lines = input.lines();
    loop {
        write!(out, "{} ", "You:".bright_cyan().bold())?;
        out.flush()?;
        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };
        match line.trim() {
            "/quit" => break,
            "/history" => {
                print_history(view, out)?;
                continue;
            }
            _ => {}
        }

        match view.submit(line, dispatcher).await {
            Err(SendRejected::EmptyInput) => continue,
            Err(SendRejected::InFlight) => {
                writeln!(out, "{}", "A reply is still pending.".yellow())?;
                continue;
            }
            Ok(()) => {}
        }
        if let Some(err) = view.error() {
            writeln!(out, "{}", err.red())?;
        } else if let Some(reply) = view.transcript().last() {
            print_message(reply.sender, &reply.text, out)?;
        }
    }

    view.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::CHAT_FAILURE;
    use crate::config::{InferenceConfig, ProfileConfig};

    fn refused_dispatcher() -> Dispatcher {
        Dispatcher::new(&InferenceConfig {
            endpoint: "http://127.0.0.1:9/v1/chat/completions".into(),
            ..InferenceConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_chat_quit_and_history() {
        colored::control::set_override(false);
        let mut view = ChatView::new("m", &ProfileConfig::default());
        let mut out = Vec::new();
        run_chat(&mut view, &refused_dispatcher(), &b"   \n/history\n/quit\nignored\n"[..], &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("(no messages yet)"));
        assert!(view.transcript().is_empty());
        assert!(!view.is_open());
    }

    #[tokio::test]
    async fn test_chat_eof_closes_widget() {
        let mut view = ChatView::new("m", &ProfileConfig::default());
        let mut out = Vec::new();
        run_chat(&mut view, &refused_dispatcher(), &b""[..], &mut out).await.unwrap();
        assert!(!view.is_open());
    }

    #[tokio::test]
    async fn test_chat_failure_prints_error() {
        colored::control::set_override(false);
        let mut view = ChatView::new("m", &ProfileConfig::default());
        let mut out = Vec::new();
        run_chat(&mut view, &refused_dispatcher(), &b"hello\n"[..], &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(CHAT_FAILURE));
        assert_eq!(view.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_analyze_unknown_problem_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id":"1","title":"Two Sum","problem_description":"d"}}]"#).unwrap();
        let mut config = AppConfig::default();
        config.dataset.source = file.path().display().to_string();

        let mut out = Vec::new();
        let r = run_analyze(&config, &refused_dispatcher(), "99", None, "javascript", &mut out).await;
        assert!(matches!(r, Err(CoachError::ProblemNotFound(id)) if id == "99"));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_unknown_language_is_error() {
        let config = AppConfig::default();
        let mut out = Vec::new();
        let r = run_analyze(&config, &refused_dispatcher(), "1", None, "cobol", &mut out).await;
        assert!(matches!(r, Err(CoachError::UnknownLanguage(_))));
    }
}
