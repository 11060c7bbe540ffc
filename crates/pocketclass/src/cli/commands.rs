//! # CLI Dispatch
//!
//! Parses arguments, sets up logging and the [`ClassroomContext`], then routes
//! each subcommand to the API and renders the result.
//!
//! Handlers here only translate between the terminal and the API: argument
//! parsing into drafts, rendering of `CmdResult`s, and the interactive quiz loop.

use super::render;
use super::setup::{Cli, Commands};
use anyhow::{bail, Context, Result};
use clap::Parser;
use log::debug;
use pocketclassapp::commands::save::CapsuleDraft;
use pocketclassapp::init::{initialize, ClassroomContext};
use pocketclassapp::model::{Flashcard, QuizQuestion, CHOICES_PER_QUESTION};
use std::io::{self, BufRead, Write};
use std::path::Path;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut ctx = initialize(cli.data.clone())?;
    ctx.api.on_progress_changed(|event| {
        debug!("progress changed for capsule {}", event.capsule_id());
    });

    match cli.command.unwrap_or(Commands::List) {
        Commands::List => handle_list(&ctx),
        Commands::View { capsule, search } => handle_view(&ctx, &capsule, search.as_deref()),
        Commands::Create {
            title,
            subject,
            level,
            description,
            notes_file,
            cards,
            questions,
            replace,
        } => {
            let draft = CapsuleDraft {
                id: replace.map(|r| ctx.api.resolve(&r)).transpose()?,
                title,
                subject,
                level,
                description,
                notes: read_notes(notes_file.as_deref())?,
                flashcards: cards
                    .iter()
                    .map(String::as_str)
                    .map(parse_card)
                    .collect::<Result<_>>()?,
                quiz: questions
                    .iter()
                    .map(String::as_str)
                    .map(parse_question)
                    .collect::<Result<_>>()?,
            };
            let result = ctx.api.save_capsule(draft)?;
            render::print_messages(&result.messages);
            Ok(())
        }
        Commands::Delete { capsule } => {
            let result = ctx.api.delete_capsule(&capsule)?;
            render::print_messages(&result.messages);
            Ok(())
        }
        Commands::Known { capsule, card } => handle_known(&mut ctx, &capsule, card),
        Commands::Quiz { capsule } => {
            let stdin = io::stdin();
            handle_quiz(&mut ctx, &capsule, stdin.lock(), &mut io::stdout())
        }
        Commands::Import { paths } => {
            let result = ctx.api.import_capsules(paths)?;
            render::print_messages(&result.messages);
            Ok(())
        }
        Commands::Export { capsule, out } => {
            let result = ctx.api.export_capsule(&capsule, &out)?;
            render::print_messages(&result.messages);
            Ok(())
        }
        Commands::Doctor => {
            let result = ctx.api.doctor()?;
            render::print_messages(&result.messages);
            Ok(())
        }
    }
}

/// Warnings by default, debug with `--verbose`. `RUST_LOG` overrides both.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn handle_list(ctx: &ClassroomContext) -> Result<()> {
    let result = ctx.api.list_capsules()?;
    print!("{}", render::render_capsule_list(&result.listed_entries));
    render::print_messages(&result.messages);
    Ok(())
}

fn handle_view(ctx: &ClassroomContext, selector: &str, search: Option<&str>) -> Result<()> {
    let result = ctx.api.view_capsule(selector, search)?;
    for capsule in &result.capsules {
        let matching = search.map(|_| result.matching_notes.as_slice());
        print!("{}", render::render_capsule(capsule, matching));
    }
    render::print_messages(&result.messages);
    Ok(())
}

fn handle_known(ctx: &mut ClassroomContext, selector: &str, card: usize) -> Result<()> {
    let id = ctx.api.resolve(selector)?;
    let capsule = ctx.api.get_capsule(&id)?;
    if card == 0 || card > capsule.flashcards.len() {
        bail!(
            "Card {} does not exist; \"{}\" has {} flashcard(s)",
            card,
            capsule.meta.title,
            capsule.flashcards.len()
        );
    }

    match ctx.api.toggle_known(&id, card - 1) {
        Some(toggle) => {
            let state = if toggle.known { "known" } else { "not known" };
            println!(
                "Card {} marked as {} ({}/{} known)",
                card,
                state,
                toggle.known_cards,
                capsule.flashcards.len()
            );
            Ok(())
        }
        None => bail!("Could not update card {}", card),
    }
}

/// Runs quiz passes, reading one answer per line from `input`.
///
/// End of input or `q` abandons the pass without touching the best score. After a
/// completed pass, answering `y` to the retry prompt starts another one.
fn handle_quiz<R: BufRead, W: Write>(
    ctx: &mut ClassroomContext,
    selector: &str,
    input: R,
    out: &mut W,
) -> Result<()> {
    let id = ctx.api.resolve(selector)?;
    let capsule = ctx.api.get_capsule(&id)?;
    if capsule.quiz.is_empty() {
        writeln!(out, "\"{}\" has no quiz questions.", capsule.meta.title)?;
        return Ok(());
    }

    let mut session = ctx.api.start_quiz(&id)?;
    let feedback = ctx.config.answer_feedback();
    let mut lines = input.lines();

    writeln!(out, "Quiz: {}", capsule.meta.title)?;
    loop {
        while !session.is_finished() {
            let index = session.current();
            let question = &capsule.quiz[index];
            write!(
                out,
                "{}",
                render::render_question(question, index + 1, session.total())
            )?;
            write!(out, "Answer: ")?;
            out.flush()?;

            let line = match lines.next() {
                Some(line) => line?,
                None => {
                    writeln!(out, "\nQuiz abandoned.")?;
                    return Ok(());
                }
            };
            let answer = line.trim();
            if answer.eq_ignore_ascii_case("q") {
                writeln!(out, "Quiz abandoned.")?;
                return Ok(());
            }
            let chosen = match parse_choice(answer).filter(|c| !question.choices[*c].is_empty()) {
                Some(chosen) => chosen,
                None => {
                    writeln!(out, "Answer with one of the listed letters, or q to quit.")?;
                    continue;
                }
            };

            if let Some(outcome) = ctx.api.record_answer(&mut session, index, chosen) {
                write!(out, "{}", render::render_outcome(&outcome, question))?;
            }
            out.flush()?;
            std::thread::sleep(feedback);
            session.advance();
        }

        let best = ctx.api.complete_pass(&session);
        write!(
            out,
            "{}",
            render::render_pass_summary(session.correct(), session.total(), session.percent(), best)
        )?;

        write!(out, "Try again? [y/N] ")?;
        out.flush()?;
        let again = match lines.next() {
            Some(line) => line?.trim().eq_ignore_ascii_case("y"),
            None => false,
        };
        if !again {
            writeln!(out)?;
            return Ok(());
        }
        session.restart();
    }
}

/// Accepts a letter (`A`-`D`, any case) or a number (`1`-`4`).
fn parse_choice(answer: &str) -> Option<usize> {
    let mut chars = answer.chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    let index = match first.to_ascii_uppercase() {
        c @ 'A'..='Z' => c as usize - 'A' as usize,
        c @ '1'..='9' => c as usize - '1' as usize,
        _ => return None,
    };
    (index < CHOICES_PER_QUESTION).then_some(index)
}

fn read_notes(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Could not read notes file {}", path.display())),
        None => Ok(String::new()),
    }
}

fn parse_card(arg: &str) -> Result<Flashcard> {
    match arg.split_once("::") {
        Some((front, back)) if !front.trim().is_empty() => {
            Ok(Flashcard::new(front.trim(), back.trim()))
        }
        _ => bail!("Invalid card \"{}\": expected FRONT::BACK", arg),
    }
}

fn parse_question(arg: &str) -> Result<QuizQuestion> {
    let parts: Vec<&str> = arg.split("::").collect();
    let [question, choices, answer] = parts.as_slice() else {
        bail!("Invalid question \"{}\": expected QUESTION::A|B|C|D::ANSWER", arg);
    };
    let choices: Vec<String> = choices.split('|').map(|c| c.trim().to_string()).collect();
    if question.trim().is_empty() || choices.len() > CHOICES_PER_QUESTION {
        bail!(
            "Invalid question \"{}\": needs text and at most {} choices",
            arg,
            CHOICES_PER_QUESTION
        );
    }
    let correct = match answer.trim().parse::<usize>() {
        Ok(n) if (1..=choices.len()).contains(&n) => n - 1,
        _ => bail!(
            "Invalid answer \"{}\" in question \"{}\": expected 1 to {}",
            answer,
            question,
            choices.len()
        ),
    };
    Ok(QuizQuestion::new(question.trim(), choices, correct, ""))
}
