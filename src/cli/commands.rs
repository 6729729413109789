//! Command dispatch and the interactive learning loop

use std::io;
use std::path::Path;

use clap::CommandFactory;
use tracing::{debug, instrument};

use crate::application::services::{LearningSession, QuizReport, SessionPhase};
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::render;
use crate::config::Settings;
use crate::domain::LayoutStyle;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::preferences::TomlPreferenceStore;
use crate::infrastructure::traits::{PreferenceStore, SelectionItem};
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Learn { topic, layout }) => {
            let container = ServiceContainer::new()?;
            run_learn(&container, topic, *layout)
        }
        Some(Commands::Map {
            topic,
            svg,
            layout,
        }) => {
            let container = ServiceContainer::new()?;
            run_map(&container, topic, svg.as_deref(), *layout)
        }
        Some(Commands::Config { command }) => {
            let store = TomlPreferenceStore::default_location()?;
            run_config(&store, command)
        }
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "quizmap", &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see quizmap --help".to_string(),
        )),
    }
}

// ============================================================
// Config
// ============================================================

pub fn run_config(store: &dyn PreferenceStore, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(store)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => match store.location() {
            Some(path) => output::info(&path.display()),
            None => output::warning("preferences have no file location"),
        },
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Set { key, value } => {
            let mut settings = Settings::from_stored(store.load()?);
            settings.set(key, value)?;
            store.save(&settings)?;
            output::success(&format!("{key} updated"));
        }
    }
    Ok(())
}

// ============================================================
// Map
// ============================================================

#[instrument(level = "debug", skip(container))]
pub fn run_map(
    container: &ServiceContainer,
    topic: &str,
    svg: Option<&Path>,
    layout: Option<LayoutStyle>,
) -> CliResult<()> {
    let mut session = container.session(layout);
    session.on_phase_change(announce_phase);
    session.start(topic)?;
    print_tree(&session);
    if let Some(path) = svg {
        export_svg(&session, path)?;
    }
    Ok(())
}

// ============================================================
// Learn (interactive loop)
// ============================================================

/// One line typed at the session prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Play,
    Toggle(String),
    Collapse,
    Expand,
    Zoom(f64),
    ZoomIn,
    ZoomOut,
    Pan(f64, f64),
    Reset,
    Svg(String),
    Next,
    Tree,
    Help,
    Quit,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return Err("empty command".to_string());
        };
        let args: Vec<&str> = parts.collect();
        let number = |s: &str| {
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("not a number: {s}"))
        };
        let cmd = match (head, args.as_slice()) {
            ("play" | "p", []) => ReplCommand::Play,
            ("toggle" | "t", [id]) => ReplCommand::Toggle(id.to_string()),
            ("collapse", []) => ReplCommand::Collapse,
            ("expand", []) => ReplCommand::Expand,
            ("zoom" | "z", [delta]) => ReplCommand::Zoom(number(*delta)?),
            ("+", []) => ReplCommand::ZoomIn,
            ("-", []) => ReplCommand::ZoomOut,
            ("pan", [dx, dy]) => ReplCommand::Pan(number(*dx)?, number(*dy)?),
            ("reset", []) => ReplCommand::Reset,
            ("svg", [file]) => ReplCommand::Svg(file.to_string()),
            ("next" | "n", []) => ReplCommand::Next,
            ("tree", []) => ReplCommand::Tree,
            ("help" | "?", []) => ReplCommand::Help,
            ("quit" | "q" | "exit", []) => ReplCommand::Quit,
            (other, _) => return Err(format!("unknown command or arguments: {other}")),
        };
        Ok(cmd)
    }
}

const REPL_HELP: &str = "commands: play | toggle <id> | collapse | expand | zoom <delta> | + | - | \
pan <dx> <dy> | reset | svg <file> | next | tree | help | quit";

#[instrument(level = "debug", skip(container))]
pub fn run_learn(
    container: &ServiceContainer,
    topic: &str,
    layout: Option<LayoutStyle>,
) -> CliResult<()> {
    let mut session = container.session(layout);
    session.on_phase_change(announce_phase);
    session.start(topic)?;
    print_tree(&session);
    output::detail(REPL_HELP);

    loop {
        let Some(line) = container
            .prompter
            .read_line("quizmap>")
            .map_err(|e| InfraError::io("read command", e))?
        else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match ReplCommand::parse(&line) {
            Ok(c) => c,
            Err(e) => {
                output::warning(&e);
                continue;
            }
        };
        debug!("repl: {:?}", command);
        if command == ReplCommand::Quit {
            break;
        }
        // Failures are reported and the session keeps its state.
        if let Err(e) = apply_command(container, &mut session, command) {
            output::error(&e);
        }
    }
    Ok(())
}

fn apply_command(
    container: &ServiceContainer,
    session: &mut LearningSession,
    command: ReplCommand,
) -> CliResult<()> {
    match command {
        ReplCommand::Play => {
            if let Some(id) = pick_node(container, session)? {
                run_quiz(container, session, &id)?;
            }
        }
        ReplCommand::Toggle(id) => {
            session.toggle_collapse(&id)?;
            print_tree(session);
        }
        ReplCommand::Collapse => {
            session.collapse_all();
            print_tree(session);
        }
        ReplCommand::Expand => {
            session.expand_all();
            print_tree(session);
        }
        ReplCommand::Zoom(delta) => print_zoom(session.adjust_zoom(delta)),
        ReplCommand::ZoomIn => print_zoom(session.zoom_in()),
        ReplCommand::ZoomOut => print_zoom(session.zoom_out()),
        ReplCommand::Pan(dx, dy) => {
            session.pan_by(dx, dy);
            let pan = session.view().pan();
            output::detail(&format!("pan {:.0},{:.0}", pan.x, pan.y));
        }
        ReplCommand::Reset => {
            session.reset_view();
            output::detail("view reset");
        }
        ReplCommand::Svg(file) => export_svg(session, Path::new(&file))?,
        ReplCommand::Next => {
            session.advance_level()?;
            print_tree(session);
        }
        ReplCommand::Tree => print_tree(session),
        ReplCommand::Help => output::detail(REPL_HELP),
        ReplCommand::Quit => {}
    }
    Ok(())
}

/// Fuzzy-pick one of the available nodes. Locked nodes are never offered.
fn pick_node(container: &ServiceContainer, session: &LearningSession) -> CliResult<Option<String>> {
    let items: Vec<SelectionItem> = session
        .available_nodes()
        .into_iter()
        .map(|n| SelectionItem {
            display: format!("{} [{}]", n.label, n.id),
            value: n.id.clone(),
        })
        .collect();
    if items.is_empty() {
        output::warning("no node available, type `next` for the next level");
        return Ok(None);
    }
    let picked = container
        .selector
        .select_one(&items, "node> ")
        .map_err(|message| InfraError::Selector { message })?;
    Ok(picked.map(|item| item.value))
}

/// Ask every question on the prompter, then score the quiz.
pub fn run_quiz(
    container: &ServiceContainer,
    session: &mut LearningSession,
    node_id: &str,
) -> CliResult<()> {
    let total = session.begin_quiz(node_id)?.questions().len();

    while let Some((i, question)) = session.quiz().and_then(|quiz| {
        let i = quiz.next_unanswered()?;
        quiz.questions().get(i).cloned().map(|q| (i, q))
    }) {
        output::header(&format!("Q{}/{}: {}", i + 1, total, question.text));
        for (n, option) in question.options.iter().enumerate() {
            output::option(n + 1, option);
        }
        loop {
            let prompt = format!("answer [1-{}, a to abandon]>", question.options.len());
            let Some(line) = container
                .prompter
                .read_line(&prompt)
                .map_err(|e| InfraError::io("read answer", e))?
            else {
                session.abandon_quiz()?;
                return Ok(());
            };
            let line = line.trim();
            if line == "a" {
                session.abandon_quiz()?;
                output::detail("quiz abandoned");
                return Ok(());
            }
            let Some(choice) = line.parse::<usize>().ok().and_then(|n| n.checked_sub(1)) else {
                output::warning(&format!("not an option: {line}"));
                continue;
            };
            match session.answer(i, choice) {
                Ok(feedback) => {
                    let right = &question.options[feedback.correct_index];
                    if feedback.correct {
                        output::correct(&format!("correct: {right}"));
                    } else {
                        output::wrong(&format!("the answer is: {right}"));
                    }
                    output::detail(&feedback.explanation);
                    break;
                }
                Err(ApplicationError::InvalidInput(message)) => output::warning(&message),
                Err(e) => return Err(e.into()),
            }
        }
    }

    let report = session.finish_quiz()?;
    print_report(session, &report);
    Ok(())
}

fn print_report(session: &LearningSession, report: &QuizReport) {
    output::action(
        "completed",
        &format!(
            "{} {} ({}/{})",
            report.node_id, report.outcome.stars, report.correct, report.total
        ),
    );
    if let Some(summary) = &report.summary {
        output::info(summary);
    }
    if let Some(id) = &report.outcome.unlocked {
        let label = session
            .level()
            .and_then(|l| l.store.get(id))
            .map_or(id.as_str(), |n| n.label.as_str());
        output::action("unlocked", label);
    }
    if report.outcome.level_complete {
        output::success("level complete, type `next` for the next level");
    }
}

fn announce_phase(phase: SessionPhase) {
    if phase == SessionPhase::Loading {
        output::detail("generating...");
    }
}

fn print_zoom(zoom: f64) {
    output::detail(&format!("zoom {zoom:.2}"));
}

fn print_tree(session: &LearningSession) {
    let Some(level) = session.level() else {
        output::warning("no map loaded");
        return;
    };
    output::header(&format!(
        "{} (level {}, {} stars)",
        session.topic(),
        level.number,
        level.store.total_stars()
    ));
    for tree in render::tree_view(&level.store, &level.tree, session.view()) {
        output::info(&tree);
    }
}

fn export_svg(session: &LearningSession, path: &Path) -> CliResult<()> {
    let level = session.level().ok_or(ApplicationError::NoLevel)?;
    let layout = session.layout().ok_or(ApplicationError::NoLevel)?;
    let doc = render::svg(&level.store, &layout, &session.connectors());
    std::fs::write(path, doc)
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    output::action("wrote", &path.display());
    Ok(())
}
