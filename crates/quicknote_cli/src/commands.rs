//! Subcommand definitions and dispatch.
//!
//! Every invocation opens the registry (running active-note resolution),
//! performs one operation and prints its result. User-facing refusals such as
//! a blank title become errors here, since a process exit code is the only
//! channel back to the caller.

use anyhow::{anyhow, bail, Context};
use clap::Subcommand;
use log::info;
use quicknote_core::theme::{current_theme, toggle_theme};
use quicknote_core::{
    Clock, CoreConfig, KvBackend, KvStore, MarkdownRenderer, NoteId, NoteRegistry, PreviewToggle,
};
use std::io::{Read, Write};
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    #[command(flatten)]
    Note(NoteCommand),
    /// Show or toggle the dark-mode preference.
    Theme {
        #[arg(long)]
        toggle: bool,
        /// Treat the system as preferring dark mode when no preference is
        /// saved.
        #[arg(long)]
        system_dark: bool,
    },
}

/// Commands that operate on the note registry.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum NoteCommand {
    /// List notes, most recently modified first.
    List,
    /// Print a note (the active note when no id is given).
    Show { id: Option<String> },
    /// Create a note and make it active.
    New { title: String },
    /// Make a note active.
    Open { id: String },
    /// Replace the active note's content and save it.
    Write {
        /// New content. Read from stdin when omitted.
        text: Option<String>,
    },
    /// Rename a note (the active note when no id is given).
    Rename {
        #[arg(long)]
        id: Option<String>,
        title: String,
    },
    /// Delete a note (the active note when no id is given).
    Delete { id: Option<String> },
    /// Write the active note to a `.txt` file.
    Export {
        /// Destination file. Defaults to a name derived from the title in the
        /// current directory.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Render the active note's markdown to HTML.
    Preview,
}

pub fn execute<B: KvBackend, C: Clock>(
    command: Command,
    mut store: KvStore<B>,
    clock: C,
    config: &CoreConfig,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Command::Theme {
            toggle,
            system_dark,
        } => {
            let mode = if toggle {
                toggle_theme(&mut store, system_dark)?
            } else {
                current_theme(&store, system_dark)
            };
            writeln!(out, "{mode}")?;
            Ok(())
        }
        Command::Note(command) => {
            let mut registry = NoteRegistry::open(store, clock, &config.session);
            run_note_command(command, &mut registry, out)
        }
    }
}

fn run_note_command<B: KvBackend, C: Clock>(
    command: NoteCommand,
    registry: &mut NoteRegistry<B, C>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    info!(
        "event=cli_command module=cli status=start command={}",
        command_name(&command)
    );

    match command {
        NoteCommand::List => {
            let active = registry.active_note_id().cloned();
            for item in registry.list_notes() {
                let marker = if Some(&item.id) == active.as_ref() { '*' } else { ' ' };
                writeln!(out, "{marker} {}\t{}", item.id, item.title)?;
            }
        }
        NoteCommand::Show { id } => {
            if let Some(id) = id {
                open_existing(registry, &id)?;
            }
            let (id, note) = registry
                .active_note()
                .ok_or_else(|| anyhow!("no active note"))?;
            writeln!(out, "# {} ({id})", note.title)?;
            writeln!(out)?;
            writeln!(out, "{}", registry.buffer())?;
        }
        NoteCommand::New { title } => {
            let id = registry
                .create_note(&title)
                .ok_or_else(|| anyhow!("note title must not be empty"))?;
            writeln!(out, "{id}")?;
        }
        NoteCommand::Open { id } => {
            open_existing(registry, &id)?;
            writeln!(out, "{id}")?;
        }
        NoteCommand::Write { text } => {
            let text = match text {
                Some(text) => text,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read note content from stdin")?;
                    buf
                }
            };
            registry.on_input(text);
            if !registry.flush() {
                bail!("no active note to save");
            }
            writeln!(out, "saved")?;
        }
        NoteCommand::Rename { id, title } => {
            let id = target_id(registry, id)?;
            if !registry.rename_note(&id, &title) {
                bail!("rename failed: title must not be empty and note `{id}` must exist");
            }
            writeln!(out, "{id}")?;
        }
        NoteCommand::Delete { id } => {
            let id = target_id(registry, id)?;
            registry.delete_note(&id);
            let active = registry
                .active_note_id()
                .ok_or_else(|| anyhow!("no active note"))?;
            writeln!(out, "deleted {id}; active {active}")?;
        }
        NoteCommand::Export { out: path } => {
            let file = registry.export_active()?;
            let path = path.unwrap_or_else(|| PathBuf::from(&file.filename));
            std::fs::write(&path, file.contents.as_bytes())
                .with_context(|| format!("failed to write `{}`", path.display()))?;
            writeln!(out, "{}", path.display())?;
        }
        NoteCommand::Preview => {
            if let PreviewToggle::Preview(html) = registry.toggle_preview(&MarkdownRenderer)? {
                write!(out, "{html}")?;
            }
        }
    }
    Ok(())
}

fn open_existing<B: KvBackend, C: Clock>(
    registry: &mut NoteRegistry<B, C>,
    id: &str,
) -> anyhow::Result<()> {
    if !registry.load_note(&NoteId::new(id)) {
        bail!("note not found: {id}");
    }
    Ok(())
}

fn target_id<B: KvBackend, C: Clock>(
    registry: &NoteRegistry<B, C>,
    id: Option<String>,
) -> anyhow::Result<NoteId> {
    match id {
        Some(id) => Ok(NoteId::new(id)),
        None => registry
            .active_note_id()
            .cloned()
            .ok_or_else(|| anyhow!("no active note")),
    }
}

fn command_name(command: &NoteCommand) -> &'static str {
    match command {
        NoteCommand::List => "list",
        NoteCommand::Show { .. } => "show",
        NoteCommand::New { .. } => "new",
        NoteCommand::Open { .. } => "open",
        NoteCommand::Write { .. } => "write",
        NoteCommand::Rename { .. } => "rename",
        NoteCommand::Delete { .. } => "delete",
        NoteCommand::Export { .. } => "export",
        NoteCommand::Preview => "preview",
    }
}
