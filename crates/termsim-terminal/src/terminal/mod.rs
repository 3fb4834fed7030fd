//! The simulation instance: dispatcher, active dialogue and event bus.

use termsim_types::config::LessonConfig;
use termsim_types::error::{Result, SimError};
use termsim_types::event::Event;
use termsim_types::transcript::{Style, TranscriptEntry};
use termsim_vfs::MemoryVfs;

use crate::commands::register_builtins;
use crate::dialogue::{Dialogue, DialogueStep};
use crate::interpreter::{Command, CommandOutput, CommandRegistry, Environment};
use crate::network_commands::register_network_commands;
use crate::session::Session;

type Listener = Box<dyn FnMut(&Event)>;

/// Fan-out of broadcast events.
///
/// Listeners see every event synchronously, in emission order. Emitted
/// events are also queued until the end of the current `submit` so the
/// caller gets them back as a batch.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<Listener>,
    pending: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&Event) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn emit(&mut self, event: Event) {
        log::debug!("event {}", event.kind());
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.pending.push(event);
    }

    /// Take the events emitted since the last drain.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending)
    }
}

/// One simulated terminal.
///
/// Owns the VFS, the session, the transcript and at most one active
/// dialogue. Instances share nothing; a page with two terminals holds two
/// independent `Terminal`s.
pub struct Terminal {
    config: LessonConfig,
    registry: CommandRegistry,
    session: Session,
    vfs: MemoryVfs,
    transcript: Vec<TranscriptEntry>,
    dialogue: Option<Box<dyn Dialogue>>,
    bus: EventBus,
}

impl Terminal {
    /// Build a terminal from a lesson. Fails when the configuration or the
    /// initial filesystem is inconsistent.
    pub fn new(config: LessonConfig) -> Result<Self> {
        config.validate()?;
        let vfs = initial_vfs(&config)?;
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry);
        register_network_commands(&mut registry);
        let session = Session::new(&config);
        let mut term = Self {
            config,
            registry,
            session,
            vfs,
            transcript: Vec::new(),
            dialogue: None,
            bus: EventBus::new(),
        };
        term.push_motd();
        log::info!(
            "terminal ready for {}@{}",
            term.session.user,
            term.session.host
        );
        Ok(term)
    }

    /// Restore the initial filesystem, session and transcript. Custom
    /// commands and listeners are kept.
    pub fn reset(&mut self) -> Result<()> {
        self.vfs = initial_vfs(&self.config)?;
        self.session = Session::new(&self.config);
        self.dialogue = None;
        self.transcript.clear();
        self.bus.drain();
        self.push_motd();
        log::info!("terminal reset");
        Ok(())
    }

    fn push_motd(&mut self) {
        if let Some(motd) = self.config.motd_line() {
            self.transcript.push(TranscriptEntry::output(motd));
        }
    }

    /// Register a listener for every broadcast event.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&Event) + 'static,
    {
        self.bus.subscribe(listener);
    }

    /// Register a command that shadows any built-in of the same name.
    pub fn register_custom(&mut self, cmd: Box<dyn Command>) {
        self.registry.register_custom(cmd);
    }

    pub fn register_fn<F>(&mut self, name: &str, description: &str, handler: F)
    where
        F: Fn(&[&str], &mut Environment<'_>) -> Result<CommandOutput> + 'static,
    {
        self.registry.register_fn(name, description, handler);
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    /// Process one submitted line to completion. Returns the events it
    /// emitted, in order.
    pub fn submit(&mut self, input: &str) -> Vec<Event> {
        let Self {
            config,
            registry,
            session,
            vfs,
            transcript,
            dialogue,
            bus,
        } = self;

        if let Some(mut active) = dialogue.take() {
            let line = if active.masked() { input } else { input.trim() };
            log::debug!("dialogue {} received input", active.kind());
            let step = {
                let mut env =
                    Environment::new(line, session, vfs, config, transcript, bus, dialogue);
                active.respond(line, &mut env)
            };
            match step {
                Ok(DialogueStep::Continue) => {
                    if dialogue.is_none() {
                        *dialogue = Some(active);
                    }
                },
                Ok(DialogueStep::Done) => log::debug!("dialogue {} finished", active.kind()),
                Ok(DialogueStep::Replace(next)) => *dialogue = Some(next),
                Err(e) => transcript.push(TranscriptEntry::styled(e.to_string(), Style::Error)),
            }
        } else {
            let line = input.trim();
            if line.is_empty() {
                return Vec::new();
            }
            transcript.push(TranscriptEntry::command(line, &session.user, &session.host));

            let mut tokens = line.split_whitespace();
            let name = tokens.next().unwrap_or_default().to_ascii_lowercase();
            let args: Vec<&str> = tokens.collect();
            bus.emit(Event::Command {
                name: name.clone(),
                full_text: line.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
                actor_user: session.user.clone(),
                actor_host: session.host.clone(),
            });
            log::debug!("dispatch {name} {args:?}");

            let result = if name == "help" && !registry.is_custom("help") {
                registry.execute_help(&args)
            } else if let Some(cmd) = registry.get(&name) {
                let mut env =
                    Environment::new(line, session, vfs, config, transcript, bus, dialogue);
                cmd.execute(&args, &mut env)
            } else {
                Err(SimError::Command(format!("{name}: command not found")))
            };

            match result {
                Ok(CommandOutput::Text(text)) => {
                    for l in text.split('\n') {
                        transcript.push(TranscriptEntry::output(l));
                    }
                },
                Ok(CommandOutput::None) => {},
                Ok(CommandOutput::Clear) => transcript.clear(),
                Err(e) => transcript.push(TranscriptEntry::styled(e.to_string(), Style::Error)),
            }
        }

        session.password_mode = dialogue.as_ref().is_some_and(|d| d.masked());
        bus.drain()
    }

    /// Input prefix the UI should show: the shell prompt, the active
    /// dialogue's label, or nothing while a wizard waits.
    pub fn prompt(&self) -> String {
        match &self.dialogue {
            Some(d) => d.prompt().unwrap_or_default().to_string(),
            None => self.session.prompt(),
        }
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn vfs(&self) -> &MemoryVfs {
        &self.vfs
    }

    pub fn config(&self) -> &LessonConfig {
        &self.config
    }

    /// Kind of the active dialogue, if any.
    pub fn dialogue_kind(&self) -> Option<&str> {
        self.dialogue.as_deref().map(|d| d.kind())
    }
}

fn initial_vfs(config: &LessonConfig) -> Result<MemoryVfs> {
    let vfs = MemoryVfs::from_snapshot(&config.filesystem)?;
    if !vfs.is_dir(&config.home) {
        log::warn!("home {} missing from the initial filesystem", config.home);
        return Err(SimError::Config(format!(
            "home {} is not a directory in the initial filesystem",
            config.home
        )));
    }
    Ok(vfs)
}
