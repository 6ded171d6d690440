use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::config::{self, Config};
use crate::cursor::NavigationCursor;
use crate::data::{self, FeedService, PageRequest};
use crate::fetcher::{FetchResult, Fetcher};
use crate::media::{MediaDescriptor, MediaKind};
use crate::reddit;
use crate::session::{FeedError, FetchOutcome, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Interactive,
    List {
        json: bool,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub config_file: Option<PathBuf>,
    pub subreddit: Option<String>,
    pub offline: bool,
    pub mode: Mode,
}

pub fn run(options: RunOptions) -> Result<()> {
    let mut cfg = config::load(config::LoadOptions {
        config_file: options.config_file.clone(),
        env_prefix: None,
    })
    .context("load config")?;
    if let Some(subreddit) = options.subreddit.filter(|name| !name.trim().is_empty()) {
        cfg.feed.subreddit = subreddit;
    }

    let feed = feed_service(&cfg, options.offline)?;
    let stdout = io::stdout();
    let mut renderer = Renderer::new(stdout.lock());
    match options.mode {
        Mode::List { json } => list(feed.as_ref(), &cfg, json, &mut renderer),
        Mode::Interactive => {
            let (cmd_tx, cmd_rx) = unbounded();
            spawn_input_reader(cmd_tx);
            interactive(feed, &cfg, cmd_rx, &mut renderer)
        }
    }
}

fn feed_service(cfg: &Config, offline: bool) -> Result<Arc<dyn FeedService>> {
    if offline {
        return Ok(Arc::new(data::MockFeedService));
    }
    let client = reddit::Client::new(reddit::ClientConfig {
        user_agent: cfg.feed.user_agent.clone(),
        base_url: Some(cfg.feed.base_url.clone()),
        timeout: cfg.feed.timeout,
        http_client: None,
    })
    .context("create reddit client")?;
    Ok(Arc::new(data::RedditFeedService::new(
        Arc::new(client),
        cfg.feed.subreddit.clone(),
        cfg.feed.sort,
        Some(cfg.feed.limit),
    )))
}

fn list<W: Write>(
    feed: &dyn FeedService,
    cfg: &Config,
    json: bool,
    renderer: &mut Renderer<W>,
) -> Result<()> {
    let mut session = Session::new(cfg.navigation.end_policy);
    let generation = session.begin_fetch();
    let outcome = session.complete_fetch(generation, feed.fetch_page(&PageRequest::default()));
    if let FetchOutcome::Failed(err) = outcome {
        return Err(anyhow!(err));
    }
    let Some(cursor) = session.cursor() else {
        return Ok(());
    };
    if json {
        renderer.json(cursor)
    } else if cursor.is_empty() {
        renderer.outcome(&session, &FetchOutcome::Empty)
    } else {
        renderer.listing(cursor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    First,
    Reload,
    More,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "n" | "next" => Some(Command::Next),
        "p" | "prev" | "previous" => Some(Command::Previous),
        "0" | "first" => Some(Command::First),
        "r" | "reload" => Some(Command::Reload),
        "m" | "more" => Some(Command::More),
        "h" | "?" | "help" => Some(Command::Help),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

fn spawn_input_reader(tx: Sender<Option<Command>>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(parse_command(&line)).is_err() {
                break;
            }
        }
        let _ = tx.send(Some(Command::Quit));
    });
}

fn interactive<W: Write>(
    feed: Arc<dyn FeedService>,
    cfg: &Config,
    commands: Receiver<Option<Command>>,
    renderer: &mut Renderer<W>,
) -> Result<()> {
    let fetcher = Fetcher::new(feed);
    let mut session = Session::new(cfg.navigation.end_policy);

    renderer.banner(&cfg.feed.subreddit)?;
    fetcher.request(session.begin_fetch(), PageRequest::default())?;
    renderer.loading()?;

    // Commands typed while a page is loading are replayed once it lands.
    let mut deferred: VecDeque<Command> = VecDeque::new();

    loop {
        crossbeam_channel::select! {
            recv(fetcher.results()) -> msg => {
                let Ok(FetchResult { generation, result }) = msg else {
                    return Err(anyhow!("feed fetcher stopped unexpectedly"));
                };
                let outcome = session.complete_fetch(generation, result);
                renderer.outcome(&session, &outcome)?;
                while !session.is_loading() {
                    let Some(command) = deferred.pop_front() else { break };
                    if !handle_command(command, &mut session, &fetcher, renderer)? {
                        return Ok(());
                    }
                }
            }
            recv(commands) -> msg => {
                let Ok(command) = msg else { break };
                let Some(command) = command else {
                    renderer.help()?;
                    continue;
                };
                let quit_now = command == Command::Quit && deferred.is_empty();
                if session.is_loading() && !quit_now {
                    deferred.push_back(command);
                    continue;
                }
                if !handle_command(command, &mut session, &fetcher, renderer)? {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Applies one command. Returns `false` when the session should end.
fn handle_command<W: Write>(
    command: Command,
    session: &mut Session,
    fetcher: &Fetcher,
    renderer: &mut Renderer<W>,
) -> Result<bool> {
    match command {
        Command::Next => {
            if session.advance() {
                renderer.current(session)?;
            } else {
                renderer.at_boundary(session, "last")?;
            }
        }
        Command::Previous => {
            if session.rewind() {
                renderer.current(session)?;
            } else {
                renderer.at_boundary(session, "first")?;
            }
        }
        Command::First => {
            session.reset();
            renderer.current(session)?;
        }
        Command::Reload => {
            fetcher.request(session.begin_fetch(), PageRequest::default())?;
            renderer.loading()?;
        }
        Command::More => match session.next_page() {
            Some(request) => {
                fetcher.request(session.begin_fetch(), request)?;
                renderer.loading()?;
            }
            None => renderer.note("No further pages. Press r to reload.")?,
        },
        Command::Help => renderer.help()?,
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

/// Line-oriented renderer for descriptors and feed status.
pub struct Renderer<W: Write> {
    out: W,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn banner(&mut self, subreddit: &str) -> Result<()> {
        writeln!(
            self.out,
            "pippup {} - r/{}  (Enter/n next, p previous, 0 first, r reload, m more, q quit)",
            crate::VERSION,
            subreddit.trim_start_matches("r/")
        )?;
        Ok(())
    }

    fn loading(&mut self) -> Result<()> {
        self.note("Loading!")
    }

    fn help(&mut self) -> Result<()> {
        self.note("Commands: Enter/n next, p previous, 0 first, r reload, m more page, q quit")
    }

    fn note(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{message}")?;
        self.out.flush()?;
        Ok(())
    }

    pub fn outcome(&mut self, session: &Session, outcome: &FetchOutcome) -> Result<()> {
        match outcome {
            FetchOutcome::Ready(len) => {
                self.note(&format!("{len} items ready."))?;
                self.current(session)
            }
            FetchOutcome::Empty => self.note(&format!(
                "{}. Press r to reload or m for the next page.",
                capitalize(&FeedError::EmptySequence.to_string())
            )),
            FetchOutcome::Failed(err) => {
                self.note(&format!("Error: {err}. Press r to retry."))?;
                if session.current().is_some() {
                    self.note("Still showing the previous page.")?;
                }
                Ok(())
            }
            FetchOutcome::Stale => Ok(()),
        }
    }

    pub fn current(&mut self, session: &Session) -> Result<()> {
        match (session.cursor(), session.current()) {
            (Some(cursor), Some(descriptor)) => {
                let index = cursor.index().unwrap_or_default();
                let line = describe(index, cursor.len(), descriptor);
                self.note(&line)
            }
            _ => self.note("Nothing to show yet."),
        }
    }

    fn at_boundary(&mut self, session: &Session, which: &str) -> Result<()> {
        if session.current().is_none() {
            return self.note("Nothing to show yet.");
        }
        if which == "last" && session.next_page().is_some() {
            self.note("Already at the last item. Press m for the next page.")
        } else {
            self.note(&format!("Already at the {which} item."))
        }
    }

    pub fn listing(&mut self, cursor: &NavigationCursor) -> Result<()> {
        let len = cursor.len();
        for (index, descriptor) in cursor.sequence().iter().enumerate() {
            writeln!(self.out, "{}", describe(index, len, descriptor))?;
        }
        self.out.flush()?;
        Ok(())
    }

    pub fn json(&mut self, cursor: &NavigationCursor) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.out, cursor.sequence().as_slice())
            .context("serialize media sequence")?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}

fn describe(index: usize, len: usize, descriptor: &MediaDescriptor) -> String {
    let kind = match descriptor.kind {
        MediaKind::Image => "image",
        MediaKind::Video => "video",
    };
    let mut line = format!(
        "[{}/{}] {} via {}: {}",
        index + 1,
        len,
        kind,
        descriptor.source,
        descriptor.uri
    );
    if !descriptor.title.is_empty() {
        line.push_str(&format!("\n      {}", descriptor.title));
    }
    line
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
