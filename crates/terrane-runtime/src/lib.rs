//! Tick thread owning the map: serves edits, emerges and saves, and runs the
//! periodic liquid and unload passes.
#![forbid(unsafe_code)]

mod command;
mod config;
mod generate;

pub use command::{Command, Reply};
pub use config::RuntimeConfig;
pub use generate::{emerge_batch, plan_waves};

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, bounded, select, tick, unbounded};
use rayon::{ThreadPool, ThreadPoolBuilder};
use terrane_edit::{MapEditEvent, MapEditKind};
use terrane_geom::V3;
use terrane_map::{BlockSet, Map};

struct Request {
    cmd: Command,
    reply: Option<Sender<Reply>>,
}

/// Cloneable sender side of a running [`Runtime`].
#[derive(Clone)]
pub struct RuntimeHandle {
    tx: Sender<Request>,
}

impl RuntimeHandle {
    /// Queue `cmd` without waiting. False when the runtime has stopped.
    pub fn send(&self, cmd: Command) -> bool {
        self.tx.send(Request { cmd, reply: None }).is_ok()
    }

    /// Queue `cmd` and block until the tick thread answers.
    pub fn call(&self, cmd: Command) -> Option<Reply> {
        let (tx, rx) = bounded(1);
        self.tx.send(Request { cmd, reply: Some(tx) }).ok()?;
        rx.recv().ok()
    }
}

/// Counters reported when the tick thread stops.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub ticks: u64,
    pub commands: u64,
    pub liquid_changed: u64,
    pub unloaded: u64,
}

pub struct Runtime {
    handle: RuntimeHandle,
    thread: Option<JoinHandle<TickStats>>,
}

impl Runtime {
    /// Move `map` onto a new tick thread.
    pub fn spawn(map: Map, cfg: RuntimeConfig) -> Self {
        let (tx, rx) = unbounded();
        let pool = ThreadPoolBuilder::new()
            .num_threads(cfg.gen_workers)
            .thread_name(|i| format!("terrane-gen-{i}"))
            .build()
            .expect("generation pool");
        let thread = thread::Builder::new()
            .name("terrane-tick".into())
            .spawn(move || TickLoop::new(map, pool, cfg).run(rx))
            .expect("tick thread");
        Self {
            handle: RuntimeHandle { tx },
            thread: Some(thread),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Stop the tick thread and wait for it. The map is saved as it drops.
    pub fn shutdown(mut self) -> TickStats {
        self.stop()
    }

    fn stop(&mut self) -> TickStats {
        let Some(thread) = self.thread.take() else {
            return TickStats::default();
        };
        self.handle.send(Command::Shutdown);
        match thread.join() {
            Ok(stats) => stats,
            Err(_) => {
                log::error!(target: "map", "tick thread panicked");
                TickStats::default()
            }
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.stop();
    }
}

struct TickLoop {
    map: Map,
    pool: ThreadPool,
    cfg: RuntimeConfig,
    stats: TickStats,
    last: Instant,
}

impl TickLoop {
    fn new(map: Map, pool: ThreadPool, cfg: RuntimeConfig) -> Self {
        Self {
            map,
            pool,
            cfg,
            stats: TickStats::default(),
            last: Instant::now(),
        }
    }

    fn run(mut self, rx: Receiver<Request>) -> TickStats {
        let ticker = tick(Duration::from_millis(self.cfg.tick_ms.max(1)));
        loop {
            select! {
                recv(rx) -> req => match req {
                    Ok(req) => {
                        if !self.handle(req) {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                recv(ticker) -> _ => self.step(),
            }
        }
        log::info!(
            target: "map",
            "tick thread stopping after {} ticks, {} commands",
            self.stats.ticks,
            self.stats.commands
        );
        self.stats
    }

    /// Serve one request. False on shutdown.
    fn handle(&mut self, req: Request) -> bool {
        self.stats.commands += 1;
        let t = self.stats.ticks;
        let mut running = true;
        let reply = match req.cmd {
            Command::AddNode { p, node } => {
                let ok = self.map.add_node_with_event(p, node);
                log::debug!(target: "events", "[tick {}] AddNode {} content={} ok={}", t, p, node.content, ok);
                Reply::Edited(ok)
            }
            Command::RemoveNode { p } => {
                let ok = self.map.remove_node_with_event(p);
                log::debug!(target: "events", "[tick {}] RemoveNode {} ok={}", t, p, ok);
                Reply::Edited(ok)
            }
            Command::Emerge { blocks, allow_generate } => {
                log::debug!(target: "events", "[tick {}] Emerge {} blocks", t, blocks.len());
                match emerge_batch(&mut self.map, &self.pool, &blocks, allow_generate) {
                    Ok(loaded) => Reply::Emerged(loaded),
                    Err(e) => {
                        log::error!(target: "map", "emerge failed: {}", e);
                        Reply::Failed(e)
                    }
                }
            }
            Command::Save(level) => match self.map.save(level) {
                Ok(stats) => Reply::Saved(stats),
                Err(e) => {
                    log::error!(target: "map", "save failed: {}", e);
                    Reply::Failed(e)
                }
            },
            Command::GetNode(p) => Reply::Node(self.map.get_node(p).ok()),
            Command::Stats => Reply::Stats(self.map.stats()),
            Command::Shutdown => {
                running = false;
                Reply::ShuttingDown
            }
        };
        if let Some(tx) = req.reply {
            let _ = tx.send(reply);
        }
        running
    }

    fn step(&mut self) {
        let now = Instant::now();
        let dtime = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        self.stats.ticks += 1;

        let mut modified = BlockSet::new();
        let liquid = self.map.transform_liquids(&mut modified);
        self.stats.liquid_changed += u64::from(liquid.changed);
        if !modified.is_empty() {
            let event = MapEditEvent::new(MapEditKind::Other, V3::ZERO).with_blocks(modified);
            self.map.dispatch_event(&event);
        }

        let timeout = self.map.config().unload_timeout_secs;
        match self.map.timer_update(dtime, timeout) {
            Ok(unloaded) => self.stats.unloaded += unloaded.len() as u64,
            Err(e) => log::error!(target: "map", "unload pass failed: {}", e),
        }
    }
}
