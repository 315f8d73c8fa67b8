//! Named build tasks and their ordering.
//!
//! Each task declares the tasks that must finish before it. Running a target
//! runs its whole dependency closure first, each task once:
//!
//! | Task | Runs first | Does |
//! |------|------------|------|
//! | `pages` | | render content to `dest/*.html` |
//! | `clean-assets` | | remove `dest/assets` |
//! | `assets` | `clean-assets` | copy the assets tree |
//! | `styles` | | bundle style sheets |
//! | `build` | `pages`, `assets`, `styles` | |
//! | `serve` | | start the preview server and reload hub |
//! | `watch` | `build`, `serve` | rebuild on change, reload browsers |
//! | `watch-styles` | `styles` | recompile styles on change |
//!
//! Tasks run sequentially on the calling thread. Only the preview server and
//! the reload hub get threads of their own.

use crate::config::Config;
use crate::highlight::Highlighter;
use crate::reload::Reloader;
use crate::serve::PreviewServer;
use crate::watch::WatchScope;
use crate::{assets, output, pages, serve, styles, watch};
use crate::{debug, log};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread::JoinHandle;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Page(#[from] pages::PageError),
    #[error(transparent)]
    Asset(#[from] assets::AssetError),
    #[error(transparent)]
    Style(#[from] styles::StyleError),
    #[error(transparent)]
    Serve(#[from] serve::ServeError),
    #[error(transparent)]
    Reload(#[from] crate::reload::ReloadError),
    #[error(transparent)]
    Watch(#[from] watch::WatchError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Task {
    Pages,
    CleanAssets,
    Assets,
    Styles,
    Build,
    Serve,
    Watch,
    WatchStyles,
}

impl Task {
    pub fn name(self) -> &'static str {
        match self {
            Task::Pages => "pages",
            Task::CleanAssets => "clean-assets",
            Task::Assets => "assets",
            Task::Styles => "styles",
            Task::Build => "build",
            Task::Serve => "serve",
            Task::Watch => "watch",
            Task::WatchStyles => "watch-styles",
        }
    }

    pub fn predecessors(self) -> &'static [Task] {
        match self {
            Task::Assets => &[Task::CleanAssets],
            Task::Build => &[Task::Pages, Task::Assets, Task::Styles],
            Task::Watch => &[Task::Build, Task::Serve],
            Task::WatchStyles => &[Task::Styles],
            Task::Pages | Task::CleanAssets | Task::Styles | Task::Serve => &[],
        }
    }
}

/// Execution order for `target`: predecessors first, each task once.
pub fn plan(target: Task) -> Vec<Task> {
    fn visit(task: Task, order: &mut Vec<Task>) {
        if order.contains(&task) {
            return;
        }
        for &before in task.predecessors() {
            visit(before, order);
        }
        order.push(task);
    }

    let mut order = Vec::new();
    visit(target, &mut order);
    order
}

/// Runs tasks against one project.
///
/// Owns the long-lived pieces: the highlighter (syntax definitions load
/// once), and in serve/watch mode the server thread and reload hub.
pub struct Runner {
    config: Config,
    highlighter: Highlighter,
    shutdown: Arc<AtomicBool>,
    reloader: Option<Reloader>,
    server: Option<JoinHandle<()>>,
}

impl Runner {
    /// `shutdown` stops the server and watch loops once set.
    pub fn new(config: Config, shutdown: Arc<AtomicBool>) -> Self {
        let highlighter = Highlighter::new(&config.highlight.class_prefix);
        Self {
            config,
            highlighter,
            shutdown,
            reloader: None,
            server: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn shutdown_flag(&self) -> &AtomicBool {
        &self.shutdown
    }

    /// Run `target` and everything it depends on. The first failure stops the run.
    ///
    /// `serve` blocks until shutdown; `watch` and `watch-styles` block in
    /// their watch loop.
    pub fn run(&mut self, target: Task) -> Result<(), TaskError> {
        for task in plan(target) {
            self.run_timed(task)?;
        }
        if target == Task::Serve {
            self.wait_for_server();
        }
        Ok(())
    }

    /// Run a batch of tasks after a change, then reload connected browsers.
    ///
    /// Failures are logged and the remaining tasks still run.
    pub fn rerun(&mut self, tasks: &BTreeSet<Task>) {
        let mut order: Vec<Task> = Vec::new();
        for &task in tasks {
            for step in plan(task) {
                if !order.contains(&step) {
                    order.push(step);
                }
            }
        }
        for task in order {
            if let Err(e) = self.run_timed(task) {
                crate::logger::log_error("task", &format!("'{}' failed", task.name()), &e);
            }
        }
        if let Some(reloader) = &self.reloader {
            reloader.broadcast();
        }
    }

    fn run_timed(&mut self, task: Task) -> Result<(), TaskError> {
        debug!("task"; "starting '{}'", task.name());
        let started = Instant::now();
        self.run_one(task)?;
        log!("task"; "finished '{}' after {} ms", task.name(), started.elapsed().as_millis());
        Ok(())
    }

    fn run_one(&mut self, task: Task) -> Result<(), TaskError> {
        let root = self.config.root.clone();
        match task {
            Task::Pages => {
                let report = pages::build_pages(&self.config, &self.highlighter)?;
                output::print_pages_report(&report, &root);
            }
            Task::CleanAssets => assets::clean_assets(&self.config)?,
            Task::Assets => {
                let report = assets::copy_assets(&self.config)?;
                output::print_assets_report(&report, &root);
            }
            Task::Styles => {
                let report = styles::compile_styles(&self.config)?;
                output::print_styles_report(&report, &root);
            }
            Task::Build => {}
            Task::Serve => self.start_server()?,
            Task::Watch => {
                watch::watch(self, WatchScope::All)?;
                self.wait_for_server();
            }
            Task::WatchStyles => watch::watch(self, WatchScope::Styles)?,
        }
        Ok(())
    }

    fn start_server(&mut self) -> Result<(), TaskError> {
        if self.server.is_some() {
            return Ok(());
        }
        let interface = serve::interface(&self.config)?;
        let reloader = Reloader::bind(
            interface,
            self.config.serve.reload_port,
            Arc::clone(&self.shutdown),
        )?;
        let server = PreviewServer::bind(&self.config, Some(reloader.port()))?;
        self.server = Some(server.spawn(Arc::clone(&self.shutdown)));
        self.reloader = Some(reloader);
        Ok(())
    }

    fn wait_for_server(&mut self) {
        if let Some(handle) = self.server.take()
            && handle.join().is_err()
        {
            log!("serve"; "server thread panicked");
        }
    }
}
