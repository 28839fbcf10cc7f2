/// Engine host thread
///
/// The engine is single-threaded (`Rc` all the way down), so it lives on a
/// dedicated thread together with its in-memory page. The rest of the
/// application talks to it through the controller's channel transport and
/// a second channel for page manipulation.
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use mediamix_controller::{ChannelTransport, EngineCall};
use mediamix_engine::headless::{HeadlessContext, HeadlessDocument, HeadlessElement};
use mediamix_engine::{ElementId, MediaElement, MediaKind, MixerEndpoint, Notification};
use serde::Serialize;
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Change to (or question about) the simulated page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCommand {
    Add(MediaKind),
    Frame(MediaKind),
    Remove(ElementId),
    /// Attach new elements without waiting for a request
    Refresh,
    Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementStatus {
    pub id: ElementId,
    pub kind: MediaKind,
    pub in_frame: bool,
    pub in_document: bool,
    pub tracked: bool,
    pub gain: Option<f32>,
    pub pan: Option<f32>,
    pub playback_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageReport {
    Added(ElementId),
    Removed(Option<ElementId>),
    Refreshed { attached: usize },
    Status(Vec<ElementStatus>),
}

struct PageRequest {
    command: PageCommand,
    reply: oneshot::Sender<PageReport>,
}

struct PageElement {
    element: HeadlessElement,
    in_frame: bool,
}

/// The engine and the page it drives
pub struct EngineHost {
    document: HeadlessDocument,
    elements: Vec<PageElement>,
    engine: MixerEndpoint<HeadlessDocument, HeadlessContext>,
}

impl EngineHost {
    /// Build the startup page and an engine over it
    pub fn new(config: &SimConfig, notifications: mpsc::UnboundedSender<Notification>) -> Self {
        let document = HeadlessDocument::new();
        let mut engine = MixerEndpoint::new(
            document.clone(),
            || Ok(HeadlessContext::new()),
            config.engine.clone(),
        );
        engine.set_notifier(move |notification| {
            if notifications.send(*notification).is_err() {
                debug!("Controller stopped listening for notifications");
            }
        });

        let mut host = Self {
            document,
            elements: Vec::new(),
            engine,
        };

        for _ in 0..config.page.audio_elements {
            host.handle_page(PageCommand::Add(MediaKind::Audio));
        }
        for _ in 0..config.page.video_elements {
            host.handle_page(PageCommand::Add(MediaKind::Video));
        }
        for _ in 0..config.page.frames {
            host.handle_page(PageCommand::Frame(MediaKind::Video));
        }

        info!(elements = host.elements.len(), "Simulated page ready");
        host
    }

    /// Answer one controller request
    ///
    /// Requests the engine does not answer are dropped, which the
    /// controller sees as a connection failure.
    pub fn handle_call(&mut self, call: EngineCall) {
        match self.engine.handle_message(&call.message) {
            Ok(Some(reply)) => call.reply(reply),
            Ok(None) => debug!(message = %call.message, "Request left unanswered"),
            Err(e) => warn!(error = %e, "Request failed"),
        }
    }

    pub fn handle_page(&mut self, command: PageCommand) -> PageReport {
        match command {
            PageCommand::Add(kind) => {
                let element = self.document.add_element(kind);
                self.track(element, false)
            }
            PageCommand::Frame(kind) => {
                let element = self.document.add_frame().add_element(kind);
                self.track(element, true)
            }
            PageCommand::Remove(id) => {
                let removed = self.document.remove_element(id).map(|element| element.id());
                PageReport::Removed(removed)
            }
            PageCommand::Refresh => PageReport::Refreshed {
                attached: self.engine.refresh(),
            },
            PageCommand::Status => PageReport::Status(self.status()),
        }
    }

    fn track(&mut self, element: HeadlessElement, in_frame: bool) -> PageReport {
        let id = element.id();
        debug!(element = %id, kind = ?element.kind(), in_frame, "Added element to page");
        self.elements.push(PageElement { element, in_frame });
        PageReport::Added(id)
    }

    pub fn status(&self) -> Vec<ElementStatus> {
        self.elements
            .iter()
            .map(|PageElement { element, in_frame }| ElementStatus {
                id: element.id(),
                kind: element.kind(),
                in_frame: *in_frame,
                in_document: element.in_document(),
                tracked: self.engine.graph().is_tracked(element.id()),
                gain: element.gain(),
                pan: element.pan(),
                playback_rate: element.playback_rate(),
            })
            .collect()
    }
}

/// Application-side handle of a running [`EngineHost`]
pub struct HostHandle {
    page: mpsc::Sender<PageRequest>,
    thread: JoinHandle<()>,
}

impl HostHandle {
    pub async fn page(&self, command: PageCommand) -> Result<PageReport> {
        let (reply, report) = oneshot::channel();
        self.page
            .send(PageRequest { command, reply })
            .await
            .map_err(|_| SimError::HostStopped)?;
        report.await.map_err(|_| SimError::HostStopped)
    }

    /// Wait for the host thread after every sender has been dropped
    pub fn join(self) -> Result<()> {
        drop(self.page);
        self.thread.join().map_err(|_| SimError::HostStopped)
    }
}

/// Start the engine host thread
///
/// Returns the controller transport, the host handle and the notification
/// stream.
pub fn spawn(
    config: &SimConfig,
) -> Result<(
    ChannelTransport,
    HostHandle,
    mpsc::UnboundedReceiver<Notification>,
)> {
    let capacity = config.page.channel_capacity;
    let (transport, calls) = ChannelTransport::new(capacity);
    let (page, page_requests) = mpsc::channel(capacity.max(1));
    let (notify_tx, notify_rx) = mpsc::unbounded_channel();
    let config = config.clone();

    let thread = thread::Builder::new()
        .name("mediamix-engine".to_string())
        .spawn(move || run(&config, calls, page_requests, notify_tx))?;

    Ok((transport, HostHandle { page, thread }, notify_rx))
}

fn run(
    config: &SimConfig,
    mut calls: mpsc::Receiver<EngineCall>,
    mut page_requests: mpsc::Receiver<PageRequest>,
    notifications: mpsc::UnboundedSender<Notification>,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start engine host runtime");
            return;
        }
    };

    let mut host = EngineHost::new(config, notifications);

    runtime.block_on(async move {
        loop {
            tokio::select! {
                call = calls.recv() => match call {
                    Some(call) => host.handle_call(call),
                    None => break,
                },
                request = page_requests.recv() => match request {
                    Some(PageRequest { command, reply }) => {
                        let _ = reply.send(host.handle_page(command));
                    }
                    None => break,
                },
            }
        }
    });

    info!("Engine host stopped");
}
