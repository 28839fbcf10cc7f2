/// Controller session: executes commands against a running host
use crate::commands::{Command, HELP};
use crate::error::{Result, SimError};
use crate::host::{ElementStatus, HostHandle, PageCommand, PageReport};
use mediamix_controller::{ChannelTransport, ControllerView, MixerClient, Transport};
use mediamix_engine::{Notification, Request, Settings};
use serde_json::{Number, Value};
use std::fmt::Write;
use tokio::sync::mpsc;

/// Outcome of one command
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Output(String),
    Quit,
}

pub struct Session {
    client: MixerClient<ChannelTransport>,
    host: HostHandle,
    notifications: mpsc::UnboundedReceiver<Notification>,
    view: ControllerView,
}

impl Session {
    /// Open the controller against a host, like the controller surface does
    /// when it is shown
    pub async fn open(
        transport: ChannelTransport,
        host: HostHandle,
        notifications: mpsc::UnboundedReceiver<Notification>,
    ) -> Result<Self> {
        let client = MixerClient::new(transport);
        let view = ControllerView::from_connect(client.connect().await)?;

        Ok(Self {
            client,
            host,
            notifications,
            view,
        })
    }

    pub fn view(&self) -> &ControllerView {
        &self.view
    }

    /// Apply pending notifications to the view, returning them
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut received = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            self.view.apply(&notification);
            received.push(notification);
        }
        received
    }

    pub async fn execute(&mut self, command: Command) -> Result<Outcome> {
        let output = match command {
            Command::Volume(raw) => self.update(raw, Request::UpdateVolume).await?,
            Command::Pan(raw) => self.update(raw, Request::UpdatePan).await?,
            Command::Speed(raw) => self.update(raw, Request::UpdateSpeed).await?,
            Command::Get => describe_settings(&self.client.get_settings().await?),
            Command::Ping => self.client.ping().await?,
            Command::Send(raw) => {
                let message: Value = serde_json::from_str(&raw)
                    .map_err(|e| SimError::Command(format!("invalid JSON: {}", e)))?;
                self.client.transport().send(message).await?.to_string()
            }
            Command::Add(kind) => self.page(PageCommand::Add(kind)).await?,
            Command::Frame(kind) => self.page(PageCommand::Frame(kind)).await?,
            Command::Remove(id) => self.page(PageCommand::Remove(id)).await?,
            Command::Refresh => self.page(PageCommand::Refresh).await?,
            Command::Status => self.page(PageCommand::Status).await?,
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Outcome::Quit),
        };

        Ok(Outcome::Output(output))
    }

    /// Send an update with the raw text as its value
    ///
    /// Finite numbers go out as JSON numbers, anything else as a string for
    /// the engine to normalize.
    async fn update(&self, raw: String, request: fn(Value) -> Request) -> Result<String> {
        let value = raw
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map_or(Value::String(raw), Value::Number);

        self.client.send_update(request(value)).await?;
        Ok("ok".to_string())
    }

    async fn page(&self, command: PageCommand) -> Result<String> {
        Ok(match self.host.page(command).await? {
            PageReport::Added(id) => format!("added {}", id),
            PageReport::Removed(Some(id)) => format!("removed {}", id),
            PageReport::Removed(None) => "no such element".to_string(),
            PageReport::Refreshed { attached } => format!("attached {} element(s)", attached),
            PageReport::Status(elements) => describe_elements(&elements),
        })
    }

    /// Stop the host and wait for it
    pub fn close(self) -> Result<()> {
        drop(self.client);
        self.host.join()
    }
}

pub fn describe_settings(settings: &Settings) -> String {
    format!(
        "volume {:.2} ({}%), pan {:+.2}, speed {:.2} ({}%)",
        settings.volume(),
        (settings.volume() * 100.0).round(),
        settings.pan(),
        settings.speed(),
        (settings.speed() * 100.0).round()
    )
}

pub fn describe_view(view: &ControllerView) -> String {
    match (view.panel(), view.error_message()) {
        (Some(panel), _) => format!(
            "volume {}% | pan {:+.2} | speed {}%",
            panel.volume_percent(),
            panel.pan,
            panel.speed_percent()
        ),
        (None, Some(message)) => message.to_string(),
        (None, None) => String::new(),
    }
}

fn describe_elements(elements: &[ElementStatus]) -> String {
    let mut out = String::new();
    for element in elements {
        let gain = element
            .gain
            .map_or_else(|| "-".to_string(), |g| format!("{:.2}", g));
        let pan = element
            .pan
            .map_or_else(|| "-".to_string(), |p| format!("{:+.2}", p));

        let _ = writeln!(
            out,
            "{:>4} {:<5} {:<5} {:<8} {:<9} gain {:>5} pan {:>5} rate {:.2}",
            element.id.to_string(),
            element.kind.tag_name(),
            if element.in_frame { "frame" } else { "page" },
            if element.in_document { "present" } else { "removed" },
            if element.tracked { "tracked" } else { "untracked" },
            gain,
            pan,
            element.playback_rate
        );
    }

    if out.is_empty() {
        out.push_str("page has no media elements");
    }
    out.trim_end().to_string()
}
