//! Async runtime for the subtitle controller
//!
//! A single tokio task owns the controller. Host commands, the native poll
//! interval and the live reload timer all feed one `select!` loop, so each
//! reaction runs to completion before the next one starts.

use std::future;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::config::SubtitleConfig;
use crate::controller::SubtitleTrackController;
use crate::error::{Result, SubtitleError};
use crate::events::{EventSink, PlayerEvent};
use crate::native::TextTrackSurface;
use crate::scheduler::TimerState;
use crate::types::Track;

/// Messages handled by the controller task
pub enum Command {
    Event(PlayerEvent),
    AttachMedia(Box<dyn TextTrackSurface>),
    DetachMedia,
    SetTrack(Option<usize>),
    SetTracks(Vec<Track>),
    SetDisplay(bool),
    GetTrack(oneshot::Sender<Option<usize>>),
    GetTracks(oneshot::Sender<Vec<Track>>),
    Shutdown(oneshot::Sender<()>),
}

pub struct SubtitleService;

impl SubtitleService {
    /// Start the controller task and return a handle to it
    pub fn spawn<E>(config: SubtitleConfig, sink: E) -> SubtitleHandle
    where
        E: EventSink + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(64);
        let controller = SubtitleTrackController::new(config, sink, TimerState::default());
        let task = tokio::spawn(run(controller, rx));
        SubtitleHandle { tx, task: Some(task) }
    }
}

async fn run<E: EventSink>(
    mut controller: SubtitleTrackController<E, TimerState>,
    mut rx: mpsc::Receiver<Command>,
) {
    tracing::debug!("Subtitle controller task started");

    let mut poll: Option<Interval> = None;
    let mut poll_epoch = controller.scheduler().poll_epoch();

    loop {
        let reload_at = {
            let timers = controller.scheduler();
            if timers.poll_epoch() != poll_epoch {
                poll_epoch = timers.poll_epoch();
                poll = timers.poll_every().map(|every| {
                    let mut interval = time::interval_at(Instant::now() + every, every);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    interval
                });
            }
            timers.reload_deadline()
        };

        tokio::select! {
            biased;

            cmd = rx.recv() => {
                match cmd {
                    Some(Command::Shutdown(done)) => {
                        let _ = done.send(());
                        break;
                    }
                    Some(cmd) => apply(&mut controller, cmd),
                    None => break,
                }
            }
            _ = next_tick(&mut poll) => controller.poll_text_tracks(),
            _ = deadline(reload_at) => controller.reload_timer_fired(),
        }
    }

    if controller.is_media_attached() {
        controller.detach_media();
    }
    tracing::debug!("Subtitle controller task stopped");
}

fn apply<E: EventSink>(controller: &mut SubtitleTrackController<E, TimerState>, cmd: Command) {
    match cmd {
        Command::Event(event) => controller.handle(event),
        Command::AttachMedia(surface) => controller.attach_media(surface),
        Command::DetachMedia => {
            controller.detach_media();
        }
        Command::SetTrack(id) => controller.set_track(id),
        Command::SetTracks(tracks) => controller.set_tracks(tracks),
        Command::SetDisplay(display) => controller.set_display(display),
        Command::GetTrack(reply) => {
            let _ = reply.send(controller.track());
        }
        Command::GetTracks(reply) => {
            let _ = reply.send(controller.tracks());
        }
        Command::Shutdown(_) => {}
    }
}

async fn next_tick(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending().await,
    }
}

async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => time::sleep_until(at).await,
        None => future::pending().await,
    }
}

/// Handle to a running [`SubtitleService`]
pub struct SubtitleHandle {
    tx: mpsc::Sender<Command>,
    task: Option<JoinHandle<()>>,
}

impl SubtitleHandle {
    async fn command(&self, cmd: Command) -> Result<()> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| SubtitleError::ServiceStopped)
    }

    async fn request<T>(&self, cmd: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.command(cmd(reply)).await?;
        rx.await.map_err(|_| SubtitleError::ServiceStopped)
    }

    /// Forward a player event
    pub async fn send(&self, event: PlayerEvent) -> Result<()> {
        self.command(Command::Event(event)).await
    }

    pub async fn attach_media(&self, surface: Box<dyn TextTrackSurface>) -> Result<()> {
        self.command(Command::AttachMedia(surface)).await
    }

    pub async fn detach_media(&self) -> Result<()> {
        self.command(Command::DetachMedia).await
    }

    pub async fn set_track(&self, id: Option<usize>) -> Result<()> {
        self.command(Command::SetTrack(id)).await
    }

    pub async fn set_tracks(&self, tracks: Vec<Track>) -> Result<()> {
        self.command(Command::SetTracks(tracks)).await
    }

    pub async fn set_display(&self, display: bool) -> Result<()> {
        self.command(Command::SetDisplay(display)).await
    }

    /// Currently selected track id
    pub async fn track(&self) -> Result<Option<usize>> {
        self.request(Command::GetTrack).await
    }

    /// Tracks of the active group
    pub async fn tracks(&self) -> Result<Vec<Track>> {
        self.request(Command::GetTracks).await
    }

    /// Stop the controller task, detaching media first, and wait for it.
    pub async fn shutdown(mut self) -> Result<()> {
        self.request(Command::Shutdown).await?;
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Subtitle controller task failed: {}", e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::events::{EventEmitter, SubtitleEvent};
    use crate::native::{MemorySurface, NativeTextTrack, TextTrackKind, TextTrackMode};
    use crate::types::PlaylistDetails;
    use tokio::sync::broadcast;

    fn track(id: usize, name: &str, default: bool) -> Track {
        Track {
            id,
            group_id: "subs".to_string(),
            name: name.to_string(),
            url: format!("https://cdn.example.com/subs/{}.m3u8", id),
            default,
            ..Default::default()
        }
    }

    fn native(label: &str) -> NativeTextTrack {
        NativeTextTrack::new(TextTrackKind::Subtitles, label, "en")
    }

    fn drain(rx: &mut broadcast::Receiver<SubtitleEvent>) -> Vec<SubtitleEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_picks_up_native_toggle() {
        let emitter = EventEmitter::new();
        let mut rx = emitter.subscribe();
        let handle = SubtitleService::spawn(SubtitleConfig::default(), emitter);

        let surface = MemorySurface::new(vec![native("English"), native("Deutsch")], false);
        handle.attach_media(Box::new(surface.clone())).await.unwrap();
        handle
            .set_tracks(vec![track(0, "English", false), track(1, "Deutsch", false)])
            .await
            .unwrap();
        assert_eq!(handle.track().await.unwrap(), None);

        let mut host = surface.clone();
        host.set_mode(0, TextTrackMode::Showing);
        time::sleep(Duration::from_millis(600)).await;

        assert_eq!(handle.track().await.unwrap(), Some(0));
        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, SubtitleEvent::TrackSwitch { id: Some(0), .. })));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_playlist_reloads_on_timer() {
        let emitter = EventEmitter::new();
        let mut rx = emitter.subscribe();
        let handle = SubtitleService::spawn(SubtitleConfig::default(), emitter);

        handle
            .attach_media(Box::new(MemorySurface::new(vec![native("English")], true)))
            .await
            .unwrap();
        handle.set_tracks(vec![track(0, "English", true)]).await.unwrap();
        assert_eq!(handle.track().await.unwrap(), Some(0));
        drain(&mut rx);

        let details = PlaylistDetails {
            url: "https://cdn.example.com/subs/0.m3u8".to_string(),
            live: true,
            updated: true,
            target_duration: 2.0,
            ..Default::default()
        };
        handle
            .send(PlayerEvent::TrackLoaded {
                id: 0,
                group_id: None,
                details,
            })
            .await
            .unwrap();
        handle.track().await.unwrap();
        assert!(drain(&mut rx).is_empty());

        time::sleep(Duration::from_millis(2100)).await;
        handle.track().await.unwrap();
        let events = drain(&mut rx);
        assert!(matches!(
            &events[..],
            [SubtitleEvent::TrackLoading { id: 0, delivery_directives: None, .. }]
        ));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_stopped_service_reports_error() {
        let handle = SubtitleService::spawn(SubtitleConfig::default(), EventEmitter::new());
        let tx = handle.tx.clone();
        handle.shutdown().await.unwrap();

        let stale = SubtitleHandle { tx, task: None };
        let err = stale.track().await.unwrap_err();
        assert!(matches!(err, SubtitleError::ServiceStopped));
    }
}
