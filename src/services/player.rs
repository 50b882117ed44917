//! Seeking the video player on the host page.

use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

use crate::utils::video_url::watch_url_at;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

#[derive(Debug)]
pub struct PlayerError(pub String);

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for PlayerError {}

/// The page's own player object, with its seek-and-play entry point.
pub trait NativePlayer: Send {
    fn seek_to(&mut self, seconds: f64, allow_seek_ahead: bool) -> Result<(), PlayerError>;
    fn state(&self) -> PlayerState;
    fn play(&mut self) -> Result<(), PlayerError>;
}

/// The bare media element underneath the player.
pub trait MediaElement: Send {
    fn set_current_time(&mut self, seconds: f64) -> Result<(), PlayerError>;
    fn is_paused(&self) -> bool;
    fn play(&mut self) -> Result<(), PlayerError>;
}

/// A page that can hand out its player and media element.
pub trait PlayerHost: Send {
    fn find_player(&mut self) -> Option<Box<dyn NativePlayer>>;
    fn find_media_element(&mut self) -> Option<Box<dyn MediaElement>>;
}

/// Seek capability offered to the rest of the relay.
pub trait PlayerControl {
    fn seek_to(&mut self, seconds: f64) -> bool;
}

pub struct PlayerController<H: PlayerHost> {
    host: H,
    player: Option<Box<dyn NativePlayer>>,
}

impl<H: PlayerHost> PlayerController<H> {
    pub fn new(host: H) -> Self {
        Self { host, player: None }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Forget the player after a same-page navigation; it may be detached now.
    pub fn on_navigate(&mut self) {
        debug!("Navigation detected, dropping player reference");
        self.player = None;
    }

    fn seek_native(&mut self, seconds: f64) -> Result<bool, PlayerError> {
        if self.player.is_none() {
            self.player = self.host.find_player();
        }
        let Some(player) = self.player.as_mut() else {
            return Ok(false);
        };
        player.seek_to(seconds, true)?;
        if player.state() != PlayerState::Playing {
            player.play()?;
        }
        Ok(true)
    }

    fn seek_media(&mut self, seconds: f64) -> Result<bool, PlayerError> {
        let Some(mut media) = self.host.find_media_element() else {
            return Ok(false);
        };
        media.set_current_time(seconds)?;
        if media.is_paused() {
            media.play()?;
        }
        Ok(true)
    }
}

impl<H: PlayerHost> PlayerControl for PlayerController<H> {
    fn seek_to(&mut self, seconds: f64) -> bool {
        if !seconds.is_finite() || seconds < 0.0 {
            warn!("Refusing to seek to {}", seconds);
            return false;
        }

        match self.seek_native(seconds) {
            Ok(true) => {
                info!("Seeked to {}s using the player API", seconds);
                return true;
            }
            Ok(false) => debug!("Player API not found, trying the media element"),
            Err(e) => {
                warn!("Player API seek failed: {}", e);
                self.player = None;
            }
        }

        match self.seek_media(seconds) {
            Ok(true) => {
                info!("Seeked to {}s using the media element", seconds);
                true
            }
            Ok(false) => {
                error!("No player found");
                false
            }
            Err(e) => {
                error!("Media element seek failed: {}", e);
                false
            }
        }
    }
}

/// Terminal host: "seeking" prints a link that opens the video at that offset.
pub struct DeepLinkHost {
    video_id: Option<String>,
    last_link: Arc<Mutex<Option<String>>>,
}

impl DeepLinkHost {
    pub fn new() -> Self {
        Self {
            video_id: None,
            last_link: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set_video(&mut self, video_id: Option<String>) {
        self.video_id = video_id;
    }

    pub fn last_link(&self) -> Option<String> {
        self.last_link.lock().ok().and_then(|l| l.clone())
    }
}

impl Default for DeepLinkHost {
    fn default() -> Self {
        Self::new()
    }
}

struct DeepLinkPlayer {
    video_id: String,
    last_link: Arc<Mutex<Option<String>>>,
}

impl NativePlayer for DeepLinkPlayer {
    fn seek_to(&mut self, seconds: f64, _allow_seek_ahead: bool) -> Result<(), PlayerError> {
        let link = watch_url_at(&self.video_id, seconds);
        println!("{}", link);
        let mut last = self
            .last_link
            .lock()
            .map_err(|_| PlayerError("link sink poisoned".to_string()))?;
        *last = Some(link);
        Ok(())
    }

    fn state(&self) -> PlayerState {
        PlayerState::Playing
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        Ok(())
    }
}

impl PlayerHost for DeepLinkHost {
    fn find_player(&mut self) -> Option<Box<dyn NativePlayer>> {
        let video_id = self.video_id.clone()?;
        Some(Box::new(DeepLinkPlayer {
            video_id,
            last_link: Arc::clone(&self.last_link),
        }))
    }

    fn find_media_element(&mut self) -> Option<Box<dyn MediaElement>> {
        None
    }
}
