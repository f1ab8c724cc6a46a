//! Outstream video renderer.
//!
//! A [`Renderer`] is attached to a video bid and invoked by the host when the
//! ad slot paints. Work is expressed as queued commands: until the host marks
//! the player script as loaded, [`Renderer::push`] only queues; once loaded,
//! queued commands run in order and later pushes run immediately.
//!
//! The player SDK itself is an injected [`VastPlayer`] so renderers never
//! depend on a page-global object.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::bidder::NormalizedBid;
use crate::error::AdapterError;

/// Options passed to the player SDK's `init` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VastPlayerOptions {
    pub vast_tag: String,
    /// Id of the element the video renders into
    pub ad_unit_code: String,
    pub progress: bool,
    #[serde(rename = "loop")]
    pub loop_playback: bool,
    pub inread: bool,
}

/// Video player SDK exposed by the host page.
pub trait VastPlayer: Send + Sync {
    fn init(&self, options: VastPlayerOptions);
}

/// Parameters for [`Renderer::install`].
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub id: String,
    /// Player script URL
    pub url: String,
    pub loaded: bool,
}

type RenderFn = dyn Fn(&Renderer, &NormalizedBid) + Send + Sync;
type Command = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct RendererState {
    loaded: bool,
    render: Option<Arc<RenderFn>>,
    queue: Vec<Command>,
}

/// Renderer installed on a bid, keyed by id and player URL.
pub struct Renderer {
    id: String,
    url: String,
    state: Mutex<RendererState>,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Install a renderer for the given player script.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Renderer`] when the player URL is empty.
    pub fn install(config: RendererConfig) -> Result<Self, Report<AdapterError>> {
        let url = config.url.trim();
        if url.is_empty() {
            return Err(Report::new(AdapterError::Renderer {
                message: format!("player script unavailable for renderer {}", config.id),
            }));
        }
        let url = url.to_string();

        Ok(Self {
            id: config.id,
            url,
            state: Mutex::new(RendererState {
                loaded: config.loaded,
                ..RendererState::default()
            }),
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.lock().map(|state| state.loaded).unwrap_or(false)
    }

    /// Number of commands waiting for the player script.
    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.lock().map(|state| state.queue.len()).unwrap_or(0)
    }

    /// Bind the callback the host invokes through [`Renderer::render`].
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Renderer`] if the renderer state is poisoned.
    pub fn set_render<F>(&self, render: F) -> Result<(), Report<AdapterError>>
    where
        F: Fn(&Renderer, &NormalizedBid) + Send + Sync + 'static,
    {
        let mut state = self.lock()?;
        state.render = Some(Arc::new(render));
        Ok(())
    }

    /// Render `bid` with the bound callback.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Renderer`] when no callback is bound.
    pub fn render(&self, bid: &NormalizedBid) -> Result<(), Report<AdapterError>> {
        let render = self.lock()?.render.clone().ok_or_else(|| {
            Report::new(AdapterError::Renderer {
                message: format!("no render callback set on renderer {}", self.id),
            })
        })?;
        render(self, bid);
        Ok(())
    }

    /// Run `command` now if the player is loaded, otherwise queue it.
    pub fn push<F>(&self, command: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self.lock() {
            Ok(mut state) if !state.loaded => {
                state.queue.push(Box::new(command));
            }
            Ok(state) => {
                drop(state);
                command();
            }
            Err(e) => {
                log::warn!("Dropping renderer command: {:?}", e);
            }
        }
    }

    /// Mark the player script as loaded and flush queued commands in order.
    pub fn mark_loaded(&self) {
        let queued = match self.lock() {
            Ok(mut state) => {
                state.loaded = true;
                std::mem::take(&mut state.queue)
            }
            Err(e) => {
                log::warn!("Cannot mark renderer loaded: {:?}", e);
                return;
            }
        };

        log::debug!(
            "Renderer {}: running {} queued commands",
            self.id,
            queued.len()
        );
        for command in queued {
            command();
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, RendererState>, Report<AdapterError>> {
        self.state.lock().map_err(|_| {
            Report::new(AdapterError::Renderer {
                message: format!("renderer {} state poisoned", self.id),
            })
        })
    }
}
