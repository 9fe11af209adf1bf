//! Frame scheduling for the active program.
//!
//! The loop never owns a timer or a thread. It asks a [`FrameHost`] for one
//! frame at a time, and the host hands the matching [`FrameToken`] back when
//! the frame is due. Every start or cancel bumps the loop generation, so a token
//! captured before a rebuild can never draw with resources installed after it.

use std::time::Instant;

use tracing::trace;

use crate::compile::GpuProgram;
use crate::gl::GlBackend;
use crate::types::QUAD_VERTEX_COUNT;

/// Identifies one requested frame of one loop generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken {
    generation: u64,
    frame: u64,
}

impl FrameToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }
}

/// Host-side handle for a queued frame, used to revoke it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Provides the "call me on the next frame" primitive.
///
/// Hosts queue at most the frames they are asked for and deliver each token
/// back to [`ShaderCanvas::fire_frame`](crate::ShaderCanvas::fire_frame).
pub trait FrameHost {
    fn request_frame(&mut self, token: FrameToken) -> FrameRequest;
    /// Revokes a queued frame. Must tolerate requests that already fired.
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Snapshot of the time state supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Seconds since the program was installed.
    pub seconds: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Scheduled,
    Cancelled,
}

/// Outcome of handing a token to the loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Drawn(TimeSample),
    /// The token belonged to a cancelled or superseded loop, or was already
    /// consumed; nothing was touched.
    Stale,
}

#[derive(Debug)]
struct RenderSession {
    started_at: Instant,
    pending: Option<(FrameToken, FrameRequest)>,
}

/// Stopped → Scheduled → (frame) → Scheduled → … → Cancelled.
#[derive(Debug)]
pub struct RenderLoop {
    generation: u64,
    state: LoopState,
    session: Option<RenderSession>,
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self {
            generation: 0,
            state: LoopState::Stopped,
            session: None,
        }
    }
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn started_at(&self) -> Option<Instant> {
        self.session.as_ref().map(|session| session.started_at)
    }

    /// Token of the frame currently queued with the host, if any.
    pub fn pending(&self) -> Option<FrameToken> {
        self.session
            .as_ref()
            .and_then(|session| session.pending)
            .map(|(token, _)| token)
    }

    /// Starts a fresh session timed from `started_at` and queues its first
    /// frame. A running session is cancelled first.
    pub fn start<H: FrameHost>(&mut self, host: &mut H, started_at: Instant) -> FrameToken {
        self.cancel(host);
        self.generation += 1;
        let token = FrameToken {
            generation: self.generation,
            frame: 0,
        };
        let request = host.request_frame(token);
        self.session = Some(RenderSession {
            started_at,
            pending: Some((token, request)),
        });
        self.state = LoopState::Scheduled;
        trace!(generation = self.generation, "render loop started");
        token
    }

    /// Revokes the queued frame and stops the loop. Returns whether a running
    /// loop was stopped; repeated calls are no-ops.
    pub fn cancel<H: FrameHost>(&mut self, host: &mut H) -> bool {
        if let Some(session) = self.session.take() {
            if let Some((_, request)) = session.pending {
                host.cancel_frame(request);
            }
        }
        if self.state != LoopState::Scheduled {
            return false;
        }
        // Any token still in flight now refers to a dead generation.
        self.generation += 1;
        self.state = LoopState::Cancelled;
        trace!(generation = self.generation, "render loop cancelled");
        true
    }

    pub fn is_live(&self, token: FrameToken) -> bool {
        self.state == LoopState::Scheduled && self.pending() == Some(token)
    }

    /// Runs one frame for `token` if it is the live pending frame: clears the
    /// target, activates `program`, uploads elapsed seconds, draws the quad as
    /// a triangle strip, and queues the next frame.
    #[allow(clippy::too_many_arguments)]
    pub fn fire<B: GlBackend, H: FrameHost>(
        &mut self,
        token: FrameToken,
        now: Instant,
        gl: &mut B,
        host: &mut H,
        program: &GpuProgram<B>,
        quad: B::Quad,
        clear_color: [f32; 4],
    ) -> FrameOutcome {
        if !self.is_live(token) {
            trace!(?token, generation = self.generation, "discarding stale frame");
            return FrameOutcome::Stale;
        }
        let Some(session) = self.session.as_mut() else {
            return FrameOutcome::Stale;
        };
        session.pending = None;
        let elapsed = now.saturating_duration_since(session.started_at);
        let sample = TimeSample::new(elapsed.as_secs_f32(), token.frame);

        gl.clear(clear_color);
        gl.use_program(Some(program.handle()));
        if let Some(location) = program.time_uniform() {
            gl.uniform_f32(location, sample.seconds);
        }
        gl.bind_quad(quad);
        gl.draw_triangle_strip(0, QUAD_VERTEX_COUNT);

        let next = FrameToken {
            generation: token.generation,
            frame: token.frame + 1,
        };
        let request = host.request_frame(next);
        session.pending = Some((next, request));
        FrameOutcome::Drawn(sample)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::ManualFrameHost;

    #[test]
    fn start_queues_first_frame() {
        let mut host = ManualFrameHost::new();
        let mut render_loop = RenderLoop::new();
        assert_eq!(render_loop.state(), LoopState::Stopped);

        let now = Instant::now();
        let token = render_loop.start(&mut host, now);
        assert_eq!(render_loop.state(), LoopState::Scheduled);
        assert_eq!(render_loop.pending(), Some(token));
        assert_eq!(render_loop.started_at(), Some(now));
        assert_eq!(host.queued(), vec![token]);
    }

    #[test]
    fn cancel_is_idempotent_and_invalidates_tokens() {
        let mut host = ManualFrameHost::new();
        let mut render_loop = RenderLoop::new();
        let token = render_loop.start(&mut host, Instant::now());

        assert!(render_loop.cancel(&mut host));
        assert!(!render_loop.cancel(&mut host));
        assert_eq!(render_loop.state(), LoopState::Cancelled);
        assert!(host.queued().is_empty());
        assert!(!render_loop.is_live(token));
    }

    #[test]
    fn restart_bumps_generation() {
        let mut host = ManualFrameHost::new();
        let mut render_loop = RenderLoop::new();
        let first = render_loop.start(&mut host, Instant::now());
        let second = render_loop.start(&mut host, Instant::now() + Duration::from_secs(1));

        assert!(second.generation() > first.generation());
        assert!(!render_loop.is_live(first));
        assert!(render_loop.is_live(second));
        assert_eq!(host.queued(), vec![second]);
    }
}
