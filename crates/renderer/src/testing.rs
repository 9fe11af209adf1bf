//! Headless stand-ins for the GPU and the frame clock.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::canvas::ShaderCanvas;
use crate::gl::GlBackend;
use crate::runtime::{FrameHost, FrameOutcome, FrameRequest, FrameToken};

pub use crate::gl::recording::{GlCall, RecordedUniform, RecordingGl};

/// Frame host whose queue is drained by hand.
#[derive(Debug, Default)]
pub struct ManualFrameHost {
    next_request: u64,
    queue: VecDeque<(FrameRequest, FrameToken)>,
    cancellations: usize,
}

impl ManualFrameHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens waiting to fire, oldest first.
    pub fn queued(&self) -> Vec<FrameToken> {
        self.queue.iter().map(|(_, token)| *token).collect()
    }

    /// Removes the next due frame.
    pub fn pop(&mut self) -> Option<FrameToken> {
        self.queue.pop_front().map(|(_, token)| token)
    }

    pub fn cancellations(&self) -> usize {
        self.cancellations
    }
}

impl FrameHost for ManualFrameHost {
    fn request_frame(&mut self, token: FrameToken) -> FrameRequest {
        self.next_request += 1;
        let request = FrameRequest(self.next_request);
        self.queue.push_back((request, token));
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.cancellations += 1;
        self.queue.retain(|(queued, _)| *queued != request);
    }
}

/// Fires up to `count` queued frames, the n-th one at `start + step * n`.
pub fn run_frames<B: GlBackend>(
    canvas: &mut ShaderCanvas<B, ManualFrameHost>,
    count: usize,
    start: Instant,
    step: Duration,
) -> Vec<FrameOutcome> {
    let mut outcomes = Vec::with_capacity(count);
    for index in 1..=count {
        let Some(token) = canvas.host_mut().pop() else {
            break;
        };
        let now = start + step * index as u32;
        outcomes.push(canvas.fire_frame(token, now));
    }
    outcomes
}
