//! Idle / in-progress bookkeeping for the frame loop.
//!
//! [`FrameState`] holds no GPU objects, so the ordering rules of
//! [`FrameRenderer`](crate::FrameRenderer) are enforced (and tested) here.

use lumen_rhi::swapchain::MAX_FRAMES_IN_FLIGHT;

#[derive(Debug)]
pub struct FrameState {
    frame_index: usize,
    image_index: u32,
    in_progress: bool,
}

impl Default for FrameState {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameState {
    pub fn new() -> Self {
        Self {
            frame_index: 0,
            image_index: 0,
            in_progress: false,
        }
    }

    /// Enters the in-progress state for swapchain image `image_index`.
    ///
    /// # Panics
    ///
    /// If a frame is already in progress.
    pub fn begin(&mut self, image_index: u32) {
        assert!(
            !self.in_progress,
            "cannot begin a frame while one is already in progress"
        );
        self.image_index = image_index;
        self.in_progress = true;
    }

    /// Returns to idle and advances the frame-in-flight slot.
    ///
    /// # Panics
    ///
    /// If no frame is in progress.
    pub fn end(&mut self) {
        assert!(
            self.in_progress,
            "cannot end a frame that has not been begun"
        );
        self.in_progress = false;
        self.frame_index = (self.frame_index + 1) % MAX_FRAMES_IN_FLIGHT;
    }

    #[inline]
    pub fn is_frame_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Slot the next (or current) frame uses, valid in either state.
    #[inline]
    pub fn slot(&self) -> usize {
        self.frame_index
    }

    /// # Panics
    ///
    /// If no frame is in progress.
    pub fn frame_index(&self) -> usize {
        assert!(
            self.in_progress,
            "cannot get frame index when no frame is in progress"
        );
        self.frame_index
    }

    /// # Panics
    ///
    /// If no frame is in progress.
    pub fn image_index(&self) -> u32 {
        assert!(
            self.in_progress,
            "cannot get image index when no frame is in progress"
        );
        self.image_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle_at_slot_zero() {
        let state = FrameState::new();
        assert!(!state.is_frame_in_progress());
        assert_eq!(state.slot(), 0);
    }

    #[test]
    fn test_begin_end_round_trip() {
        let mut state = FrameState::new();
        state.begin(2);
        assert!(state.is_frame_in_progress());
        assert_eq!(state.frame_index(), 0);
        assert_eq!(state.image_index(), 2);

        state.end();
        assert!(!state.is_frame_in_progress());
        assert_eq!(state.slot(), 1 % MAX_FRAMES_IN_FLIGHT);
    }

    #[test]
    #[should_panic(expected = "already in progress")]
    fn test_double_begin_panics() {
        let mut state = FrameState::new();
        state.begin(0);
        state.begin(1);
    }

    #[test]
    #[should_panic(expected = "has not been begun")]
    fn test_end_without_begin_panics() {
        FrameState::new().end();
    }

    #[test]
    #[should_panic(expected = "no frame is in progress")]
    fn test_frame_index_outside_frame_panics() {
        FrameState::new().frame_index();
    }
}
