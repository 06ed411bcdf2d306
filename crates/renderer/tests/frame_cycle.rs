//! Frame slot cycling of the frame loop bookkeeping.

use lumen_renderer::{FrameState, MAX_FRAMES_IN_FLIGHT};

#[test]
fn test_slot_after_n_frames_wraps() {
    let mut state = FrameState::new();
    for n in 0..(3 * MAX_FRAMES_IN_FLIGHT + 1) {
        assert_eq!(state.slot(), n % MAX_FRAMES_IN_FLIGHT);
        state.begin((n % 3) as u32);
        assert_eq!(state.frame_index(), n % MAX_FRAMES_IN_FLIGHT);
        state.end();
    }
}

#[test]
fn test_image_index_is_independent_of_slot() {
    let mut state = FrameState::new();
    state.begin(2);
    assert_eq!(state.image_index(), 2);
    assert_eq!(state.frame_index(), 0);
    state.end();
    assert!(!state.is_frame_in_progress());
}

#[test]
#[should_panic(expected = "cannot begin a frame while one is already in progress")]
fn test_begin_twice_panics() {
    let mut state = FrameState::new();
    state.begin(0);
    state.begin(1);
}

#[test]
#[should_panic(expected = "cannot end a frame that has not been begun")]
fn test_end_without_begin_panics() {
    let mut state = FrameState::new();
    state.end();
}
