//! Windowing for the engine: a winit window, the Vulkan surface created
//! from it and the [`WindowSurface`] view the frame renderer polls.

mod window;

pub use window::{Surface, Window, WindowSurface, required_extensions};

pub use winit::event::{ElementState, KeyEvent, WindowEvent};
pub use winit::event_loop::{ActiveEventLoop, EventLoop};
pub use winit::keyboard::{KeyCode, PhysicalKey};
