//! Window management using winit.

use std::ffi::{CStr, c_char};
use std::sync::Arc;

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle};
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window as WinitWindow, WindowAttributes};

use lumen_core::{Error, Result, WindowSettings};

/// What the frame renderer needs to know about the window it presents to.
pub trait WindowSurface {
    /// Current drawable size in pixels. Zero in either dimension while
    /// minimized.
    fn framebuffer_extent(&self) -> vk::Extent2D;

    /// True once the window has been resized since the flag was last reset.
    fn was_resized(&self) -> bool;

    fn reset_resized_flag(&mut self);
}

/// Owns a `vk::SurfaceKHR` and destroys it on drop.
///
/// The instance it was created from must outlive it.
pub struct Surface {
    handle: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
}

impl Surface {
    #[inline]
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    #[inline]
    pub fn loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        // SAFETY: the handle came from ash_window::create_surface on the
        // instance the loader was built from.
        unsafe {
            self.surface_loader.destroy_surface(self.handle, None);
        }
        tracing::debug!("Vulkan surface destroyed");
    }
}

pub struct Window {
    window: Arc<WinitWindow>,
    resized: bool,
}

impl Window {
    pub fn new(event_loop: &ActiveEventLoop, settings: &WindowSettings) -> Result<Self> {
        let attrs = WindowAttributes::default()
            .with_title(settings.title.as_str())
            .with_inner_size(PhysicalSize::new(settings.width, settings.height))
            .with_resizable(true);

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| Error::Window(e.to_string()))?;

        tracing::info!(
            "Window '{}' created: {}x{}",
            settings.title,
            settings.width,
            settings.height
        );

        Ok(Self {
            window: Arc::new(window),
            resized: false,
        })
    }

    /// Records a resize reported by the event loop.
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        self.resized = true;
        tracing::debug!("Window resized: {}x{}", width, height);
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Instance extensions needed to create a surface for this window.
    pub fn required_extensions(&self) -> Result<Vec<*const c_char>> {
        let display_handle = self
            .window
            .display_handle()
            .map_err(|e| Error::Window(format!("failed to get display handle: {}", e)))?;
        required_extensions(display_handle.as_raw())
    }

    /// Creates a Vulkan surface for this window.
    pub fn create_surface(&self, entry: &ash::Entry, instance: &ash::Instance) -> Result<Surface> {
        let display_handle = self
            .window
            .display_handle()
            .map_err(|e| Error::Window(format!("failed to get display handle: {}", e)))?;
        let window_handle = self
            .window
            .window_handle()
            .map_err(|e| Error::Window(format!("failed to get window handle: {}", e)))?;

        // SAFETY: both handles come from a live winit window; the surface
        // is destroyed in Surface::drop.
        let handle = unsafe {
            ash_window::create_surface(
                entry,
                instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| Error::Surface(format!("failed to create Vulkan surface: {}", e)))?
        };

        tracing::info!("Vulkan surface created");

        Ok(Surface {
            handle,
            surface_loader: ash::khr::surface::Instance::new(entry, instance),
        })
    }
}

impl WindowSurface for Window {
    fn framebuffer_extent(&self) -> vk::Extent2D {
        let size = self.window.inner_size();
        vk::Extent2D {
            width: size.width,
            height: size.height,
        }
    }

    fn was_resized(&self) -> bool {
        self.resized
    }

    fn reset_resized_flag(&mut self) {
        self.resized = false;
    }
}

/// Instance extensions the platform needs for surfaces on `display_handle`.
pub fn required_extensions(display_handle: RawDisplayHandle) -> Result<Vec<*const c_char>> {
    let extensions = ash_window::enumerate_required_extensions(display_handle)
        .map_err(|e| Error::Surface(format!("failed to enumerate surface extensions: {}", e)))?;

    tracing::debug!(
        "Surface extensions: {:?}",
        extensions
            .iter()
            // SAFETY: ash_window returns pointers to static, null-terminated names.
            .map(|&ext| unsafe { CStr::from_ptr(ext) })
            .collect::<Vec<_>>()
    );

    Ok(extensions.to_vec())
}
