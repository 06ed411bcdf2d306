//! Per-frame orchestration against the swapchain.
//!
//! # Frame loop
//!
//! ```text
//! begin_frame  -> wait in-flight fence, acquire image, begin command buffer
//!   begin_render_pass / record / end_render_pass
//! end_frame    -> end command buffer, submit, present, advance slot
//! ```
//!
//! A stale swapchain (out of date or suboptimal) is never an error here: it
//! triggers recreation, and `begin_frame` returns `None` for frames that must
//! be skipped. While the window has a zero-sized framebuffer (minimized),
//! recreation is deferred and every `begin_frame` returns `None` until the
//! extent becomes non-zero again.
//!
//! # Example
//!
//! ```no_run
//! # use lumen_renderer::FrameRenderer;
//! # use lumen_platform::WindowSurface;
//! # fn example<W: WindowSurface>(renderer: &mut FrameRenderer, window: &mut W) -> lumen_rhi::RhiResult<()> {
//! if let Some(cmd) = renderer.begin_frame(window)? {
//!     renderer.begin_render_pass(&cmd, [0.01, 0.01, 0.01, 1.0]);
//!     // render systems record here
//!     renderer.end_render_pass(&cmd);
//!     renderer.end_frame(window)?;
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use lumen_platform::WindowSurface;
use lumen_rhi::command::{CommandBuffer, CommandPool};
use lumen_rhi::device::Device;
use lumen_rhi::instance::Instance;
use lumen_rhi::swapchain::{MAX_FRAMES_IN_FLIGHT, Swapchain};
use lumen_rhi::sync::FrameSync;
use lumen_rhi::{RhiError, RhiResult, vk};
use tracing::{debug, error, info};

use crate::frame_state::FrameState;

pub struct FrameRenderer {
    state: FrameState,
    images_in_flight: Vec<Option<usize>>,
    sync: Vec<FrameSync>,
    command_buffers: Vec<CommandBuffer>,
    command_pool: CommandPool,
    swapchain: Swapchain,
    pending_recreate: bool,
    vsync: bool,
    surface: vk::SurfaceKHR,
    device: Arc<Device>,
    instance: Arc<Instance>,
}

impl FrameRenderer {
    /// `surface` must stay alive for as long as the renderer.
    pub fn new<W: WindowSurface>(
        instance: Arc<Instance>,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        window: &W,
        vsync: bool,
    ) -> RhiResult<Self> {
        let swapchain = Swapchain::new(
            &instance,
            device.clone(),
            surface,
            window.framebuffer_extent(),
            vsync,
        )?;

        let command_pool = CommandPool::new(device.clone(), device.graphics_family())?;
        let command_buffers = command_pool.allocate(MAX_FRAMES_IN_FLIGHT as u32)?;
        let sync = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| FrameSync::new(device.clone()))
            .collect::<RhiResult<Vec<_>>>()?;

        info!(
            "Frame renderer created: {} frames in flight, {} swapchain images",
            MAX_FRAMES_IN_FLIGHT,
            swapchain.image_count()
        );

        Ok(Self {
            state: FrameState::new(),
            images_in_flight: vec![None; swapchain.image_count()],
            sync,
            command_buffers,
            command_pool,
            swapchain,
            pending_recreate: false,
            vsync,
            surface,
            device,
            instance,
        })
    }

    /// Starts a frame and returns its command buffer in the recording state.
    ///
    /// Returns `None` when the frame must be skipped because the swapchain
    /// was stale (it has been recreated) or the window is minimized.
    ///
    /// # Panics
    ///
    /// If a frame is already in progress.
    pub fn begin_frame<W: WindowSurface>(&mut self, window: &W) -> RhiResult<Option<CommandBuffer>> {
        assert!(
            !self.state.is_frame_in_progress(),
            "cannot begin a frame while one is already in progress"
        );

        if self.pending_recreate {
            self.recreate_swapchain(window)?;
            if self.pending_recreate {
                return Ok(None);
            }
        }

        let slot = self.state.slot();
        self.sync[slot].wait_in_flight()?;

        let image_index = match self
            .swapchain
            .acquire_next_image(self.sync[slot].image_available())
        {
            Ok((index, _suboptimal)) => index,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                debug!("Swapchain out of date during acquire");
                self.recreate_swapchain(window)?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        self.state.begin(image_index);

        let cmd = &self.command_buffers[slot];
        cmd.reset()?;
        cmd.begin()?;
        Ok(Some(cmd.clone()))
    }

    /// Finishes recording, submits and presents the current frame.
    ///
    /// Recreates the swapchain afterwards if presentation reported it stale
    /// or the window was resized.
    ///
    /// # Panics
    ///
    /// If no frame is in progress.
    pub fn end_frame<W: WindowSurface>(&mut self, window: &mut W) -> RhiResult<()> {
        let slot = self.state.frame_index();
        let image_index = self.state.image_index();
        let image = image_index as usize;

        let cmd = &self.command_buffers[slot];
        cmd.end()?;

        // Another slot may still be rendering into this image.
        if let Some(previous) = self.images_in_flight[image]
            && previous != slot
        {
            self.sync[previous].wait_in_flight()?;
        }
        self.images_in_flight[image] = Some(slot);

        let frame_sync = &self.sync[slot];
        let in_flight = frame_sync.arm_in_flight()?;

        let wait_semaphores = [frame_sync.image_available()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [frame_sync.render_finished()];
        let command_buffers = [cmd.handle()];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // SAFETY: the command buffer has just been ended and the semaphores
        // and fence belong to this frame slot.
        unsafe {
            self.device
                .submit_graphics(&[submit_info], in_flight)?;
        }

        let presented = self.swapchain.present(
            self.device.present_queue(),
            image_index,
            frame_sync.render_finished(),
        );
        self.state.end();

        let stale = match presented {
            Ok(suboptimal) => suboptimal,
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => true,
            Err(e) => return Err(e.into()),
        };

        if stale || window.was_resized() {
            debug!("Swapchain stale after present (resized: {})", window.was_resized());
            window.reset_resized_flag();
            self.recreate_swapchain(window)?;
        }

        Ok(())
    }

    /// Begins the swapchain render pass on `cmd`, with viewport and scissor
    /// covering the whole swapchain extent.
    ///
    /// # Panics
    ///
    /// If no frame is in progress or `cmd` is not the current frame's buffer.
    pub fn begin_render_pass(&self, cmd: &CommandBuffer, clear_color: [f32; 4]) {
        self.assert_current(cmd, "begin a render pass");

        let extent = self.swapchain.extent();
        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: clear_color,
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(self.swapchain.render_pass())
            .framebuffer(self.swapchain.framebuffer(self.state.image_index() as usize))
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&clear_values);

        cmd.begin_render_pass(&begin_info);
        cmd.set_viewport(
            vk::Viewport::default()
                .width(extent.width as f32)
                .height(extent.height as f32)
                .max_depth(1.0),
        );
        cmd.set_scissor(vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        });
    }

    /// # Panics
    ///
    /// If no frame is in progress or `cmd` is not the current frame's buffer.
    pub fn end_render_pass(&self, cmd: &CommandBuffer) {
        self.assert_current(cmd, "end a render pass");
        cmd.end_render_pass();
    }

    fn assert_current(&self, cmd: &CommandBuffer, action: &str) {
        assert!(
            self.state.is_frame_in_progress(),
            "cannot {} when no frame is in progress",
            action
        );
        assert!(
            cmd.handle() == self.command_buffers[self.state.slot()].handle(),
            "cannot {} on a command buffer from a different frame",
            action
        );
    }

    /// Rebuilds the swapchain for the window's current extent, or defers it
    /// while the extent is zero.
    fn recreate_swapchain<W: WindowSurface>(&mut self, window: &W) -> RhiResult<()> {
        let extent = window.framebuffer_extent();
        if extent.width == 0 || extent.height == 0 {
            if !self.pending_recreate {
                debug!("Window has zero extent, deferring swapchain recreation");
            }
            self.pending_recreate = true;
            return Ok(());
        }

        self.device.wait_idle()?;

        let replacement = Swapchain::with_previous(
            &self.instance,
            self.device.clone(),
            self.surface,
            extent,
            self.vsync,
            &self.swapchain,
        )?;
        if !self.swapchain.compare_formats(&replacement) {
            return Err(RhiError::SwapchainError(
                "swapchain image or depth format has changed".to_string(),
            ));
        }

        self.swapchain = replacement;
        self.images_in_flight = vec![None; self.swapchain.image_count()];
        self.pending_recreate = false;

        info!(
            "Swapchain recreated at {}x{}",
            self.swapchain.extent().width,
            self.swapchain.extent().height
        );
        Ok(())
    }

    #[inline]
    pub fn render_pass(&self) -> vk::RenderPass {
        self.swapchain.render_pass()
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.swapchain.extent_aspect_ratio()
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    #[inline]
    pub fn is_frame_in_progress(&self) -> bool {
        self.state.is_frame_in_progress()
    }

    /// # Panics
    ///
    /// If no frame is in progress.
    #[inline]
    pub fn frame_index(&self) -> usize {
        self.state.frame_index()
    }

    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Pool the per-frame command buffers come from; also usable for
    /// one-time uploads on the graphics queue.
    #[inline]
    pub fn command_pool(&self) -> &CommandPool {
        &self.command_pool
    }
}

impl Drop for FrameRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle before destroying frame renderer: {}", e);
        }
    }
}

