//! The rendering façade: a device, a swap chain bound to a window, and the
//! size-dependent targets rebuilt on every resize.

use dx_plus::d3d11::{
    DepthStencilView, Device, DeviceContext, RenderTargetView, Texture2D, TextureDesc,
};
use dx_plus::dxgi::{self, Factory, PresentStatus, ResizeBuffers, SwapChain};
use dx_plus::{Dimensions, NativeError};
use log::{debug, info, warn};
use windows::Win32::Foundation::HWND;

use crate::config::SurfaceConfig;
use crate::SurfaceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceState {
    /// Device and swap chain exist; no targets yet.
    Initialized,
    /// Targets are bound and sized; painting reaches the window.
    Resized,
    /// The device was removed or reset. Everything must be recreated.
    Lost,
}

pub struct DirectXSurface {
    config: SurfaceConfig,
    window: HWND,
    device: Device,
    context: DeviceContext,
    swapchain: SwapChain,
    rtv: RenderTargetView,
    dsv: DepthStencilView,
    depth_buffer: Texture2D,
    size: Option<Dimensions>,
    state: SurfaceState,
}

impl DirectXSurface {
    /// Creates the device and a swap chain presenting into `window`.
    pub fn new(window: HWND, config: SurfaceConfig) -> Result<DirectXSurface, SurfaceError> {
        let (device, swapchain) = Self::acquire(window, &config)?;
        let context = device.immediate_context().clone();
        Ok(DirectXSurface {
            config,
            window,
            device,
            context,
            swapchain,
            rtv: Default::default(),
            dsv: Default::default(),
            depth_buffer: Default::default(),
            size: None,
            state: SurfaceState::Initialized,
        })
    }

    fn acquire(window: HWND, config: &SurfaceConfig) -> dx_plus::Result<(Device, SwapChain)> {
        let factory = Factory::create()?;
        if log::log_enabled!(log::Level::Debug) {
            dxgi::log_adapters(&factory)?;
        }
        let device = Device::create(config.device_options())?;
        let swapchain = factory.create_swapchain(&device, window, &config.swapchain_desc())?;
        info!("[surface] initialized for window {:x?}", window);
        Ok((device, swapchain))
    }

    /// Rebuilds the window-sized targets.
    ///
    /// The old views are unbound from the context before they are released, and
    /// released before the swap chain buffers are resized.
    ///
    /// A failed rebuild leaves no targets behind, so the surface drops back to
    /// `Initialized` (or `Lost`) and paints nothing until a resize succeeds.
    pub fn resize(&mut self, size: Dimensions) -> Result<(), SurfaceError> {
        self.recover_if_lost()?;
        let result = self.rebuild_targets(size);
        if result.is_err() && self.state == SurfaceState::Resized {
            self.state = SurfaceState::Initialized;
        }
        self.track(result)?;
        self.size = Some(size);
        self.state = SurfaceState::Resized;
        Ok(())
    }

    fn rebuild_targets(&mut self, size: Dimensions) -> dx_plus::Result<()> {
        self.release_targets();

        self.swapchain.resize(ResizeBuffers::sized(size))?;

        let back_buffer: Texture2D = self.swapchain.back_buffer(0)?;
        self.rtv = self.device.create_view(&back_buffer)?;
        self.depth_buffer = self
            .device
            .create_texture2d(&TextureDesc::depth_stencil(back_buffer.dimensions()?))?;
        self.dsv = self.device.create_view(&self.depth_buffer)?;

        self.context.set_render_target(&self.rtv, &self.dsv);
        self.context
            .set_viewport_size(size.width as f32, size.height as f32);
        debug!("[surface] targets rebuilt at {}x{}", size.width, size.height);
        Ok(())
    }

    fn release_targets(&mut self) {
        self.context.unbind_render_targets();
        self.rtv.release();
        self.dsv.release();
        self.depth_buffer.release();
    }

    /// Clears the targets and presents. Returns `None` without touching the
    /// device until the first resize.
    pub fn paint(&mut self) -> Result<Option<PresentStatus>, SurfaceError> {
        self.recover_if_lost()?;
        if self.state != SurfaceState::Resized {
            return Ok(None);
        }

        self.context
            .clear_render_target_view(&self.rtv, self.config.clear_color);
        self.context.clear_depth_stencil(
            &self.dsv,
            self.config.clear_depth,
            self.config.clear_stencil,
            true,
            false,
        );
        let result = self.swapchain.present(self.config.sync_interval, 0);
        self.track(result).map(Some)
    }

    /// Marks the surface lost when `result` carries a device-loss code.
    fn track<T>(&mut self, result: dx_plus::Result<T>) -> Result<T, SurfaceError> {
        result.map_err(|e| {
            let error = SurfaceError::from(e);
            if error.is_device_lost() {
                warn!("[surface] {}", error);
                self.state = SurfaceState::Lost;
            }
            error
        })
    }

    fn recover_if_lost(&mut self) -> Result<(), SurfaceError> {
        if self.state != SurfaceState::Lost {
            return Ok(());
        }
        if !self.config.recover_device_lost {
            return Err(SurfaceError::DeviceLost(NativeError::with_message(
                dx_plus::error::codes::DXGI_ERROR_DEVICE_REMOVED,
                "device was lost and recovery is disabled",
            )));
        }
        self.reinitialize()
    }

    /// Drops every native object and builds them again for the same window,
    /// restoring the last size if there was one.
    ///
    /// Stays `Lost` if the objects cannot be rebuilt.
    pub fn reinitialize(&mut self) -> Result<(), SurfaceError> {
        info!("[surface] reinitializing");
        self.teardown();
        self.state = SurfaceState::Lost;
        let acquired = Self::acquire(self.window, &self.config);
        let (device, swapchain) = self.track(acquired)?;
        self.context = device.immediate_context().clone();
        self.device = device;
        self.swapchain = swapchain;
        self.state = SurfaceState::Initialized;
        match self.size {
            Some(size) => self.resize(size),
            None => Ok(()),
        }
    }

    fn teardown(&mut self) {
        self.release_targets();
        self.swapchain.release();
        self.context.release();
        self.device.release();
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn size(&self) -> Option<Dimensions> {
        self.size
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn window(&self) -> HWND {
        self.window
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn swapchain(&self) -> &SwapChain {
        &self.swapchain
    }

    pub fn render_target_view(&self) -> &RenderTargetView {
        &self.rtv
    }

    pub fn depth_stencil_view(&self) -> &DepthStencilView {
        &self.dsv
    }

    pub fn depth_buffer(&self) -> &Texture2D {
        &self.depth_buffer
    }

    pub fn back_buffer_dimensions(&self) -> dx_plus::Result<Dimensions> {
        self.swapchain.back_buffer::<Texture2D>(0)?.dimensions()
    }
}

impl Drop for DirectXSurface {
    fn drop(&mut self) {
        self.teardown();
        debug!("[surface] torn down");
    }
}
