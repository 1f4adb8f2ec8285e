//! Direct2D drawing on top of a DXGI device.

use windows::Win32::Graphics::Direct2D::Common::{D2D1_COLOR_F, D2D_RECT_F};
use windows::Win32::Graphics::Direct2D::{
    D2D1CreateDevice, ID2D1Bitmap1, ID2D1Brush, ID2D1Device, ID2D1DeviceContext,
    ID2D1RadialGradientBrush, ID2D1SolidColorBrush, D2D1_BRUSH_PROPERTIES,
    D2D1_DEVICE_CONTEXT_OPTIONS_NONE,
};

use crate::dxgi;
use crate::error::Result;
use crate::handle::{adopt, com_wrapper, sealed};

com_wrapper! {
    pub struct Device(ID2D1Device);
}

com_wrapper! {
    pub struct DeviceContext(ID2D1DeviceContext);
}

com_wrapper! {
    pub struct Bitmap(ID2D1Bitmap1);
}

com_wrapper! {
    pub struct SolidColorBrush(ID2D1SolidColorBrush);
}

com_wrapper! {
    pub struct RadialGradientBrush(ID2D1RadialGradientBrush);
}

impl Device {
    pub fn new(device: &dxgi::Device) -> Result<Device> {
        let device = unsafe { D2D1CreateDevice(device.get()?, None)? };
        Ok(adopt(device))
    }

    pub fn create_context(&self) -> Result<DeviceContext> {
        let context = unsafe {
            self.get()?
                .CreateDeviceContext(D2D1_DEVICE_CONTEXT_OPTIONS_NONE)?
        };
        Ok(adopt(context))
    }
}

/// Surfaces a bitmap can be created over.
pub trait BitmapSource: sealed::Sealed {
    #[doc(hidden)]
    fn create_bitmap(&self, context: &ID2D1DeviceContext) -> Result<Bitmap>;
}

impl BitmapSource for dxgi::Surface {
    fn create_bitmap(&self, context: &ID2D1DeviceContext) -> Result<Bitmap> {
        let bitmap = unsafe { context.CreateBitmapFromDxgiSurface(self.get()?, None)? };
        Ok(adopt(bitmap))
    }
}

/// Brushes shapes can be drawn with.
pub trait Brush: sealed::Sealed {
    #[doc(hidden)]
    fn brush(&self) -> Result<&ID2D1Brush>;
}

impl sealed::Sealed for SolidColorBrush {}

impl Brush for SolidColorBrush {
    fn brush(&self) -> Result<&ID2D1Brush> {
        Ok(self.get()?.into())
    }
}

impl sealed::Sealed for RadialGradientBrush {}

impl Brush for RadialGradientBrush {
    fn brush(&self) -> Result<&ID2D1Brush> {
        Ok(self.get()?.into())
    }
}

impl DeviceContext {
    pub fn create_bitmap<S: BitmapSource>(&self, source: &S) -> Result<Bitmap> {
        source.create_bitmap(self.get()?)
    }

    pub fn set_target(&self, bitmap: &Bitmap) -> Result<()> {
        unsafe { self.get()?.SetTarget(bitmap.get()?) };
        Ok(())
    }

    /// Detaches the current target so its surface can be released.
    pub fn clear_target(&self) {
        if let Some(context) = self.raw() {
            unsafe { context.SetTarget(None) };
        }
    }

    pub fn begin_draw(&self) -> Result<()> {
        unsafe { self.get()?.BeginDraw() };
        Ok(())
    }

    pub fn end_draw(&self) -> Result<()> {
        unsafe { self.get()?.EndDraw(None, None)? };
        Ok(())
    }

    pub fn create_solid_color_brush(&self, color: D2D1_COLOR_F) -> Result<SolidColorBrush> {
        let brush = unsafe { self.get()?.CreateSolidColorBrush(&color, None)? };
        Ok(adopt(brush))
    }

    pub fn create_solid_color_brush_with(
        &self,
        color: D2D1_COLOR_F,
        properties: &D2D1_BRUSH_PROPERTIES,
    ) -> Result<SolidColorBrush> {
        let brush = unsafe {
            self.get()?
                .CreateSolidColorBrush(&color, Some(properties))?
        };
        Ok(adopt(brush))
    }

    pub fn draw_rectangle<B: Brush>(
        &self,
        rect: &D2D_RECT_F,
        brush: &B,
        stroke_width: f32,
    ) -> Result<()> {
        unsafe { self.get()?.DrawRectangle(rect, brush.brush()?, stroke_width, None) };
        Ok(())
    }
}
