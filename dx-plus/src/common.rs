#[cfg(windows)]
use windows::Win32::Graphics::Direct3D11::D3D11_TEXTURE2D_DESC;

#[derive(PartialEq, Eq, Copy, Clone, Debug, Default, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    /// A zero-sized extent, which DXGI reads as "take the size from the window".
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Dimensions { width, height }
    }
}

impl From<Dimensions> for [f32; 2] {
    fn from(item: Dimensions) -> Self {
        [item.width as f32, item.height as f32]
    }
}

#[cfg(windows)]
impl From<D3D11_TEXTURE2D_DESC> for Dimensions {
    fn from(item: D3D11_TEXTURE2D_DESC) -> Self {
        Dimensions {
            width: item.Width,
            height: item.Height,
        }
    }
}
