//! A plain Win32 top-level window that drives a [`DirectXSurface`].

use std::cell::RefCell;
use std::mem::size_of;
use std::sync::atomic::{AtomicUsize, Ordering};

use dx_plus::{Dimensions, NativeError};
use log::{debug, error, warn};
use windows::core::PCSTR;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::{BeginPaint, EndPaint, PAINTSTRUCT};
use windows::Win32::System::LibraryLoader::GetModuleHandleA;
use windows::Win32::UI::WindowsAndMessaging::{
    AdjustWindowRect, CreateWindowExA, DefWindowProcA, DestroyWindow, DispatchMessageA,
    GetClientRect, GetMessageA, GetWindowLongPtrA, LoadCursorW, PostQuitMessage,
    RegisterClassExA, SetWindowLongPtrA, TranslateMessage, UnregisterClassA, CS_HREDRAW,
    CS_VREDRAW, CW_USEDEFAULT, GWLP_USERDATA, IDC_ARROW, MSG, WM_DESTROY, WM_PAINT, WM_SIZE,
    WNDCLASSEXA, WS_OVERLAPPEDWINDOW, WS_VISIBLE,
};

use crate::surface::DirectXSurface;
use crate::SurfaceError;

static CLASS_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub struct HostWindow {
    class: WNDCLASSEXA,
    // Backs `class.lpszClassName`.
    _class_name: Vec<u8>,
    hwnd: HWND,
}

/// What the window procedure reaches through `GWLP_USERDATA` while `run` is
/// pumping messages.
struct Attached {
    surface: RefCell<DirectXSurface>,
    error: RefCell<Option<SurfaceError>>,
}

impl Attached {
    /// Records a failed resize or paint. A device loss the surface will recover
    /// from on its next event is only logged; anything else ends the loop.
    fn fail(&self, what: &str, error: SurfaceError, recovers: bool) {
        if error.is_device_lost() && recovers {
            warn!("[host] {} failed, recovering: {}", what, error);
            return;
        }
        error!("[host] {} failed: {}", what, error);
        let mut slot = self.error.borrow_mut();
        if slot.is_none() {
            *slot = Some(error);
            unsafe { PostQuitMessage(1) };
        }
    }
}

unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let attached = GetWindowLongPtrA(hwnd, GWLP_USERDATA) as *const Attached;
    if let Some(attached) = attached.as_ref() {
        match msg {
            WM_SIZE => {
                let size = size_from_lparam(lparam);
                if size.is_empty() {
                    // minimized
                    return LRESULT(0);
                }
                match attached.surface.try_borrow_mut() {
                    Ok(mut surface) => {
                        let recovers = surface.config().recover_device_lost;
                        if let Err(e) = surface.resize(size) {
                            drop(surface);
                            attached.fail("resize", e, recovers);
                        }
                    }
                    Err(_) => warn!("[host] WM_SIZE while busy, dropped"),
                }
                return LRESULT(0);
            }
            WM_PAINT => {
                let mut ps = PAINTSTRUCT::default();
                BeginPaint(hwnd, &mut ps);
                match attached.surface.try_borrow_mut() {
                    Ok(mut surface) => {
                        let recovers = surface.config().recover_device_lost;
                        if let Err(e) = surface.paint() {
                            drop(surface);
                            attached.fail("paint", e, recovers);
                        }
                    }
                    Err(_) => warn!("[host] WM_PAINT while busy, dropped"),
                }
                EndPaint(hwnd, &ps);
                return LRESULT(0);
            }
            WM_DESTROY => {
                PostQuitMessage(0);
                return LRESULT(0);
            }
            _ => {}
        }
    }
    DefWindowProcA(hwnd, msg, wparam, lparam)
}

/// Client size carried by `WM_SIZE`: width in the low word, height in the high.
pub fn size_from_lparam(lparam: LPARAM) -> Dimensions {
    let packed = lparam.0 as u32;
    Dimensions::new(packed & 0xffff, (packed >> 16) & 0xffff)
}

fn last_error() -> SurfaceError {
    SurfaceError::Window(NativeError::from(windows::core::Error::from_win32()))
}

impl HostWindow {
    /// Registers a fresh window class and creates a window whose client area
    /// is `size`.
    pub fn new(title: &str, size: Dimensions, visible: bool) -> Result<HostWindow, SurfaceError> {
        let class_name = format!(
            "DxWidgetHost{}\0",
            CLASS_COUNTER.fetch_add(1, Ordering::Relaxed)
        )
        .into_bytes();
        let title: Vec<u8> = title
            .bytes()
            .filter(|&b| b != 0)
            .chain(std::iter::once(0))
            .collect();

        unsafe {
            let instance: HINSTANCE = GetModuleHandleA(None).map_err(NativeError::from)?;
            let class = WNDCLASSEXA {
                cbSize: size_of::<WNDCLASSEXA>() as _,
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(wnd_proc),
                hInstance: instance,
                hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                lpszClassName: PCSTR(class_name.as_ptr()),
                ..Default::default()
            };
            if RegisterClassExA(&class) == 0 {
                return Err(last_error());
            }

            let mut rect = RECT {
                left: 0,
                top: 0,
                right: size.width as i32,
                bottom: size.height as i32,
            };
            AdjustWindowRect(&mut rect, WS_OVERLAPPEDWINDOW, false);

            let style = if visible {
                WS_OVERLAPPEDWINDOW | WS_VISIBLE
            } else {
                WS_OVERLAPPEDWINDOW
            };
            let hwnd = CreateWindowExA(
                Default::default(),
                class.lpszClassName,
                PCSTR(title.as_ptr()),
                style,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                rect.right - rect.left,
                rect.bottom - rect.top,
                None,
                None,
                instance,
                std::ptr::null(),
            );
            if hwnd.0 == 0 {
                let err = last_error();
                UnregisterClassA(class.lpszClassName, instance);
                return Err(err);
            }
            debug!("[host] window {:x?} created", hwnd);

            Ok(HostWindow {
                class,
                _class_name: class_name,
                hwnd,
            })
        }
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    pub fn client_size(&self) -> Dimensions {
        let mut rect = RECT::default();
        unsafe { GetClientRect(self.hwnd, &mut rect) };
        Dimensions::new(
            rect.right.abs_diff(rect.left),
            rect.bottom.abs_diff(rect.top),
        )
    }

    /// Hands `surface` to the window and pumps messages until the window is
    /// closed. The surface is sized to the client area before the first message.
    ///
    /// Returns the first resize or paint failure the surface could not recover
    /// from; the loop stops at that point.
    pub fn run(&self, surface: DirectXSurface) -> Result<(), SurfaceError> {
        let attached = Attached {
            surface: RefCell::new(surface),
            error: RefCell::new(None),
        };
        let _attachment = Attachment::new(self.hwnd, &attached);

        let size = self.client_size();
        if !size.is_empty() {
            attached.surface.borrow_mut().resize(size)?;
        }

        let mut msg = MSG::default();
        loop {
            let status = unsafe { GetMessageA(&mut msg, None, 0, 0) };
            match status.0 {
                0 => break,
                -1 => return Err(last_error()),
                _ => unsafe {
                    TranslateMessage(&msg);
                    DispatchMessageA(&msg);
                },
            }
        }
        debug!("[host] message loop finished");
        match attached.error.into_inner() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Points the window's user data at the attached surface for as long as it lives.
struct Attachment(HWND);

impl Attachment {
    fn new(hwnd: HWND, attached: &Attached) -> Attachment {
        unsafe { SetWindowLongPtrA(hwnd, GWLP_USERDATA, attached as *const Attached as isize) };
        Attachment(hwnd)
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        unsafe { SetWindowLongPtrA(self.0, GWLP_USERDATA, 0) };
    }
}

impl Drop for HostWindow {
    fn drop(&mut self) {
        unsafe {
            DestroyWindow(self.hwnd);
            UnregisterClassA(self.class.lpszClassName, self.class.hInstance);
        }
        debug!("[host] window {:x?} destroyed", self.hwnd);
    }
}
