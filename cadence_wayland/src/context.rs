// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! EGL rendering-context binding for a negotiated Wayland surface.
//!
//! [`RenderContext::bind`] runs the whole binding sequence and returns the
//! four handles as one bundle:
//!
//! ```text
//!   eglGetPlatformDisplay(WAYLAND) ─► eglInitialize ─► eglChooseConfig (first match)
//!     ─► wl_egl_window_create ─► eglCreatePlatformWindowSurface
//!     ─► eglSurfaceAttrib(SWAP_BEHAVIOR) ─► eglBindAPI(OpenGL)
//!     ─► eglCreateContext ─► eglMakeCurrent
//! ```
//!
//! Every step is fail-fast. There is no fallback search: if the fixed
//! [`PixelFormat`] matches nothing, binding fails with
//! [`ContextError::NoMatchingConfig`].
//!
//! The bundle's fields are declared in release order (context, surface,
//! native window, display), so dropping it tears the stack down in reverse
//! acquisition order. A failure half-way through drops the handles already
//! acquired in that same order.

#![expect(
    unsafe_code,
    reason = "EGL display and window creation take raw Wayland pointers"
)]

use core::ffi::c_void;
use std::fmt;
use std::fmt::Write as _;
use std::rc::Rc;

use cadence_core::geometry::Geometry;
use cadence_core::teardown::Stage;
use khronos_egl as egl;
use wayland_client::Proxy;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_egl::WlEglSurface;

use crate::guard::{Guard, TeardownLedger};

/// EGL entry points, linked against the system `libEGL`.
type Egl = egl::Instance<egl::Static>;

/// `EGL_PLATFORM_WAYLAND_KHR` from `EGL_KHR_platform_wayland`.
const PLATFORM_WAYLAND_KHR: egl::Enum = 0x31D8;

/// Minimum framebuffer configuration a display config must satisfy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    /// Red channel bits.
    pub red: egl::Int,
    /// Green channel bits.
    pub green: egl::Int,
    /// Blue channel bits.
    pub blue: egl::Int,
    /// Alpha channel bits.
    pub alpha: egl::Int,
    /// Total color buffer bits.
    pub buffer: egl::Int,
    /// Depth buffer bits.
    pub depth: egl::Int,
    /// Stencil buffer bits.
    pub stencil: egl::Int,
    /// Multisample count.
    pub samples: egl::Int,
    /// Required maximum swap interval.
    pub max_swap_interval: egl::Int,
}

impl PixelFormat {
    /// 8-bit RGBA, 32-bit buffer, no depth, stencil or multisampling.
    pub const RGBA8: Self = Self {
        red: 8,
        green: 8,
        blue: 8,
        alpha: 8,
        buffer: 32,
        depth: 0,
        stencil: 0,
        samples: 0,
        max_swap_interval: 1,
    };

    /// `eglChooseConfig` attribute list: the channel sizes above, plus a
    /// window-presentable, OpenGL-renderable config with no caveats.
    #[must_use]
    pub fn attrib_list(&self) -> [egl::Int; 25] {
        [
            egl::RED_SIZE,
            self.red,
            egl::GREEN_SIZE,
            self.green,
            egl::BLUE_SIZE,
            self.blue,
            egl::ALPHA_SIZE,
            self.alpha,
            egl::BUFFER_SIZE,
            self.buffer,
            egl::DEPTH_SIZE,
            self.depth,
            egl::STENCIL_SIZE,
            self.stencil,
            egl::SAMPLES,
            self.samples,
            egl::SURFACE_TYPE,
            egl::WINDOW_BIT,
            egl::RENDERABLE_TYPE,
            egl::OPENGL_BIT,
            egl::CONFIG_CAVEAT,
            egl::NONE,
            egl::MAX_SWAP_INTERVAL,
            self.max_swap_interval,
            egl::NONE,
        ]
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self::RGBA8
    }
}

/// Requested OpenGL context version and flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextRequest {
    /// Major version.
    pub major: egl::Int,
    /// Minor version.
    pub minor: egl::Int,
    /// Core profile when `true`, compatibility profile otherwise.
    pub core_profile: bool,
    /// Request a forward-compatible context.
    pub forward_compatible: bool,
    /// Request a debug context.
    pub debug: bool,
}

impl ContextRequest {
    /// OpenGL 4.6 core profile, forward-compatible, with debug output.
    pub const GL_4_6_CORE_DEBUG: Self = Self {
        major: 4,
        minor: 6,
        core_profile: true,
        forward_compatible: true,
        debug: true,
    };

    /// `eglCreateContext` attribute list.
    #[must_use]
    pub fn attrib_list(&self) -> [egl::Int; 11] {
        let profile = if self.core_profile {
            egl::CONTEXT_OPENGL_CORE_PROFILE_BIT
        } else {
            egl::CONTEXT_OPENGL_COMPATIBILITY_PROFILE_BIT
        };
        [
            egl::CONTEXT_MAJOR_VERSION,
            self.major,
            egl::CONTEXT_MINOR_VERSION,
            self.minor,
            egl::CONTEXT_OPENGL_PROFILE_MASK,
            profile,
            egl::CONTEXT_OPENGL_DEBUG,
            egl_bool(self.debug),
            egl::CONTEXT_OPENGL_FORWARD_COMPATIBLE,
            egl_bool(self.forward_compatible),
            egl::NONE,
        ]
    }
}

impl Default for ContextRequest {
    fn default() -> Self {
        Self::GL_4_6_CORE_DEBUG
    }
}

fn egl_bool(value: bool) -> egl::Int {
    if value {
        egl::TRUE as egl::Int
    } else {
        egl::FALSE as egl::Int
    }
}

/// Window surface attributes: linear color space, rendering to the back
/// buffer.
fn window_surface_attribs() -> [egl::Attrib; 5] {
    [
        egl::GL_COLORSPACE as egl::Attrib,
        egl::GL_COLORSPACE_LINEAR as egl::Attrib,
        egl::RENDER_BUFFER as egl::Attrib,
        egl::BACK_BUFFER as egl::Attrib,
        egl::ATTRIB_NONE,
    ]
}

/// Config attributes logged for every matching config.
const CONFIG_ATTRIBUTES: [(egl::Int, &str); 17] = [
    (egl::CONFIG_ID, "CONFIG_ID"),
    (egl::BUFFER_SIZE, "BUFFER_SIZE"),
    (egl::RED_SIZE, "RED_SIZE"),
    (egl::GREEN_SIZE, "GREEN_SIZE"),
    (egl::BLUE_SIZE, "BLUE_SIZE"),
    (egl::ALPHA_SIZE, "ALPHA_SIZE"),
    (egl::DEPTH_SIZE, "DEPTH_SIZE"),
    (egl::STENCIL_SIZE, "STENCIL_SIZE"),
    (egl::MAX_SWAP_INTERVAL, "MAX_SWAP_INTERVAL"),
    (egl::MIN_SWAP_INTERVAL, "MIN_SWAP_INTERVAL"),
    (egl::NATIVE_RENDERABLE, "NATIVE_RENDERABLE"),
    (egl::NATIVE_VISUAL_ID, "NATIVE_VISUAL_ID"),
    (egl::NATIVE_VISUAL_TYPE, "NATIVE_VISUAL_TYPE"),
    (egl::RENDERABLE_TYPE, "RENDERABLE_TYPE"),
    (egl::SAMPLE_BUFFERS, "SAMPLE_BUFFERS"),
    (egl::SAMPLES, "SAMPLES"),
    (egl::SURFACE_TYPE, "SURFACE_TYPE"),
];

/// Surface attributes logged once the window surface exists.
const SURFACE_ATTRIBUTES: [(egl::Int, &str); 6] = [
    (egl::CONFIG_ID, "CONFIG_ID"),
    (egl::WIDTH, "WIDTH"),
    (egl::HEIGHT, "HEIGHT"),
    (egl::HORIZONTAL_RESOLUTION, "HORIZONTAL_RESOLUTION"),
    (egl::VERTICAL_RESOLUTION, "VERTICAL_RESOLUTION"),
    (egl::PIXEL_ASPECT_RATIO, "PIXEL_ASPECT_RATIO"),
];

/// Formats `NAME=value(0xvalue)` pairs on one line.
fn describe_attributes<F>(attributes: &[(egl::Int, &str)], mut query: F) -> String
where
    F: FnMut(egl::Int) -> Result<egl::Int, egl::Error>,
{
    let mut line = String::new();
    for (attribute, name) in attributes {
        if !line.is_empty() {
            line.push(' ');
        }
        match query(*attribute) {
            Ok(value) => {
                let _ = write!(line, "{name}={value}({value:#x})");
            }
            Err(error) => {
                let _ = write!(line, "{name}=<{error}>");
            }
        }
    }
    line
}

/// Errors from [`RenderContext::bind`].
#[derive(Debug)]
pub enum ContextError {
    /// `eglGetPlatformDisplay` failed.
    Display(egl::Error),
    /// `eglInitialize` failed.
    Initialize(egl::Error),
    /// Counting or choosing configs failed.
    ConfigQuery(egl::Error),
    /// No config satisfies the requested [`PixelFormat`].
    NoMatchingConfig,
    /// `wl_egl_window_create` failed.
    NativeWindow(wayland_egl::Error),
    /// `eglCreatePlatformWindowSurface` failed.
    Surface(egl::Error),
    /// `eglSurfaceAttrib(EGL_SWAP_BEHAVIOR)` failed.
    SwapBehavior(egl::Error),
    /// `eglBindAPI(EGL_OPENGL_API)` failed.
    BindApi(egl::Error),
    /// `eglCreateContext` failed.
    Context(egl::Error),
    /// `eglMakeCurrent` failed.
    MakeCurrent(egl::Error),
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Display(error) => write!(f, "eglGetPlatformDisplay failed: {error}"),
            Self::Initialize(error) => write!(f, "eglInitialize failed: {error}"),
            Self::ConfigQuery(error) => write!(f, "EGL config query failed: {error}"),
            Self::NoMatchingConfig => f.write_str("no EGL config matches the pixel format"),
            Self::NativeWindow(error) => write!(f, "wl_egl_window creation failed: {error}"),
            Self::Surface(error) => write!(f, "eglCreatePlatformWindowSurface failed: {error}"),
            Self::SwapBehavior(error) => write!(f, "setting EGL_SWAP_BEHAVIOR failed: {error}"),
            Self::BindApi(error) => write!(f, "eglBindAPI(EGL_OPENGL_API) failed: {error}"),
            Self::Context(error) => write!(f, "eglCreateContext failed: {error}"),
            Self::MakeCurrent(error) => write!(f, "eglMakeCurrent failed: {error}"),
        }
    }
}

impl std::error::Error for ContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NoMatchingConfig => None,
            Self::NativeWindow(error) => Some(error),
            Self::Display(error)
            | Self::Initialize(error)
            | Self::ConfigQuery(error)
            | Self::Surface(error)
            | Self::SwapBehavior(error)
            | Self::BindApi(error)
            | Self::Context(error)
            | Self::MakeCurrent(error) => Some(error),
        }
    }
}

struct DisplayHandle {
    egl: Rc<Egl>,
    display: egl::Display,
}

struct SurfaceHandle {
    egl: Rc<Egl>,
    display: egl::Display,
    surface: egl::Surface,
}

struct ContextHandle {
    egl: Rc<Egl>,
    display: egl::Display,
    context: egl::Context,
}

impl fmt::Debug for DisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayHandle").finish_non_exhaustive()
    }
}

impl fmt::Debug for SurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceHandle").finish_non_exhaustive()
    }
}

impl fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextHandle").finish_non_exhaustive()
    }
}

fn terminate_display(handle: &DisplayHandle) {
    if let Err(error) = handle.egl.terminate(handle.display) {
        tracing::warn!(%error, "eglTerminate failed");
    }
}

fn destroy_surface(handle: &SurfaceHandle) {
    if let Err(error) = handle.egl.destroy_surface(handle.display, handle.surface) {
        tracing::warn!(%error, "eglDestroySurface failed");
    }
}

fn unbind_and_destroy_context(handle: &ContextHandle) {
    if let Err(error) = handle.egl.make_current(handle.display, None, None, None) {
        tracing::warn!(%error, "unbinding EGL context failed");
    }
    if let Err(error) = handle.egl.destroy_context(handle.display, handle.context) {
        tracing::warn!(%error, "eglDestroyContext failed");
    }
}

fn query_string(egl: &Egl, display: Option<egl::Display>, name: egl::Int) -> String {
    match egl.query_string(display, name) {
        Ok(value) => value.to_string_lossy().into_owned(),
        Err(error) => format!("<{error}>"),
    }
}

/// Hardware rendering context bound to the client's drawable.
///
/// Owns the EGL display, the `wl_egl_window`, the window surface and the
/// OpenGL context. The context is current on the thread that bound it.
pub struct RenderContext {
    context: Guard<ContextHandle>,
    surface: Guard<SurfaceHandle>,
    native: Guard<WlEglSurface>,
    display: Guard<DisplayHandle>,
    egl: Rc<Egl>,
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("context", &self.context)
            .field("surface", &self.surface)
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}

impl RenderContext {
    /// Binds a rendering context to `drawable` at `geometry`.
    ///
    /// `wl_display` must be the `wl_display*` of the connection `drawable`
    /// belongs to, and must stay valid for the lifetime of the returned
    /// context.
    ///
    /// # Errors
    ///
    /// Returns the [`ContextError`] of the first step that fails.
    pub(crate) fn bind(
        wl_display: *mut c_void,
        drawable: &WlSurface,
        geometry: Geometry,
        pixel_format: &PixelFormat,
        request: &ContextRequest,
        ledger: &TeardownLedger,
    ) -> Result<Self, ContextError> {
        let egl = Rc::new(egl::Instance::new(egl::Static));
        tracing::debug!(
            extensions = %query_string(&egl, None, egl::EXTENSIONS),
            "EGL client extensions"
        );

        // SAFETY: `wl_display` is the live display of the connection that
        // owns `drawable`; the caller keeps it alive past this context.
        let display = unsafe {
            egl.get_platform_display(PLATFORM_WAYLAND_KHR, wl_display, &[egl::ATTRIB_NONE])
        }
        .map_err(ContextError::Display)?;
        let (major, minor) = egl.initialize(display).map_err(ContextError::Initialize)?;
        let display = Guard::new(
            DisplayHandle {
                egl: Rc::clone(&egl),
                display,
            },
            Stage::Display,
            ledger,
            terminate_display,
        );
        // `tracing` field macros import `tracing::field::display`, which
        // shadows the `display` guard inside their expressions.
        let egl_display = display.display;
        tracing::debug!(
            major,
            minor,
            version = %query_string(&egl, Some(egl_display), egl::VERSION),
            vendor = %query_string(&egl, Some(egl_display), egl::VENDOR),
            client_apis = %query_string(&egl, Some(egl_display), egl::CLIENT_APIS),
            "EGL initialized"
        );
        tracing::trace!(
            extensions = %query_string(&egl, Some(egl_display), egl::EXTENSIONS),
            "EGL display extensions"
        );

        let config = choose_config(&egl, display.display, pixel_format)?;

        let native = WlEglSurface::new(drawable.id(), geometry.width_i32(), geometry.height_i32())
            .map_err(ContextError::NativeWindow)?;
        let native = Guard::dropping(native, Stage::NativeWindow, ledger);

        // SAFETY: `native` is a live `wl_egl_window` for `drawable`, and the
        // surface guard is dropped before the native window guard.
        let surface = unsafe {
            egl.create_platform_window_surface(
                display.display,
                config,
                native.ptr().cast_mut(),
                &window_surface_attribs(),
            )
        }
        .map_err(ContextError::Surface)?;
        let surface = Guard::new(
            SurfaceHandle {
                egl: Rc::clone(&egl),
                display: display.display,
                surface,
            },
            Stage::Surface,
            ledger,
            destroy_surface,
        );
        egl.surface_attrib(
            display.display,
            surface.surface,
            egl::SWAP_BEHAVIOR,
            egl::BUFFER_DESTROYED,
        )
        .map_err(ContextError::SwapBehavior)?;
        tracing::debug!(
            attributes = %describe_attributes(&SURFACE_ATTRIBUTES, |attribute| {
                egl.query_surface(egl_display, surface.surface, attribute)
            }),
            "EGL window surface"
        );

        egl.bind_api(egl::OPENGL_API)
            .map_err(ContextError::BindApi)?;
        let context = egl
            .create_context(display.display, config, None, &request.attrib_list())
            .map_err(ContextError::Context)?;
        let context = Guard::new(
            ContextHandle {
                egl: Rc::clone(&egl),
                display: display.display,
                context,
            },
            Stage::Context,
            ledger,
            unbind_and_destroy_context,
        );
        egl.make_current(
            display.display,
            Some(surface.surface),
            Some(surface.surface),
            Some(context.context),
        )
        .map_err(ContextError::MakeCurrent)?;
        tracing::debug!(
            major = request.major,
            minor = request.minor,
            core = request.core_profile,
            width = geometry.width(),
            height = geometry.height(),
            "rendering context bound"
        );

        Ok(Self {
            context,
            surface,
            native,
            display,
            egl,
        })
    }

    /// Presents the back buffer. Commits the drawable.
    ///
    /// # Errors
    ///
    /// Returns the EGL error if presentation failed.
    pub fn swap_buffers(&self) -> Result<(), egl::Error> {
        self.egl
            .swap_buffers(self.display.display, self.surface.surface)
    }

    /// Looks up an OpenGL entry point for function loaders.
    #[must_use]
    pub fn get_proc_address(&self, name: &str) -> *const c_void {
        self.egl
            .get_proc_address(name)
            .map_or(core::ptr::null(), |function| function as *const c_void)
    }

    /// Native window backing the surface; resized with the geometry.
    pub(crate) fn native_window(&self) -> &WlEglSurface {
        &self.native
    }
}

/// Selects the first config matching `pixel_format`.
fn choose_config(
    egl: &Egl,
    display: egl::Display,
    pixel_format: &PixelFormat,
) -> Result<egl::Config, ContextError> {
    let attribs = pixel_format.attrib_list();
    let total = egl
        .get_config_count(display)
        .map_err(ContextError::ConfigQuery)?;
    let matching = egl
        .matching_config_count(display, &attribs)
        .map_err(ContextError::ConfigQuery)?;
    tracing::debug!(total, matching, "EGL configs");

    let mut configs = Vec::with_capacity(matching);
    egl.choose_config(display, &attribs, &mut configs)
        .map_err(ContextError::ConfigQuery)?;
    // `tracing` field macros shadow `display`; see `RenderContext::bind`.
    let egl_display = display;
    for (index, config) in configs.iter().enumerate() {
        tracing::debug!(
            index,
            attributes = %describe_attributes(&CONFIG_ATTRIBUTES, |attribute| {
                egl.get_config_attrib(egl_display, *config, attribute)
            }),
            "matching EGL config"
        );
    }

    configs.first().copied().ok_or(ContextError::NoMatchingConfig)
}
