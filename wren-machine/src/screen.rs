//! Screen device boundary: entry vector, pixel planes, emulation trait
use crate::{Machine, Ports};
use zerocopy::{AsBytes, BigEndian, FromBytes, FromZeroes, U16};

/// Ports for the screen device
///
/// Only the vector is meaningful to this crate; the remaining ports belong
/// to the external screen emulation.
#[derive(AsBytes, FromZeroes, FromBytes)]
#[repr(C)]
pub struct ScreenPorts {
    vector: U16<BigEndian>,
    _rest: [u8; 14],
}

static_assertions::assert_eq_size!(ScreenPorts, [u8; 16]);

impl Ports for ScreenPorts {
    const BASE: u8 = 0x20;
}

impl ScreenPorts {
    /// Entry vector for frame events
    pub fn vector(&self) -> u16 {
        self.vector.get()
    }
}

/// Pixel planes owned by the screen emulation
///
/// Each plane stores one byte per pixel in row-major order.
pub struct Layers<'a> {
    /// Foreground plane
    pub fg: &'a [u8],
    /// Background plane
    pub bg: &'a [u8],
    /// Width in pixels
    pub width: u16,
    /// Height in pixels
    pub height: u16,
}

/// Interface to the external screen emulation
///
/// The emulation owns the pixel planes and the drawing primitives; this
/// crate only routes port traffic to it and reads the planes back out.
pub trait ScreenDevice {
    /// Performs the `DEI` half of a screen port read
    ///
    /// See [`crate::Device::dei`] for the contract.
    fn dei(&mut self, mach: &mut Machine, target: u8);

    /// Performs the `DEO` half of a screen port write
    ///
    /// The written value is already stored in device memory when this is
    /// called.
    fn deo(&mut self, mach: &mut Machine, target: u8);

    /// Sets the display resolution, allocating the pixel planes
    ///
    /// Called once, before the first evaluation.
    fn resize(&mut self, width: u16, height: u16);

    /// Borrows the current pixel planes
    fn layers(&self) -> Layers<'_>;
}
