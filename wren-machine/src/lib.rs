//! Machine state and device bus for an external register-machine CPU
//!
//! This crate owns the addressable memory and the 256-byte device register
//! file of a small virtual machine, and arbitrates every device-port access
//! the CPU makes while it runs.  The CPU itself is an external collaborator
//! behind the [`Cpu`] trait: this layer only triggers evaluation and
//! exchanges bytes with it through RAM and device memory.  Likewise the
//! screen's pixel-buffer emulation lives behind [`screen::ScreenDevice`];
//! only its entry vector and its slot on the bus are known here.
#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bus;
pub mod controller;
pub mod screen;

pub use bus::DeviceBus;
pub use controller::Key;

/// Size of a device in port memory
pub const DEV_SIZE: usize = 16;

/// Size of machine memory
pub const RAM_SIZE: usize = 65536;

/// Address at which program images are loaded and first evaluated
pub const RESET_VECTOR: u16 = 0x100;

/// Maximum loadable image size
///
/// Everything between [`RESET_VECTOR`] and the top of RAM; larger images
/// are truncated, never rejected.
pub const IMAGE_CAPACITY: usize = RAM_SIZE - RESET_VECTOR as usize;

/// The machine state container
///
/// Owns RAM and the device register file, addressed as 16 devices of
/// [`DEV_SIZE`] ports each.  The bytes below [`RESET_VECTOR`] are reserved
/// bootstrap space and are never written by the image loader.
pub struct Machine<'a> {
    /// Device memory
    dev: [u8; 256],
    /// 64 KiB of machine memory
    ram: &'a mut [u8; RAM_SIZE],
}

impl<'a> Machine<'a> {
    /// Builds a new `Machine`, loading the image at [`RESET_VECTOR`]
    ///
    /// Images larger than [`IMAGE_CAPACITY`] are silently truncated.
    pub fn new<'b>(image: &'b [u8], ram: &'a mut [u8; RAM_SIZE]) -> Self {
        let n = image.len().min(IMAGE_CAPACITY);
        if n < image.len() {
            log::debug!("truncated {}-byte image to {n} bytes", image.len());
        }
        let out = Self {
            dev: [0u8; 256],
            ram,
        };
        out.ram[usize::from(RESET_VECTOR)..][..n]
            .copy_from_slice(&image[..n]);
        out
    }

    #[inline]
    fn check_dev_size<D: Ports>() {
        struct AssertDevSize<D>(D);
        impl<D> AssertDevSize<D> {
            const ASSERT: () = if core::mem::size_of::<D>() != DEV_SIZE {
                panic!("dev must be 16 bytes");
            };
        }
        AssertDevSize::<D>::ASSERT
    }

    /// Converts raw ports memory into a [`Ports`] object
    #[inline]
    pub fn dev<D: Ports>(&self) -> &D {
        self.dev_at(D::BASE)
    }

    /// Returns a reference to a device located at `pos`
    #[inline]
    pub fn dev_at<D: Ports>(&self, pos: u8) -> &D {
        Self::check_dev_size::<D>();
        D::ref_from(&self.dev[pos as usize..][..DEV_SIZE]).unwrap()
    }

    /// Returns a mutable reference to a device located at `pos`
    #[inline]
    pub fn dev_mut_at<D: Ports>(&mut self, pos: u8) -> &mut D {
        Self::check_dev_size::<D>();
        D::mut_from(&mut self.dev[pos as usize..][..DEV_SIZE]).unwrap()
    }

    /// Returns a mutable reference to the given [`Ports`] object
    #[inline]
    pub fn dev_mut<D: Ports>(&mut self) -> &mut D {
        self.dev_mut_at(D::BASE)
    }

    /// Reads the raw byte at the given address in device memory
    #[inline]
    pub fn read_dev_mem(&self, addr: u8) -> u8 {
        self.dev[usize::from(addr)]
    }

    /// Writes to the given address in device memory
    #[inline]
    pub fn write_dev_mem(&mut self, addr: u8, value: u8) {
        self.dev[usize::from(addr)] = value;
    }

    /// Shared borrow of the entire RAM array
    #[inline]
    pub fn ram(&self) -> &[u8; RAM_SIZE] {
        self.ram
    }

    /// Mutably borrows the entire RAM array
    #[inline]
    pub fn ram_mut(&mut self) -> &mut [u8; RAM_SIZE] {
        self.ram
    }

    /// Reads a byte from RAM
    #[inline]
    pub fn ram_read_byte(&self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    /// Writes a byte to RAM
    #[inline]
    pub fn ram_write_byte(&mut self, addr: u16, v: u8) {
        self.ram[addr as usize] = v;
    }
}

/// Interface to the external CPU evaluator
///
/// The evaluator owns its execution state (stacks, program counter) and is
/// opaque to this crate; the machine only triggers evaluation and exchanges
/// bytes with it through RAM and device memory.
pub trait Cpu {
    /// Runs the evaluator from `vector` until it halts
    ///
    /// Port accesses must go through [`Device::read_port`] and
    /// [`Device::write_port`] so that peripheral handlers observe them.
    /// Evaluation is assumed to terminate; this layer does not preempt it.
    fn evaluate(&mut self, mach: &mut Machine, dev: &mut dyn Device, vector: u16);
}

/// Trait for the peripherals attached to a machine
pub trait Device {
    /// Performs the `DEI` operation for the given target
    ///
    /// The output byte (if any) must be written to device memory at
    /// `target`, where [`Device::read_port`] picks it up.
    fn dei(&mut self, mach: &mut Machine, target: u8);

    /// Performs the `DEO` operation on the given target
    ///
    /// The input byte is already stored in device memory at `target` when
    /// this function is called.
    fn deo(&mut self, mach: &mut Machine, target: u8);

    /// Full port-read sequence: dispatch, then return the stored byte
    ///
    /// Devices without a handler return the raw register unchanged.
    fn read_port(&mut self, mach: &mut Machine, target: u8) -> u8 {
        self.dei(mach, target);
        mach.read_dev_mem(target)
    }

    /// Full port-write sequence: store, then dispatch
    ///
    /// The store happens first; handlers must observe the already-updated
    /// register window.
    fn write_port(&mut self, mach: &mut Machine, target: u8, value: u8) {
        mach.write_dev_mem(target, value);
        self.deo(mach, target);
    }
}

/// Trait for a type which can be cast to a device ports `struct`
pub trait Ports:
    zerocopy::AsBytes + zerocopy::FromBytes + zerocopy::FromZeroes
{
    /// Base address of the port, of the form `0xA0`
    const BASE: u8;
}

/// Device which does nothing
pub struct EmptyDevice;
impl Device for EmptyDevice {
    fn dei(&mut self, _mach: &mut Machine, _target: u8) {
        // nothing to do here
    }
    fn deo(&mut self, _mach: &mut Machine, _target: u8) {
        // nothing to do here
    }
}

#[cfg(feature = "alloc")]
mod ram {
    extern crate alloc;
    use alloc::boxed::Box;

    use crate::RAM_SIZE;

    /// Helper type for building a RAM array of the appropriate size
    ///
    /// This is only available if the `"alloc"` feature is enabled
    pub struct MachineRam(Box<[u8; RAM_SIZE]>);

    impl MachineRam {
        /// Builds a new zero-initialized RAM
        pub fn new() -> Self {
            MachineRam(Box::new([0u8; RAM_SIZE]))
        }
    }

    impl Default for MachineRam {
        fn default() -> Self {
            Self::new()
        }
    }

    impl core::ops::Deref for MachineRam {
        type Target = [u8; RAM_SIZE];
        fn deref(&self) -> &Self::Target {
            &self.0
        }
    }
    impl core::ops::DerefMut for MachineRam {
        fn deref_mut(&mut self) -> &mut Self::Target {
            &mut self.0
        }
    }
}

#[cfg(feature = "alloc")]
pub use ram::MachineRam;

#[cfg(all(feature = "alloc", test))]
mod test {
    use super::*;
    use crate::screen::ScreenPorts;

    #[test]
    fn image_loads_at_reset_vector() {
        let mut ram = MachineRam::new();
        let mach = Machine::new(&[0xAA, 0xBB], &mut ram);
        assert_eq!(mach.ram_read_byte(RESET_VECTOR), 0xAA);
        assert_eq!(mach.ram_read_byte(RESET_VECTOR + 1), 0xBB);
    }

    #[test]
    fn oversized_image_is_truncated() {
        let image = vec![0xCD; RAM_SIZE + 17];
        let mut ram = MachineRam::new();
        let mach = Machine::new(&image, &mut ram);
        assert_eq!(mach.ram_read_byte(u16::MAX), 0xCD);
        // The reserved bootstrap page is never touched by the loader
        assert!(mach.ram()[..usize::from(RESET_VECTOR)]
            .iter()
            .all(|&b| b == 0));
    }

    #[test]
    fn device_memory_starts_zeroed() {
        let mut ram = MachineRam::new();
        let mach = Machine::new(&[], &mut ram);
        assert!((0..=u8::MAX).all(|a| mach.read_dev_mem(a) == 0));
    }

    #[test]
    fn empty_device_is_pure_passthrough() {
        let mut ram = MachineRam::new();
        let mut mach = Machine::new(&[], &mut ram);
        let mut dev = EmptyDevice;
        dev.write_port(&mut mach, 0x3C, 0x55);
        assert_eq!(mach.read_dev_mem(0x3C), 0x55);
        assert_eq!(dev.read_port(&mut mach, 0x3C), 0x55);
    }

    #[test]
    fn vectors_are_big_endian() {
        let mut ram = MachineRam::new();
        let mut mach = Machine::new(&[], &mut ram);
        mach.write_dev_mem(0x20, 0x12);
        mach.write_dev_mem(0x21, 0x34);
        assert_eq!(mach.dev::<ScreenPorts>().vector(), 0x1234);
        assert_eq!(mach.dev::<controller::ControllerPorts>().vector(), 0x0000);
    }
}
