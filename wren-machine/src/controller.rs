//! Controller device: entry vector and button bitmask
use crate::{Machine, Ports};
use core::mem::offset_of;
use zerocopy::{AsBytes, BigEndian, FromBytes, FromZeroes, U16};

/// Ports for the controller device
#[derive(AsBytes, FromZeroes, FromBytes)]
#[repr(C)]
pub struct ControllerPorts {
    vector: U16<BigEndian>,
    button: u8,
    _pad: [u8; 13],
}

static_assertions::assert_eq_size!(ControllerPorts, [u8; 16]);

impl Ports for ControllerPorts {
    const BASE: u8 = 0x80;
}

impl ControllerPorts {
    /// Device-memory address of the button bitmask
    pub const BUTTON: u8 = Self::BASE | offset_of!(Self, button) as u8;

    /// Entry vector for controller events
    pub fn vector(&self) -> u16 {
        self.vector.get()
    }

    /// Current button bitmask
    pub fn button(&self) -> u8 {
        self.button
    }
}

/// A physical control on the host
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Key {
    Primary,
    Secondary,
    Up,
    Down,
    Left,
    Right,
    /// Any key with no controller mapping
    Other,
}

impl Key {
    /// Returns this key's bit in the button bitmask
    ///
    /// Unmapped keys contribute an empty mask.
    pub fn bit(&self) -> u8 {
        match self {
            Key::Primary => 0x01,
            Key::Secondary => 0x02,
            Key::Up => 0x10,
            Key::Down => 0x20,
            Key::Left => 0x40,
            Key::Right => 0x80,
            Key::Other => 0x00,
        }
    }
}

/// Marks `k` as held and returns the controller vector
///
/// Pressing an already-held key leaves the bitmask unchanged; the caller
/// still runs the vector once per event.
pub fn press(mach: &mut Machine, k: Key) -> u16 {
    let p = mach.dev_mut::<ControllerPorts>();
    p.button |= k.bit();
    p.vector.get()
}

/// Marks `k` as released and returns the controller vector
pub fn release(mach: &mut Machine, k: Key) -> u16 {
    let p = mach.dev_mut::<ControllerPorts>();
    p.button &= !k.bit();
    p.vector.get()
}

#[cfg(all(feature = "alloc", test))]
mod test {
    use super::*;
    use crate::{Machine, MachineRam};

    #[test]
    fn bitmask_tracks_held_keys() {
        let mut ram = MachineRam::new();
        let mut mach = Machine::new(&[], &mut ram);
        press(&mut mach, Key::Up);
        press(&mut mach, Key::Primary);
        assert_eq!(mach.dev::<ControllerPorts>().button(), 0x11);

        // Repeated press is a no-op on the mask
        press(&mut mach, Key::Up);
        assert_eq!(mach.dev::<ControllerPorts>().button(), 0x11);

        release(&mut mach, Key::Up);
        assert_eq!(mach.dev::<ControllerPorts>().button(), 0x01);
        release(&mut mach, Key::Up);
        assert_eq!(mach.dev::<ControllerPorts>().button(), 0x01);
    }

    #[test]
    fn unmapped_keys_leave_the_mask_alone() {
        let mut ram = MachineRam::new();
        let mut mach = Machine::new(&[], &mut ram);
        press(&mut mach, Key::Down);
        press(&mut mach, Key::Other);
        assert_eq!(mach.dev::<ControllerPorts>().button(), 0x20);
        release(&mut mach, Key::Other);
        assert_eq!(mach.dev::<ControllerPorts>().button(), 0x20);
    }

    #[test]
    fn press_returns_the_controller_vector() {
        let mut ram = MachineRam::new();
        let mut mach = Machine::new(&[], &mut ram);
        mach.write_dev_mem(0x80, 0xBE);
        mach.write_dev_mem(0x81, 0xEF);
        assert_eq!(press(&mut mach, Key::Left), 0xBEEF);
        assert_eq!(release(&mut mach, Key::Left), 0xBEEF);
    }

    #[test]
    fn button_address() {
        assert_eq!(ControllerPorts::BUTTON, 0x82);
    }
}
