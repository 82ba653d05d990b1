use crate::{
    controller::ControllerPorts,
    screen::{ScreenDevice, ScreenPorts},
    Device, Machine, Ports,
};
use log::debug;

/// Capability attached to one of the 16 device slots
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Handler {
    /// Raw register storage, no side effects
    Passthrough,
    Screen,
    Controller,
}

/// Routes device-port accesses to peripheral handlers
///
/// Each device slot maps to a handler; slots without one fall back to the
/// passthrough policy, so unimplemented devices behave as inert storage
/// rather than errors.
pub struct DeviceBus<S> {
    slots: [Handler; 16],
    screen: S,

    /// Passthrough devices that have already been logged
    logged: [bool; 16],
}

impl<S: ScreenDevice> DeviceBus<S> {
    /// Builds a bus with the screen and controller slots populated
    pub fn new(screen: S) -> Self {
        let mut slots = [Handler::Passthrough; 16];
        slots[usize::from(ScreenPorts::BASE >> 4)] = Handler::Screen;
        slots[usize::from(ControllerPorts::BASE >> 4)] = Handler::Controller;
        Self {
            slots,
            screen,
            logged: [false; 16],
        }
    }

    /// Borrows the screen emulation
    pub fn screen(&self) -> &S {
        &self.screen
    }

    /// Mutably borrows the screen emulation
    pub fn screen_mut(&mut self) -> &mut S {
        &mut self.screen
    }

    fn log_passthrough(&mut self, target: u8) {
        let dev = usize::from(target >> 4);
        if !self.logged[dev] {
            debug!("passthrough write to device {dev:#x}");
            self.logged[dev] = true;
        }
    }
}

impl<S: ScreenDevice> Device for DeviceBus<S> {
    fn dei(&mut self, mach: &mut Machine, target: u8) {
        match self.slots[usize::from(target >> 4)] {
            Handler::Screen => self.screen.dei(mach, target),
            // The stored register byte is the result
            Handler::Controller | Handler::Passthrough => (),
        }
    }

    fn deo(&mut self, mach: &mut Machine, target: u8) {
        match self.slots[usize::from(target >> 4)] {
            Handler::Screen => self.screen.deo(mach, target),
            Handler::Controller => (),
            Handler::Passthrough => self.log_passthrough(target),
        }
    }
}

#[cfg(all(feature = "alloc", test))]
mod test {
    use super::*;
    use crate::screen::Layers;
    use crate::MachineRam;

    /// Screen stand-in that records what it saw at dispatch time
    #[derive(Default)]
    struct SpyScreen {
        deo_log: Vec<(u8, u8)>,
        dei_value: Option<u8>,
    }

    impl ScreenDevice for SpyScreen {
        fn dei(&mut self, mach: &mut Machine, target: u8) {
            if let Some(v) = self.dei_value {
                mach.write_dev_mem(target, v);
            }
        }
        fn deo(&mut self, mach: &mut Machine, target: u8) {
            // Record the register byte visible during dispatch
            self.deo_log.push((target, mach.read_dev_mem(target)));
        }
        fn resize(&mut self, _width: u16, _height: u16) {}
        fn layers(&self) -> Layers<'_> {
            Layers {
                fg: &[],
                bg: &[],
                width: 0,
                height: 0,
            }
        }
    }

    #[test]
    fn unhandled_devices_pass_through() {
        let mut ram = MachineRam::new();
        let mut mach = Machine::new(&[], &mut ram);
        let mut bus = DeviceBus::new(SpyScreen::default());
        bus.write_port(&mut mach, 0x5A, 0x77);
        assert_eq!(bus.read_port(&mut mach, 0x5A), 0x77);
        assert!(bus.screen().deo_log.is_empty());
    }

    #[test]
    fn controller_slot_is_inert_storage() {
        let mut ram = MachineRam::new();
        let mut mach = Machine::new(&[], &mut ram);
        let mut bus = DeviceBus::new(SpyScreen::default());
        bus.write_port(&mut mach, ControllerPorts::BUTTON, 0x10);
        assert_eq!(mach.read_dev_mem(ControllerPorts::BUTTON), 0x10);
        assert_eq!(bus.read_port(&mut mach, ControllerPorts::BUTTON), 0x10);
        assert!(bus.screen().deo_log.is_empty());
    }

    #[test]
    fn screen_writes_store_then_dispatch() {
        let mut ram = MachineRam::new();
        let mut mach = Machine::new(&[], &mut ram);
        let mut bus = DeviceBus::new(SpyScreen::default());
        bus.write_port(&mut mach, 0x2E, 0x99);
        // The handler saw the post-write register state
        assert_eq!(bus.screen().deo_log, vec![(0x2E, 0x99)]);
    }

    #[test]
    fn screen_reads_delegate_to_the_handler() {
        let mut ram = MachineRam::new();
        let mut mach = Machine::new(&[], &mut ram);
        let mut bus = DeviceBus::new(SpyScreen {
            dei_value: Some(0x42),
            ..SpyScreen::default()
        });
        assert_eq!(bus.read_port(&mut mach, 0x23), 0x42);
    }
}
