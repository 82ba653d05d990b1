//! Full-lifecycle tests with fake host services
use crossbeam_channel::Sender;
use machine::screen::{Layers, ScreenDevice};
use machine::{Cpu, Device, Key, Machine, RESET_VECTOR};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use wren_host::{
    run_session, DisplaySurface, Event, Host, InputKind, Outcome, EXIT_KEY,
};

/// Evaluator stand-in: records vectors, and on the reset vector programs
/// the controller vector through the device bus
struct ScriptCpu {
    log: Rc<RefCell<Vec<u16>>>,
}

impl Cpu for ScriptCpu {
    fn evaluate(
        &mut self,
        mach: &mut Machine,
        dev: &mut dyn Device,
        vector: u16,
    ) {
        self.log.borrow_mut().push(vector);
        if vector == RESET_VECTOR {
            dev.write_port(mach, 0x80, 0x12);
            dev.write_port(mach, 0x81, 0x34);
        }
    }
}

#[derive(Default)]
struct FakeScreen {
    fg: Vec<u8>,
    bg: Vec<u8>,
    width: u16,
    height: u16,
    resized: Rc<RefCell<Option<(u16, u16)>>>,
}

impl ScreenDevice for FakeScreen {
    fn dei(&mut self, _mach: &mut Machine, _target: u8) {}
    fn deo(&mut self, _mach: &mut Machine, _target: u8) {}
    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let n = usize::from(width) * usize::from(height);
        self.fg = vec![0; n];
        self.bg = vec![0; n];
        *self.resized.borrow_mut() = Some((width, height));
    }
    fn layers(&self) -> Layers<'_> {
        Layers {
            fg: &self.fg,
            bg: &self.bg,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Default)]
struct FakeSurface {
    commits: usize,
}

impl DisplaySurface for FakeSurface {
    fn size(&self) -> (u16, u16) {
        (128, 64)
    }
    fn clear(&mut self) {}
    fn draw_pixel(&mut self, _x: u16, _y: u16) {}
    fn commit(&mut self) {
        self.commits += 1;
    }
}

/// Host whose input service replays a fixed script at subscription time
struct FakeHost {
    surface: FakeSurface,
    picked: Option<PathBuf>,
    image: Option<Vec<u8>>,
    script: Vec<Event>,
    tx: Option<Sender<Event>>,
    unsubscribed: bool,
    backlight: Vec<bool>,
}

impl FakeHost {
    fn new(image: Option<Vec<u8>>) -> Self {
        Self {
            surface: FakeSurface::default(),
            picked: Some(PathBuf::from("any/image.rom")),
            image,
            script: vec![],
            tx: None,
            unsubscribed: false,
            backlight: vec![],
        }
    }
}

impl Host for FakeHost {
    type Surface = FakeSurface;

    fn pick_image(&mut self) -> Option<PathBuf> {
        self.picked.clone()
    }

    fn read_image(&mut self, _path: &Path) -> anyhow::Result<Vec<u8>> {
        match &self.image {
            Some(image) => Ok(image.clone()),
            None => anyhow::bail!("storage error"),
        }
    }

    fn surface(&mut self) -> &mut FakeSurface {
        &mut self.surface
    }

    fn subscribe_input(&mut self, tx: Sender<Event>) {
        for e in self.script.drain(..) {
            tx.send(e).unwrap();
        }
        self.tx = Some(tx);
    }

    fn unsubscribe_input(&mut self) {
        self.tx = None;
        self.unsubscribed = true;
    }

    fn set_backlight(&mut self, on: bool) {
        self.backlight.push(on);
    }
}

fn script_cpu() -> (ScriptCpu, Rc<RefCell<Vec<u16>>>) {
    let log = Rc::new(RefCell::new(vec![]));
    let cpu = ScriptCpu {
        log: Rc::clone(&log),
    };
    (cpu, log)
}

#[test]
fn no_image_skips_the_run_phase() {
    let (cpu, log) = script_cpu();
    let mut host = FakeHost::new(None);
    host.picked = None;
    let out = run_session(&mut host, cpu, FakeScreen::default());
    assert_eq!(out, Outcome::NoImage);
    assert!(log.borrow().is_empty());
    assert!(!host.unsubscribed);
    assert_eq!(host.backlight, vec![true, false]);
}

#[test]
fn read_failure_skips_the_run_phase() {
    let (cpu, log) = script_cpu();
    let mut host = FakeHost::new(None);
    let out = run_session(&mut host, cpu, FakeScreen::default());
    assert_eq!(out, Outcome::LoadFailed);
    assert!(log.borrow().is_empty());
    assert!(!host.unsubscribed);
    assert_eq!(host.backlight, vec![true, false]);
}

#[test]
fn single_byte_image_runs_and_exits_on_long_press() {
    let (cpu, log) = script_cpu();
    let mut host = FakeHost::new(Some(vec![0x00]));
    host.script = vec![
        Event::Input {
            key: Key::Up,
            kind: InputKind::Press,
        },
        Event::Input {
            key: Key::Up,
            kind: InputKind::Release,
        },
        Event::Input {
            key: EXIT_KEY,
            kind: InputKind::LongPress,
        },
    ];

    let screen = FakeScreen::default();
    let resized = Rc::clone(&screen.resized);
    let out = run_session(&mut host, cpu, screen);
    assert_eq!(out, Outcome::Exited);

    // The screen was sized from the surface before the first evaluation
    assert_eq!(*resized.borrow(), Some((128, 64)));

    // First the reset vector, then one controller evaluation per key
    // event, at the vector the image programmed through the bus; real
    // timer ticks may interleave at the (zero) screen vector
    let log = log.borrow();
    assert_eq!(log[0], RESET_VECTOR);
    assert_eq!(log.iter().filter(|&&v| v == 0x1234).count(), 2);
    assert!(log[1..].iter().all(|&v| v == 0x1234 || v == 0x0000));

    // Producers were unregistered during teardown
    assert!(host.unsubscribed);
    assert_eq!(host.backlight, vec![true, false]);
}
