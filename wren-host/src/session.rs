use crate::{
    draw_frame, DisplaySurface, Event, Host, InputKind, Timer, FRAME_RATE_HZ,
};
use crossbeam_channel::Receiver;
use log::{info, warn};
use machine::{
    controller,
    screen::{ScreenDevice, ScreenPorts},
    Cpu, DeviceBus, Key, Machine, MachineRam, RESET_VECTOR,
};
use std::time::Instant;

/// The key whose long-press ends the session
pub const EXIT_KEY: Key = Key::Secondary;

/// Why [`run_session`] returned
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The user ended a running session
    Exited,
    /// No image was selected; the run phase was skipped
    NoImage,
    /// The selected image could not be read; the run phase was skipped
    LoadFailed,
}

/// A loaded machine together with its peripherals and scheduler state
///
/// The session is the sole owner of everything the evaluator touches, so
/// events are applied strictly one at a time in arrival order.
pub struct Session<'a, C, S> {
    machine: Machine<'a>,
    cpu: C,
    bus: DeviceBus<S>,

    /// Single-slot redraw mailbox, so ticks that outpace rendering coalesce
    redraw: bool,
    running: bool,
}

impl<'a, C: Cpu, S: ScreenDevice> Session<'a, C, S> {
    /// Builds a session around a loaded machine
    pub fn new(machine: Machine<'a>, cpu: C, bus: DeviceBus<S>) -> Self {
        Self {
            machine,
            cpu,
            bus,
            redraw: false,
            running: true,
        }
    }

    /// Borrows the machine state
    pub fn machine(&self) -> &Machine<'a> {
        &self.machine
    }

    /// Mutably borrows the machine state
    pub fn machine_mut(&mut self) -> &mut Machine<'a> {
        &mut self.machine
    }

    /// Borrows the device bus
    pub fn bus(&self) -> &DeviceBus<S> {
        &self.bus
    }

    /// Whether a redraw is pending
    pub fn redraw_pending(&self) -> bool {
        self.redraw
    }

    /// Whether the session is still active
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Runs the evaluator to completion from `vector`
    pub fn evaluate(&mut self, vector: u16) {
        self.cpu.evaluate(&mut self.machine, &mut self.bus, vector);
    }

    /// Applies a single event
    ///
    /// A press or release updates the button bitmask and runs the
    /// controller vector exactly once, even when the mask is unchanged; a
    /// tick runs the screen vector and arms the redraw mailbox.  A
    /// long-press of [`EXIT_KEY`] flips the session to terminating and
    /// triggers no evaluation.
    pub fn handle(&mut self, e: Event) {
        match e {
            Event::Input { key, kind } => match kind {
                InputKind::Press => {
                    let v = controller::press(&mut self.machine, key);
                    self.evaluate(v);
                }
                InputKind::Release => {
                    let v = controller::release(&mut self.machine, key);
                    self.evaluate(v);
                }
                InputKind::LongPress => {
                    if key == EXIT_KEY {
                        self.running = false;
                    }
                }
            },
            Event::Tick => {
                let v = self.machine.dev::<ScreenPorts>().vector();
                self.evaluate(v);
                self.redraw = true;
            }
        }
    }

    /// Consumes events until the session ends or every producer hangs up
    ///
    /// Queued events are drained before each redraw, so a burst of ticks
    /// costs one frame and the surface never shows anything older than the
    /// newest tick.  Termination is checked before rendering; a long-press
    /// exits without drawing a final frame.
    pub fn run<D: DisplaySurface>(
        &mut self,
        rx: &Receiver<Event>,
        surface: &mut D,
    ) {
        while self.running {
            let Ok(e) = rx.recv() else { break };
            self.handle(e);
            while self.running {
                match rx.try_recv() {
                    Ok(e) => self.handle(e),
                    Err(_) => break,
                }
            }
            if !self.running {
                break;
            }
            if self.redraw {
                draw_frame(self.bus.screen(), surface);
                self.redraw = false;
            }
        }
    }
}

/// Runs one full session against the host's services
///
/// Load failures skip the run phase entirely: the session tears down
/// cleanly with nothing evaluated.  Once running, only a long-press of
/// [`EXIT_KEY`] ends the session.  Both producers are stopped and
/// unregistered before the machine state is dropped.
pub fn run_session<H, C, S>(host: &mut H, cpu: C, screen: S) -> Outcome
where
    H: Host,
    C: Cpu,
    S: ScreenDevice,
{
    host.set_backlight(true);
    let out = load_and_run(host, cpu, screen);
    host.set_backlight(false);
    out
}

fn load_and_run<H, C, S>(host: &mut H, cpu: C, mut screen: S) -> Outcome
where
    H: Host,
    C: Cpu,
    S: ScreenDevice,
{
    let Some(path) = host.pick_image() else {
        info!("no image selected");
        return Outcome::NoImage;
    };
    let image = match host.read_image(&path) {
        Ok(image) => image,
        Err(e) => {
            warn!("failed to read {path:?}: {e:#}");
            return Outcome::LoadFailed;
        }
    };
    info!("loaded {}-byte image from {path:?}", image.len());

    let mut ram = MachineRam::new();
    let (width, height) = host.surface().size();
    screen.resize(width, height);
    let mut session = Session::new(
        Machine::new(&image, &mut ram),
        cpu,
        DeviceBus::new(screen),
    );

    let start = Instant::now();
    session.evaluate(RESET_VECTOR);
    info!("reset vector finished in {:?}", start.elapsed());

    let (tx, rx) = crossbeam_channel::unbounded();
    host.subscribe_input(tx.clone());
    let timer = Timer::spawn(FRAME_RATE_HZ, tx);

    session.run(&rx, host.surface());

    // Producers go down before the machine state they feed
    timer.stop();
    host.unsubscribe_input();

    Outcome::Exited
}
