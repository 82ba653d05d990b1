use crate::Event;
use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};

/// A 1-bit display surface provided by the host
pub trait DisplaySurface {
    /// Surface resolution in pixels
    fn size(&self) -> (u16, u16);

    /// Clears the surface to all-off
    fn clear(&mut self);

    /// Turns on the pixel at `(x, y)`
    fn draw_pixel(&mut self, x: u16, y: u16);

    /// Presents the drawn frame
    fn commit(&mut self);
}

/// Services borrowed from the host for the duration of a session
pub trait Host {
    /// The host's display surface
    type Surface: DisplaySurface;

    /// Asks the user for a program image, or `None` if they backed out
    fn pick_image(&mut self) -> Option<PathBuf>;

    /// Reads a program image from host storage
    fn read_image(&mut self, path: &Path) -> anyhow::Result<Vec<u8>>;

    /// Borrows the display surface
    fn surface(&mut self) -> &mut Self::Surface;

    /// Starts delivering input events to `tx`
    fn subscribe_input(&mut self, tx: Sender<Event>);

    /// Stops delivering input events
    ///
    /// No event may be delivered once this returns; the session tears its
    /// machine state down immediately afterwards.
    fn unsubscribe_input(&mut self);

    /// Forces the display backlight on, or releases it (cosmetic)
    fn set_backlight(&mut self, on: bool);
}
