use crate::DisplaySurface;
use machine::screen::ScreenDevice;

/// Copies the screen's pixel planes to the host surface and commits
///
/// A pixel is lit when bit 0 of its foreground byte is set, falling back to
/// the background byte when the foreground byte is exactly zero.  The zero
/// fallback is the screen device's documented priority rule; its semantics
/// must not change even if the representation does.
pub fn draw_frame<S, D>(screen: &S, surface: &mut D)
where
    S: ScreenDevice,
    D: DisplaySurface,
{
    let layers = screen.layers();
    let width = usize::from(layers.width);
    if width == 0 {
        return;
    }
    surface.clear();
    for (i, (&fg, &bg)) in layers.fg.iter().zip(layers.bg).enumerate() {
        let p = if fg != 0 { fg } else { bg };
        if p & 1 != 0 {
            surface.draw_pixel((i % width) as u16, (i / width) as u16);
        }
    }
    surface.commit();
}

#[cfg(test)]
mod test {
    use super::*;
    use machine::screen::Layers;
    use machine::Machine;

    struct PlaneScreen {
        fg: Vec<u8>,
        bg: Vec<u8>,
        width: u16,
        height: u16,
    }

    impl ScreenDevice for PlaneScreen {
        fn dei(&mut self, _mach: &mut Machine, _target: u8) {}
        fn deo(&mut self, _mach: &mut Machine, _target: u8) {}
        fn resize(&mut self, width: u16, height: u16) {
            self.width = width;
            self.height = height;
            self.fg = vec![0; usize::from(width) * usize::from(height)];
            self.bg = self.fg.clone();
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
    struct RecordingSurface {
        pixels: Vec<(u16, u16)>,
        clears: usize,
        commits: usize,
    }

    impl DisplaySurface for RecordingSurface {
        fn size(&self) -> (u16, u16) {
            (4, 2)
        }
        fn clear(&mut self) {
            self.clears += 1;
            self.pixels.clear();
        }
        fn draw_pixel(&mut self, x: u16, y: u16) {
            self.pixels.push((x, y));
        }
        fn commit(&mut self) {
            self.commits += 1;
        }
    }

    #[test]
    fn foreground_wins_unless_zero() {
        let mut screen = PlaneScreen {
            fg: vec![],
            bg: vec![],
            width: 0,
            height: 0,
        };
        screen.resize(4, 2);
        screen.fg[0] = 0x00; // falls back to bg, which is lit
        screen.bg[0] = 0x01;
        screen.fg[1] = 0x02; // fg nonzero, bit 0 clear: off
        screen.bg[1] = 0x01;
        screen.fg[2] = 0x00; // both zero: off
        screen.bg[2] = 0x00;
        screen.fg[5] = 0x03; // fg lit, second row

        let mut surface = RecordingSurface::default();
        draw_frame(&screen, &mut surface);
        assert_eq!(surface.pixels, vec![(0, 0), (1, 1)]);
        assert_eq!(surface.clears, 1);
        assert_eq!(surface.commits, 1);
    }

    #[test]
    fn unsized_screen_draws_nothing() {
        let screen = PlaneScreen {
            fg: vec![],
            bg: vec![],
            width: 0,
            height: 0,
        };
        let mut surface = RecordingSurface::default();
        draw_frame(&screen, &mut surface);
        assert_eq!(surface.commits, 0);
    }
}
