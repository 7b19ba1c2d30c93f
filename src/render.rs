use ember8::frame::{HEIGHT, WIDTH};
use ember8::FrameView;

/// Frame as text, `#` for lit pixels, `.` for dark ones, one line per row
pub fn render(frame: FrameView<'_>) -> String {
    let mut out = String::with_capacity((WIDTH + 1) * HEIGHT);
    for (n, px) in frame.iter_pixels().enumerate() {
        out.push(if px { '#' } else { '.' });
        if (n + 1) % WIDTH == 0 {
            out.push('\n');
        }
    }
    out
}
