use chrono::NaiveDate;
use image::{ImageFormat, Rgb, RgbImage};

use crate::resolve::MenuEntry;

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 630;

const GRADIENT_TOP: Rgb<u8> = Rgb([255, 243, 224]);
const GRADIENT_BOTTOM: Rgb<u8> = Rgb([255, 224, 178]);
const ACCENT: Rgb<u8> = Rgb([230, 100, 30]);
const INK: Rgb<u8> = Rgb([120, 84, 56]);
const PANEL: Rgb<u8> = Rgb([255, 252, 245]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Link previews collapse beyond a handful of lines, so longer menus get
/// an ellipsis row instead of smaller bars.
const MAX_ITEM_BARS: usize = 8;

/// Renders the share-card for a day as PNG bytes.
///
/// The card is glyph-free apart from the stenciled ISO date: an open day
/// shows one bar per dish scaled to the dish name's length, a closed or
/// absent day shows a centered panel instead.
pub fn render_png(date: NaiveDate, entry: &MenuEntry) -> crate::Result<Vec<u8>> {
    let image = render(date, entry);
    let mut buf = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}

fn render(date: NaiveDate, entry: &MenuEntry) -> RgbImage {
    let mut image = RgbImage::from_fn(WIDTH, HEIGHT, |_, y| gradient(y));
    fill_rect(&mut image, 0, 0, WIDTH, 80, ACCENT);
    draw_date(&mut image, 40, 19, date);
    fill_rect(&mut image, 60, 185, WIDTH - 120, 4, ACCENT);
    match entry {
        MenuEntry::Items(items) => draw_item_bars(&mut image, items),
        MenuEntry::Closed => draw_panel(&mut image, true),
        MenuEntry::Absent => draw_panel(&mut image, false),
    }
    image
}

fn gradient(y: u32) -> Rgb<u8> {
    let mut px = [0u8; 3];
    for (channel, value) in px.iter_mut().enumerate() {
        let top = f32::from(GRADIENT_TOP.0[channel]);
        let bottom = f32::from(GRADIENT_BOTTOM.0[channel]);
        let t = y as f32 / (HEIGHT - 1) as f32;
        *value = (top + (bottom - top) * t) as u8;
    }
    Rgb(px)
}

fn draw_item_bars(image: &mut RgbImage, items: &[String]) {
    for (idx, item) in items.iter().take(MAX_ITEM_BARS).enumerate() {
        let y = 220 + idx as u32 * 46;
        fill_rect(image, 60, y + 4, 10, 10, ACCENT);
        let width = (80 + item.chars().count() as u32 * 34).min(700);
        fill_rect(image, 90, y, width, 18, INK);
    }
    if items.len() > MAX_ITEM_BARS {
        let y = 220 + MAX_ITEM_BARS as u32 * 46;
        for dot in 0..3u32 {
            fill_rect(image, 90 + dot * 24, y + 4, 10, 10, INK);
        }
    }
}

fn draw_panel(image: &mut RgbImage, closed: bool) {
    fill_rect(image, 300, 240, 600, 200, PANEL);
    fill_rect(image, 300, 240, 600, 4, ACCENT);
    fill_rect(image, 300, 436, 600, 4, ACCENT);
    fill_rect(image, 300, 240, 4, 200, ACCENT);
    fill_rect(image, 896, 240, 4, 200, ACCENT);
    if closed {
        fill_rect(image, 450, 330, 300, 20, ACCENT);
    }
}

fn fill_rect(image: &mut RgbImage, x: u32, y: u32, width: u32, height: u32, color: Rgb<u8>) {
    for py in y..(y + height).min(HEIGHT) {
        for px in x..(x + width).min(WIDTH) {
            image.put_pixel(px, py, color);
        }
    }
}

/// 5x7 stencils for the ten digits followed by the hyphen.
const GLYPHS: [[u8; 7]; 11] = [
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
    [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
];

const GLYPH_SCALE: u32 = 6;
const GLYPH_ADVANCE: u32 = 6 * GLYPH_SCALE;

fn draw_date(image: &mut RgbImage, x: u32, y: u32, date: NaiveDate) {
    let mut pen_x = x;
    for c in date.to_string().chars() {
        let glyph = match c {
            '0'..='9' => &GLYPHS[c as usize - '0' as usize],
            '-' => &GLYPHS[10],
            _ => continue,
        };
        draw_glyph(image, pen_x, y, glyph);
        pen_x += GLYPH_ADVANCE + GLYPH_SCALE;
    }
}

fn draw_glyph(image: &mut RgbImage, x: u32, y: u32, glyph: &[u8; 7]) {
    for (row, bits) in glyph.iter().enumerate() {
        for col in 0..5u32 {
            if bits >> (4 - col) & 1 == 1 {
                fill_rect(
                    image,
                    x + col * GLYPH_SCALE,
                    y + row as u32 * GLYPH_SCALE,
                    GLYPH_SCALE,
                    GLYPH_SCALE,
                    WHITE,
                );
            }
        }
    }
}
