//! Demosaicing using replication (nearest neighbour) interpolation.
//!
//! ```text
//!   phase A            phase B
//!   B G B G            G R G R
//!   G R G R            B G B G
//! ```
//!
//! Blue and red samples are copied into the 2x2 block whose top-left
//! corner they occupy. Green samples are copied one column to the right.
//! Copies that would land outside the frame are dropped, and positions no
//! sample reaches stay 0.

use crate::demosaic::{chroma_rows, Planes};
use crate::BayerPhase;

#[allow(clippy::too_many_arguments)]
fn splat(plane: &mut [u16], w: usize, h: usize, x: usize, y: usize, nx: usize, ny: usize, v: u16) {
    for yy in y..(y + ny).min(h) {
        let row = &mut plane[yy * w..(yy + 1) * w];
        for e in &mut row[x..(x + nx).min(w)] {
            *e = v;
        }
    }
}

pub(crate) fn run(src: &[u16], w: usize, h: usize, phase: BayerPhase, planes: &mut Planes) {
    let (blue_y, red_y) = chroma_rows(phase);

    for y in (blue_y..h).step_by(2) {
        for x in (0..w).step_by(2) {
            splat(&mut planes.b, w, h, x, y, 2, 2, src[y * w + x]);
        }
        // Green shares blue rows at odd columns.
        for x in (1..w).step_by(2) {
            splat(&mut planes.g, w, h, x, y, 2, 1, src[y * w + x]);
        }
    }

    for y in (red_y..h).step_by(2) {
        for x in (1..w).step_by(2) {
            splat(&mut planes.r, w, h, x, y, 2, 2, src[y * w + x]);
        }
        for x in (0..w).step_by(2) {
            splat(&mut planes.g, w, h, x, y, 2, 1, src[y * w + x]);
        }
    }
}
