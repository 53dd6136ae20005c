pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = mul_div255_u8(px[0] as u16, a);
        px[1] = mul_div255_u8(px[1] as u16, a);
        px[2] = mul_div255_u8(px[2] as u16, a);
    }
}

/// Opacity envelope that ramps `0 -> 1` over the first `edge` fraction of `t` and `1 -> 0` over
/// the last `edge` fraction.
pub(crate) fn fade_in_out(t: f64, edge: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if edge <= 0.0 {
        return 1.0;
    }
    if t < edge {
        t / edge
    } else if t > 1.0 - edge {
        (1.0 - t) / edge
    } else {
        1.0
    }
}

/// Normalized progress of `local` within a window of `len` frames.
///
/// The last frame of the window maps to exactly `1.0`.
pub(crate) fn window_progress(local: u64, len: u64) -> f64 {
    if len <= 1 {
        return 1.0;
    }
    (local.min(len - 1) as f64) / ((len - 1) as f64)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
